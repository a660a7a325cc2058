use serde::Serialize;

/// A single recognized word as delivered by the upstream recognizer:
/// its raw text, an optional per-character confidence slice aligned to the
/// word's characters, and its position within the line.
#[derive(Debug, Clone)]
pub struct OcrWord {
    pub text: String,
    pub confidences: Option<Vec<f64>>,
    pub index: usize,
}

/// Which channel produced a correction candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Provenance {
    /// The word itself was found in the dictionary.
    DictionaryHit,
    /// A confusion-table substitution turned the word into a dictionary word.
    ConfusionVariant,
    /// Approximate lexical search over the dictionary.
    FuzzyMatch,
}

/// A proposed replacement for an OCR word, before context scoring.
/// Candidates live only for the duration of one correction call.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub text: String,
    /// Lexical score in [0, 100], prior to any context contribution.
    pub score: f64,
    pub provenance: Provenance,
}

/// One accepted correction, as recorded in the correction log.
#[derive(Debug, Clone, Serialize)]
pub struct Correction {
    pub original: String,
    pub corrected: String,
    pub base_score: f64,
    pub context_score: f64,
    pub combined_score: f64,
    pub provenance: Provenance,
    /// Mean per-character confidence of the original word, when available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub word_confidence: Option<f64>,
}

/// Tunable knobs of the correction engine.
///
/// The defaults are the values the engine was calibrated with; they are
/// plain data, not derived truths.
#[derive(Debug, Clone)]
pub struct CorrectorConfig {
    /// Words shorter than this are never touched, and shorter corpus tokens
    /// are never indexed.
    pub min_word_length: usize,
    /// Minimum lexical score in [0, 100] for a candidate to survive, and the
    /// default acceptance threshold for a correction.
    pub confusion_threshold: f64,
    /// Characters below this recognizer confidence are treated as suspect.
    pub confidence_threshold: f64,
    /// Weight of the context score in the final combination, in [0, 1].
    pub context_weight: f64,
    /// Maximum number of candidates returned per word.
    pub max_candidates: usize,
    /// Cap on generated confusion variants per word.
    pub max_variants: usize,
}

impl Default for CorrectorConfig {
    fn default() -> Self {
        Self {
            min_word_length: 2,
            confusion_threshold: 65.0,
            confidence_threshold: 0.8,
            context_weight: 0.2,
            max_candidates: 10,
            max_variants: 20,
        }
    }
}
