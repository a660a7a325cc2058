//! Per-word correction decisions and the line/text entry points.

use tracing::{debug, warn};

use crate::core::candidates::CandidateGenerator;
use crate::core::confusion::ConfusionModel;
use crate::core::context::{ContextModel, ContextScorer};
use crate::core::dictionary::Dictionary;
use crate::core::hypothesis::{HypothesisSelector, SelectorWeights};
use crate::core::types::{Correction, CorrectorConfig, OcrWord};
use crate::error::VirastError;
use crate::fuzzy::FuzzyIndex;

/// Relaxation applied to the acceptance threshold when the recognizer
/// itself reported low confidence for the word, and the floor it can
/// never relax below.
const LOW_CONFIDENCE_RELAXATION: f64 = 10.0;
const RELAXED_THRESHOLD_FLOOR: f64 = 50.0;

/// Confidence assumed for characters the recognizer did not cover.
const FALLBACK_CONFIDENCE: f64 = 0.5;

/// The correction engine: owns the loaded models and decides, word by word,
/// whether the recognizer's output should be kept or replaced.
///
/// All models are immutable after construction, so a single corrector can
/// serve concurrent correction calls without locking.
pub struct WordCorrector {
    dictionary: Dictionary,
    confusion: ConfusionModel,
    context: ContextModel,
    fuzzy: FuzzyIndex,
    config: CorrectorConfig,
}

impl WordCorrector {
    pub fn new(
        dictionary: Dictionary,
        confusion: ConfusionModel,
        context: ContextModel,
        config: CorrectorConfig,
    ) -> Self {
        let fuzzy = FuzzyIndex::build(dictionary.words().collect::<Vec<_>>());
        Self { dictionary, confusion, context, fuzzy, config }
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    pub fn context(&self) -> &ContextModel {
        &self.context
    }

    pub fn config(&self) -> &CorrectorConfig {
        &self.config
    }

    /// Ranks whole-text alternative readings against this corrector's
    /// dictionary and context model.
    pub fn hypothesis_selector(&self) -> HypothesisSelector<'_> {
        HypothesisSelector::new(
            &self.dictionary,
            &self.context,
            self.config.min_word_length,
            SelectorWeights::default(),
        )
    }

    fn generator(&self) -> CandidateGenerator<'_> {
        CandidateGenerator::new(&self.dictionary, &self.confusion, &self.fuzzy, &self.config)
    }

    fn scorer(&self) -> ContextScorer<'_> {
        ContextScorer::new(&self.context, self.config.min_word_length)
    }

    /// Decides one word. Two outcomes: the original is accepted (`None`) or
    /// a correction is returned alongside its log record.
    ///
    /// Context words are the word's neighbors in the original line.
    pub fn correct_word(
        &self,
        word: &str,
        confidences: Option<&[f64]>,
        prev: Option<&str>,
        next: Option<&str>,
        prev_prev: Option<&str>,
    ) -> (String, Option<Correction>) {
        let accepted = || (word.to_string(), None);

        if word.chars().count() < self.config.min_word_length {
            return accepted();
        }
        if self.dictionary.contains(word) {
            return accepted();
        }

        let candidates = self.generator().candidates(word, confidences);
        if candidates.is_empty() {
            return accepted();
        }

        let scorer = self.scorer();
        let mut best: Option<Correction> = None;
        for candidate in candidates {
            let context_score = scorer.score(prev, &candidate.text, next, prev_prev);
            let combined = (1.0 - self.config.context_weight) * candidate.score
                + self.config.context_weight * context_score;
            if best.as_ref().map_or(true, |b| combined > b.combined_score) {
                best = Some(Correction {
                    original: word.to_string(),
                    corrected: candidate.text,
                    base_score: candidate.score,
                    context_score,
                    combined_score: combined,
                    provenance: candidate.provenance,
                    word_confidence: None,
                });
            }
        }
        let Some(mut best) = best else { return accepted() };

        let mut threshold = self.config.confusion_threshold;
        let mean_confidence = confidences
            .filter(|c| !c.is_empty())
            .map(|c| c.iter().sum::<f64>() / c.len() as f64);
        if let Some(mean) = mean_confidence {
            best.word_confidence = Some(mean);
            if mean < self.config.confidence_threshold {
                threshold = (threshold - LOW_CONFIDENCE_RELAXATION).max(RELAXED_THRESHOLD_FLOOR);
            }
        }

        if best.corrected != word && best.combined_score >= threshold {
            debug!(
                original = %best.original,
                corrected = %best.corrected,
                combined = best.combined_score,
                "accepted correction"
            );
            (best.corrected.clone(), Some(best))
        } else {
            accepted()
        }
    }

    /// Corrects a whole text, word by word, left to right.
    ///
    /// Context is always taken from the original, uncorrected neighbors, so
    /// one bad correction cannot cascade into the next decision. Returns the
    /// corrected text and the ordered correction log.
    pub fn process_text(&self, text: &str) -> (String, Vec<Correction>) {
        let words: Vec<&str> = text.split_whitespace().collect();
        self.process_words(&words, |_| None)
    }

    /// Like [`process_text`](Self::process_text), with one per-character
    /// confidence slice per word. A count mismatch is an alignment failure:
    /// logged, then corrected context-only instead of erroring out.
    pub fn process_with_confidence(
        &self,
        text: &str,
        word_confidences: &[Vec<f64>],
    ) -> (String, Vec<Correction>) {
        let words: Vec<&str> = text.split_whitespace().collect();
        if words.len() != word_confidences.len() {
            let err = VirastError::AlignmentMismatch {
                words: words.len(),
                arrays: word_confidences.len(),
            };
            warn!(%err, "falling back to context-only correction");
            return self.process_words(&words, |_| None);
        }
        self.process_words(&words, |i| Some(word_confidences[i].as_slice()))
    }

    /// The correction API used by the recognizer pipeline: one line of OCR
    /// output plus, optionally, the recognizer's per-character confidence
    /// stream for that line.
    ///
    /// The stream is sliced into per-word runs by contiguous character
    /// counts, with one slot skipped per separating space; words the stream
    /// does not cover fall back to a neutral confidence. The mapping is best
    /// effort by nature.
    pub fn correct_line(
        &self,
        line: &str,
        char_confidences: Option<&[f64]>,
    ) -> (String, Vec<Correction>) {
        let Some(stream) = char_confidences else {
            return self.process_text(line);
        };
        let words = split_line_confidences(line, stream);
        let confidences: Vec<Vec<f64>> =
            words.into_iter().filter_map(|w| w.confidences).collect();
        self.process_with_confidence(line, &confidences)
    }

    fn process_words<'c>(
        &self,
        words: &[&str],
        confidences_for: impl Fn(usize) -> Option<&'c [f64]>,
    ) -> (String, Vec<Correction>) {
        if words.is_empty() {
            return (String::new(), Vec::new());
        }
        let mut corrected_words = Vec::with_capacity(words.len());
        let mut corrections = Vec::new();

        for (i, word) in words.iter().enumerate() {
            let prev_prev = i.checked_sub(2).map(|j| words[j]);
            let prev = i.checked_sub(1).map(|j| words[j]);
            let next = words.get(i + 1).copied();

            let (corrected, record) =
                self.correct_word(word, confidences_for(i), prev, next, prev_prev);
            corrected_words.push(corrected);
            if let Some(record) = record {
                corrections.push(record);
            }
        }

        (corrected_words.join(" "), corrections)
    }
}

/// Slices a per-line confidence stream into per-word [`OcrWord`]s by
/// contiguous character counts.
pub fn split_line_confidences(line: &str, stream: &[f64]) -> Vec<OcrWord> {
    let mut words = Vec::new();
    let mut char_idx = 0usize;
    for (index, word) in line.split_whitespace().enumerate() {
        let word_len = word.chars().count();
        let confidences = if char_idx + word_len <= stream.len() {
            stream[char_idx..char_idx + word_len].to_vec()
        } else {
            vec![FALLBACK_CONFIDENCE; word_len]
        };
        words.push(OcrWord {
            text: word.to_string(),
            confidences: Some(confidences),
            index,
        });
        char_idx += word_len + 1;
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corrector(words: &[&str], bigrams: &[(&str, &str, u64)]) -> WordCorrector {
        let mut dictionary = Dictionary::new(2);
        for word in words {
            dictionary.add(word);
        }
        let mut context = ContextModel::default();
        for &(first, second, count) in bigrams {
            for _ in 0..count {
                context.record_bigram(first, second);
            }
        }
        WordCorrector::new(
            dictionary,
            ConfusionModel::perso_arabic(),
            context,
            CorrectorConfig::default(),
        )
    }

    #[test]
    fn in_dictionary_text_is_untouched() {
        let corrector = corrector(&["کتاب", "درس", "خوب"], &[]);
        let text = "کتاب درس خوب درس";
        let (corrected, log) = corrector.process_text(text);
        assert_eq!(corrected, text);
        assert!(log.is_empty());
    }

    #[test]
    fn confusion_error_is_corrected_with_context() {
        let corrector = corrector(&["کتاب", "درس"], &[("کتاب", "درس", 5)]);
        let (corrected, log) = corrector.process_text("كتاب درس");
        assert_eq!(corrected, "کتاب درس");
        assert_eq!(log.len(), 1);
        let record = &log[0];
        assert_eq!(record.original, "كتاب");
        assert_eq!(record.corrected, "کتاب");
        assert!(record.base_score >= 90.0);
        assert_eq!(record.context_score, 100.0);
        assert!(record.combined_score >= corrector.config().confusion_threshold);
    }

    #[test]
    fn empty_dictionary_accepts_everything() {
        let corrector = corrector(&[], &[]);
        for word in ["کتاب", "قصیده", "xyz"] {
            let (out, record) = corrector.correct_word(word, None, None, None, None);
            assert_eq!(out, word);
            assert!(record.is_none());
        }
        let (corrected, log) = corrector.process_text("كتاب درس");
        assert_eq!(corrected, "كتاب درس");
        assert!(log.is_empty());
    }

    #[test]
    fn empty_input_is_a_no_op() {
        let corrector = corrector(&["کتاب"], &[]);
        for text in ["", "   "] {
            let (corrected, log) = corrector.process_text(text);
            assert_eq!(corrected, "");
            assert!(log.is_empty());
        }
        let (out, record) = corrector.correct_word("", None, None, None, None);
        assert_eq!(out, "");
        assert!(record.is_none());
    }

    #[test]
    fn low_word_confidence_relaxes_the_threshold() {
        // Without context evidence the combined score is
        // 0.8 * 92.5 + 0.2 * 50 = 84; drive the decision to the margin
        // with a stricter threshold so the relaxation is observable.
        let mut config = CorrectorConfig::default();
        config.confusion_threshold = 90.0;
        let strict = WordCorrector::new(
            {
                let mut d = Dictionary::new(2);
                d.add("کتاب");
                d
            },
            ConfusionModel::perso_arabic(),
            ContextModel::default(),
            config,
        );

        // Confident recognizer output: 84 < 90, original kept.
        let (out, record) = strict.correct_word("كتاب", None, None, None, None);
        assert_eq!(out, "كتاب");
        assert!(record.is_none());

        // Low confidence everywhere: threshold relaxes to 80, and the boost
        // for fixing a suspect character lifts the candidate past it.
        let low = [0.4, 0.5, 0.5, 0.4];
        let (out, record) = strict.correct_word("كتاب", Some(&low), None, None, None);
        assert_eq!(out, "کتاب");
        let record = record.unwrap();
        assert!(record.word_confidence.unwrap() < 0.8);
    }

    #[test]
    fn misaligned_confidences_fall_back_to_context_only() {
        let corrector = corrector(&["کتاب", "درس"], &[("کتاب", "درس", 5)]);
        let text = "كتاب درس";
        let confidences = vec![vec![0.9; 4]]; // two words, one array
        let (with_conf, log_a) = corrector.process_with_confidence(text, &confidences);
        let (without, log_b) = corrector.process_text(text);
        assert_eq!(with_conf, without);
        assert_eq!(log_a.len(), log_b.len());
    }

    #[test]
    fn line_confidences_are_sliced_per_word() {
        let stream = [0.9, 0.9, 0.9, 0.9, 0.0, 0.4, 0.9, 0.9];
        let words = split_line_confidences("کتاب درس", &stream);
        assert_eq!(words.len(), 2);
        assert_eq!(words[0].confidences.as_deref().unwrap(), &[0.9, 0.9, 0.9, 0.9]);
        assert_eq!(words[1].confidences.as_deref().unwrap(), &[0.4, 0.9, 0.9]);
        assert_eq!(words[1].index, 1);

        // A stream that is too short pads the uncovered word neutrally.
        let words = split_line_confidences("کتاب درس", &[0.9; 4]);
        assert_eq!(words[1].confidences.as_deref().unwrap(), &[0.5, 0.5, 0.5]);
    }

    #[test]
    fn correct_line_matches_process_text_without_confidences() {
        let corrector = corrector(&["کتاب", "درس"], &[("کتاب", "درس", 5)]);
        let (a, _) = corrector.correct_line("كتاب درس", None);
        let (b, _) = corrector.process_text("كتاب درس");
        assert_eq!(a, b);
    }
}
