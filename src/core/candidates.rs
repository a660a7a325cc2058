//! Correction-candidate generation.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::core::confusion::ConfusionModel;
use crate::core::dictionary::Dictionary;
use crate::core::types::{Candidate, CorrectorConfig, Provenance};
use crate::fuzzy::FuzzyIndex;

/// Mixing weights for fuzzy matches: the raw ratio is re-scored with
/// confusion similarity so that confusion-equivalent substitutions outrank
/// generic edits of the same length.
const RATIO_WEIGHT: f64 = 0.4;
const CONFUSION_WEIGHT: f64 = 0.6;

/// Score boost per corrected low-confidence character.
const CONFIDENCE_BOOST: f64 = 5.0;

/// Proposes dictionary-backed replacements for one OCR word.
pub struct CandidateGenerator<'a> {
    dictionary: &'a Dictionary,
    confusion: &'a ConfusionModel,
    fuzzy: &'a FuzzyIndex,
    config: &'a CorrectorConfig,
}

impl<'a> CandidateGenerator<'a> {
    pub fn new(
        dictionary: &'a Dictionary,
        confusion: &'a ConfusionModel,
        fuzzy: &'a FuzzyIndex,
        config: &'a CorrectorConfig,
    ) -> Self {
        Self { dictionary, confusion, fuzzy, config }
    }

    /// Candidate list for `word`, best first, capped at
    /// `config.max_candidates`.
    ///
    /// A dictionary hit short-circuits to the word itself at score 100. An
    /// empty result means no usable correction was found; callers keep the
    /// original word in that case.
    pub fn candidates(&self, word: &str, confidences: Option<&[f64]>) -> Vec<Candidate> {
        if self.dictionary.is_empty() {
            return Vec::new();
        }
        if self.dictionary.contains(word) {
            return vec![Candidate {
                text: word.to_string(),
                score: 100.0,
                provenance: Provenance::DictionaryHit,
            }];
        }

        // Dedup by candidate text, keeping the maximum score.
        let mut by_text: HashMap<String, Candidate> = HashMap::new();
        let mut keep_max = |text: String, score: f64, provenance: Provenance| {
            by_text
                .entry(text.clone())
                .and_modify(|existing| {
                    if score > existing.score {
                        existing.score = score;
                        existing.provenance = provenance;
                    }
                })
                .or_insert(Candidate { text, score, provenance });
        };

        for variant in self.confusion.generate_variants(word, self.config.max_variants) {
            if variant == word || !self.dictionary.contains(&variant) {
                continue;
            }
            let score = self.confusion.similarity(word, &variant);
            if score >= self.config.confusion_threshold {
                keep_max(variant, score, Provenance::ConfusionVariant);
            }
        }

        for (entry, ratio) in self.fuzzy.search(word, self.config.max_candidates * 2) {
            if entry == word {
                continue;
            }
            let confusion_score = self.confusion.similarity(word, &entry);
            let score = RATIO_WEIGHT * ratio + CONFUSION_WEIGHT * confusion_score;
            if score >= self.config.confusion_threshold {
                keep_max(entry, score, Provenance::FuzzyMatch);
            }
        }

        let mut candidates: Vec<Candidate> = by_text.into_values().collect();

        if let Some(confidences) = confidences {
            self.apply_confidence_boost(word, confidences, &mut candidates);
        }

        sort_candidates(&mut candidates);
        candidates.truncate(self.config.max_candidates);

        for candidate in &mut candidates {
            let frequency = self.dictionary.frequency(&candidate.text);
            let bonus = if frequency >= 100 {
                5.0
            } else if frequency >= 10 {
                3.0
            } else {
                0.0
            };
            candidate.score = (candidate.score + bonus).min(100.0);
        }
        sort_candidates(&mut candidates);

        candidates
    }

    /// Rewards candidates whose differing positions coincide with characters
    /// the recognizer itself was unsure about. Only same-length candidates
    /// can be aligned position by position.
    fn apply_confidence_boost(
        &self,
        word: &str,
        confidences: &[f64],
        candidates: &mut [Candidate],
    ) {
        let word_chars: Vec<char> = word.chars().collect();
        if confidences.len() != word_chars.len() {
            return;
        }
        for candidate in candidates {
            let candidate_chars: Vec<char> = candidate.text.chars().collect();
            if candidate_chars.len() != word_chars.len() {
                continue;
            }
            let overlap = word_chars
                .iter()
                .zip(&candidate_chars)
                .zip(confidences)
                .filter(|((w, c), conf)| w != c && **conf < self.config.confidence_threshold)
                .count();
            if overlap > 0 {
                candidate.score =
                    (candidate.score + CONFIDENCE_BOOST * overlap as f64).min(100.0);
            }
        }
    }
}

fn sort_candidates(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.text.cmp(&b.text))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fuzzy::FuzzyIndex;

    fn setup(words: &[&str]) -> (Dictionary, ConfusionModel, FuzzyIndex, CorrectorConfig) {
        let mut dictionary = Dictionary::new(2);
        for word in words {
            dictionary.add(word);
        }
        let fuzzy = FuzzyIndex::build(dictionary.words().collect::<Vec<_>>());
        (dictionary, ConfusionModel::perso_arabic(), fuzzy, CorrectorConfig::default())
    }

    #[test]
    fn dictionary_word_is_sole_candidate_at_100() {
        let (dictionary, confusion, fuzzy, config) = setup(&["کتاب", "درس"]);
        let generator = CandidateGenerator::new(&dictionary, &confusion, &fuzzy, &config);
        for word in ["کتاب", "درس"] {
            let candidates = generator.candidates(word, None);
            assert_eq!(candidates.len(), 1);
            assert_eq!(candidates[0].text, word);
            assert_eq!(candidates[0].score, 100.0);
            assert_eq!(candidates[0].provenance, Provenance::DictionaryHit);
        }
    }

    #[test]
    fn empty_dictionary_yields_no_candidates() {
        let (dictionary, confusion, fuzzy, config) = setup(&[]);
        let generator = CandidateGenerator::new(&dictionary, &confusion, &fuzzy, &config);
        assert!(generator.candidates("کتاب", None).is_empty());
    }

    #[test]
    fn confusion_variant_is_proposed_with_high_similarity() {
        let (dictionary, confusion, fuzzy, config) = setup(&["کتاب", "درس"]);
        let generator = CandidateGenerator::new(&dictionary, &confusion, &fuzzy, &config);
        // Arabic kaf for Persian kaf: a classic recognizer confusion.
        let candidates = generator.candidates("كتاب", None);
        assert_eq!(candidates[0].text, "کتاب");
        assert!(candidates[0].score >= 90.0);
        assert_eq!(candidates[0].provenance, Provenance::ConfusionVariant);
        assert!(!candidates.iter().any(|c| c.text == "درس"));
    }

    #[test]
    fn duplicate_candidates_keep_the_maximum_score() {
        let (dictionary, confusion, fuzzy, config) = setup(&["کتاب"]);
        let generator = CandidateGenerator::new(&dictionary, &confusion, &fuzzy, &config);
        // کتاب is reachable both as a confusion variant (92.5) and as a
        // fuzzy match (lower, because the raw ratio drags it down).
        let candidates = generator.candidates("كتاب", None);
        assert_eq!(candidates.len(), 1);
        let expected = confusion.similarity("كتاب", "کتاب");
        assert!((candidates[0].score - expected).abs() < 1e-9);
    }

    #[test]
    fn low_confidence_characters_attract_corrections() {
        let (dictionary, confusion, fuzzy, config) = setup(&["کتاب"]);
        let generator = CandidateGenerator::new(&dictionary, &confusion, &fuzzy, &config);

        let plain = generator.candidates("كتاب", None);
        // The differing position (the kaf) was reported as low confidence.
        let boosted = generator.candidates("كتاب", Some(&[0.4, 0.9, 0.9, 0.9]));
        assert!(boosted[0].score > plain[0].score);
        assert!((boosted[0].score - (plain[0].score + 5.0)).abs() < 1e-9);

        // Misaligned confidence slice: no boost, no failure.
        let misaligned = generator.candidates("كتاب", Some(&[0.4, 0.9]));
        assert!((misaligned[0].score - plain[0].score).abs() < 1e-9);
    }

    #[test]
    fn frequent_words_get_a_bonus() {
        let dir = tempfile::tempdir().unwrap();
        let text = "کتاب ".repeat(12);
        std::fs::write(dir.path().join("corpus.txt"), text).unwrap();
        let dictionary = Dictionary::from_corpus_dir(dir.path(), 2).unwrap();
        assert_eq!(dictionary.frequency("کتاب"), 12);

        let confusion = ConfusionModel::perso_arabic();
        let fuzzy = FuzzyIndex::build(dictionary.words().collect::<Vec<_>>());
        let config = CorrectorConfig::default();
        let generator = CandidateGenerator::new(&dictionary, &confusion, &fuzzy, &config);

        let candidates = generator.candidates("كتاب", None);
        let base = confusion.similarity("كتاب", "کتاب");
        assert!((candidates[0].score - (base + 3.0)).abs() < 1e-9);
    }
}
