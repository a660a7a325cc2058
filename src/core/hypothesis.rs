//! Ranking of alternative whole-text readings.
//!
//! When the upstream decoder emits several hypotheses for a line (beam
//! alternatives), the decoder's own score is only one signal; dictionary
//! coverage and context coherence often disagree with it, and win.

use std::cmp::Ordering;

use serde::Serialize;

use crate::core::context::{ContextModel, ContextScorer, NEUTRAL_SCORE};
use crate::core::dictionary::Dictionary;

/// Relative weights of the three signals. Empirically chosen; the property
/// tests pin their behavior.
#[derive(Debug, Clone, Copy)]
pub struct SelectorWeights {
    pub decoder: f64,
    pub coverage: f64,
    pub context: f64,
}

impl Default for SelectorWeights {
    fn default() -> Self {
        Self { decoder: 0.3, coverage: 0.4, context: 0.3 }
    }
}

/// Score breakdown for one hypothesis.
#[derive(Debug, Clone, Serialize)]
pub struct HypothesisScore {
    pub combined: f64,
    pub decoder_score: f64,
    /// Fraction of words found verbatim in the dictionary.
    pub dictionary_coverage: f64,
    /// Mean context coherence over consecutive word windows.
    pub context_score: f64,
    pub words_in_dictionary: usize,
    pub total_words: usize,
}

/// The chosen hypothesis. `score` is absent on the single-hypothesis fast
/// path, where nothing is computed.
#[derive(Debug, Clone, Serialize)]
pub struct Selection {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<HypothesisScore>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runner_up: Option<f64>,
}

/// Scores and ranks full-text hypotheses against a dictionary and a context
/// model.
pub struct HypothesisSelector<'a> {
    dictionary: &'a Dictionary,
    scorer: ContextScorer<'a>,
    weights: SelectorWeights,
}

impl<'a> HypothesisSelector<'a> {
    pub fn new(
        dictionary: &'a Dictionary,
        context: &'a ContextModel,
        min_word_length: usize,
        weights: SelectorWeights,
    ) -> Self {
        Self {
            dictionary,
            scorer: ContextScorer::new(context, min_word_length),
            weights,
        }
    }

    /// Combines the external decoder score with dictionary coverage and mean
    /// context coherence.
    pub fn score_hypothesis(&self, text: &str, decoder_score: f64) -> HypothesisScore {
        let words: Vec<&str> = text.split_whitespace().collect();

        let words_in_dictionary = words
            .iter()
            .filter(|word| self.dictionary.contains(word))
            .count();
        let dictionary_coverage = words_in_dictionary as f64 / words.len().max(1) as f64;

        let context_score = if words.len() > 1 {
            let mut sum = 0.0;
            for i in 0..words.len() - 1 {
                sum += self.scorer.score(
                    Some(words[i]),
                    words[i + 1],
                    words.get(i + 2).copied(),
                    None,
                );
            }
            sum / (words.len() - 1) as f64
        } else {
            NEUTRAL_SCORE
        };

        let combined = self.weights.decoder * decoder_score
            + self.weights.coverage * (dictionary_coverage * 100.0)
            + self.weights.context * context_score;

        HypothesisScore {
            combined,
            decoder_score,
            dictionary_coverage,
            context_score,
            words_in_dictionary,
            total_words: words.len(),
        }
    }

    /// Picks the best hypothesis. A single hypothesis is returned as-is
    /// without scoring; an empty slice yields `None`.
    pub fn select_best(&self, hypotheses: &[(String, f64)]) -> Option<Selection> {
        match hypotheses {
            [] => None,
            [(text, _)] => Some(Selection {
                text: text.clone(),
                score: None,
                runner_up: None,
            }),
            _ => {
                let mut scored: Vec<(usize, HypothesisScore)> = hypotheses
                    .iter()
                    .enumerate()
                    .map(|(i, (text, decoder_score))| {
                        (i, self.score_hypothesis(text, *decoder_score))
                    })
                    .collect();
                scored.sort_by(|a, b| {
                    b.1.combined
                        .partial_cmp(&a.1.combined)
                        .unwrap_or(Ordering::Equal)
                        .then_with(|| a.0.cmp(&b.0))
                });

                let runner_up = scored.get(1).map(|(_, s)| s.combined);
                let (winner, score) = scored.into_iter().next()?;
                Some(Selection {
                    text: hypotheses[winner].0.clone(),
                    score: Some(score),
                    runner_up,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::context::ContextModel;

    fn fixtures() -> (Dictionary, ContextModel) {
        let mut dictionary = Dictionary::new(2);
        for word in ["کتاب", "درس", "خوب"] {
            dictionary.add(word);
        }
        let mut context = ContextModel::default();
        for _ in 0..5 {
            context.record_bigram("کتاب", "درس");
        }
        (dictionary, context)
    }

    #[test]
    fn single_hypothesis_fast_path_skips_scoring() {
        let (dictionary, context) = fixtures();
        let selector =
            HypothesisSelector::new(&dictionary, &context, 2, SelectorWeights::default());
        let hypotheses = vec![("کتاب درس".to_string(), 10.0)];
        let selection = selector.select_best(&hypotheses).unwrap();
        assert_eq!(selection.text, "کتاب درس");
        assert!(selection.score.is_none());
    }

    #[test]
    fn empty_hypothesis_list_selects_nothing() {
        let (dictionary, context) = fixtures();
        let selector =
            HypothesisSelector::new(&dictionary, &context, 2, SelectorWeights::default());
        assert!(selector.select_best(&[]).is_none());
    }

    #[test]
    fn content_quality_beats_a_higher_decoder_score() {
        let (dictionary, context) = fixtures();
        let selector =
            HypothesisSelector::new(&dictionary, &context, 2, SelectorWeights::default());

        // Full coverage and perfect bigram coherence, weak decoder:
        // 0.3*40 + 0.4*100 + 0.3*100 = 82.
        let good = "کتاب درس".to_string();
        // No dictionary words, unknown context, strong decoder:
        // 0.3*90 + 0.4*0 + 0.3*50 = 42.
        let bad = "كتاب درى".to_string();

        let good_score = selector.score_hypothesis(&good, 40.0);
        assert!((good_score.combined - 82.0).abs() < 1e-9);
        assert_eq!(good_score.dictionary_coverage, 1.0);
        let bad_score = selector.score_hypothesis(&bad, 90.0);
        assert!((bad_score.combined - 42.0).abs() < 1e-9);

        let hypotheses = vec![(bad, 90.0), (good.clone(), 40.0)];
        let selection = selector.select_best(&hypotheses).unwrap();
        assert_eq!(selection.text, good);
        assert!((selection.runner_up.unwrap() - 42.0).abs() < 1e-9);
    }

    #[test]
    fn single_word_hypothesis_scores_neutral_context() {
        let (dictionary, context) = fixtures();
        let selector =
            HypothesisSelector::new(&dictionary, &context, 2, SelectorWeights::default());
        let score = selector.score_hypothesis("کتاب", 0.0);
        assert_eq!(score.context_score, NEUTRAL_SCORE);
        assert_eq!(score.words_in_dictionary, 1);
    }
}
