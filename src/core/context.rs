//! Word co-occurrence statistics and the neighbor-based scorer.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::core::dictionary::normalize_word;

/// Score returned whenever there is nothing to judge a word against: an
/// empty model or no observed context. Never a penalty.
pub const NEUTRAL_SCORE: f64 = 50.0;

/// Frequency-ratio multipliers. Trigram evidence is more specific than
/// bigram evidence, hence the larger multiplier.
const BIGRAM_SCALE: f64 = 500.0;
const TRIGRAM_SCALE: f64 = 800.0;

/// Word, bigram, and trigram counts accumulated from a corpus.
///
/// Built offline, persisted as one immutable snapshot, loaded read-only at
/// correction time. Two models merge by elementwise count addition; the
/// empty model is the identity of that operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextModel {
    word_freq: HashMap<String, u64>,
    /// first word -> (second word -> count)
    bigrams: HashMap<String, HashMap<String, u64>>,
    /// "w1|w2" -> (third word -> count)
    trigrams: HashMap<String, HashMap<String, u64>>,
    total_words: u64,
    total_bigrams: u64,
    total_trigrams: u64,
}

impl ContextModel {
    pub fn record_word(&mut self, word: &str) {
        *self.word_freq.entry(word.to_string()).or_insert(0) += 1;
        self.total_words += 1;
    }

    pub fn record_bigram(&mut self, first: &str, second: &str) {
        *self
            .bigrams
            .entry(first.to_string())
            .or_default()
            .entry(second.to_string())
            .or_insert(0) += 1;
        self.total_bigrams += 1;
    }

    pub fn record_trigram(&mut self, first: &str, second: &str, third: &str) {
        *self
            .trigrams
            .entry(trigram_key(first, second))
            .or_default()
            .entry(third.to_string())
            .or_insert(0) += 1;
        self.total_trigrams += 1;
    }

    /// Elementwise count addition. Commutative and associative; merging the
    /// empty model changes nothing.
    pub fn merge(&mut self, other: ContextModel) {
        for (word, count) in other.word_freq {
            *self.word_freq.entry(word).or_insert(0) += count;
        }
        for (first, following) in other.bigrams {
            let row = self.bigrams.entry(first).or_default();
            for (second, count) in following {
                *row.entry(second).or_insert(0) += count;
            }
        }
        for (key, following) in other.trigrams {
            let row = self.trigrams.entry(key).or_default();
            for (third, count) in following {
                *row.entry(third).or_insert(0) += count;
            }
        }
        self.total_words += other.total_words;
        self.total_bigrams += other.total_bigrams;
        self.total_trigrams += other.total_trigrams;
    }

    pub fn word_frequency(&self, word: &str) -> u64 {
        self.word_freq.get(word).copied().unwrap_or(0)
    }

    /// Every observed word with its frequency, in no particular order.
    pub fn words(&self) -> impl Iterator<Item = (&str, u64)> {
        self.word_freq.iter().map(|(word, &count)| (word.as_str(), count))
    }

    pub fn bigram_count(&self, first: &str, second: &str) -> u64 {
        self.bigrams
            .get(first)
            .and_then(|row| row.get(second))
            .copied()
            .unwrap_or(0)
    }

    pub fn trigram_count(&self, first: &str, second: &str, third: &str) -> u64 {
        self.trigrams
            .get(&trigram_key(first, second))
            .and_then(|row| row.get(third))
            .copied()
            .unwrap_or(0)
    }

    pub fn total_words(&self) -> u64 {
        self.total_words
    }

    pub fn total_bigrams(&self) -> u64 {
        self.total_bigrams
    }

    pub fn total_trigrams(&self) -> u64 {
        self.total_trigrams
    }

    pub fn unique_words(&self) -> usize {
        self.word_freq.len()
    }

    pub fn unique_bigram_heads(&self) -> usize {
        self.bigrams.len()
    }

    pub fn has_bigrams(&self) -> bool {
        self.total_bigrams > 0
    }

    fn following(&self, first: &str) -> Option<&HashMap<String, u64>> {
        self.bigrams.get(first)
    }

    fn trigram_following(&self, first: &str, second: &str) -> Option<&HashMap<String, u64>> {
        self.trigrams.get(&trigram_key(first, second))
    }
}

fn trigram_key(first: &str, second: &str) -> String {
    format!("{first}|{second}")
}

/// Conditional frequency of `word` within one observed row.
fn row_ratio(row: &HashMap<String, u64>, word: &str) -> Option<f64> {
    let count = *row.get(word)?;
    let total: u64 = row.values().sum();
    Some(count as f64 / total.max(1) as f64)
}

/// Scores a word against its neighbors using a loaded [`ContextModel`].
pub struct ContextScorer<'a> {
    model: &'a ContextModel,
    min_word_length: usize,
}

impl<'a> ContextScorer<'a> {
    pub fn new(model: &'a ContextModel, min_word_length: usize) -> Self {
        Self { model, min_word_length }
    }

    /// How well `word` fits between `prev` and `next`, in [0, 100].
    ///
    /// Averages the bigram contributions whose left side was observed in the
    /// corpus, plus a trigram contribution over `(prev_prev, prev)` when that
    /// history exists. An empty model or unobserved context yields the
    /// neutral score.
    pub fn score(
        &self,
        prev: Option<&str>,
        word: &str,
        next: Option<&str>,
        prev_prev: Option<&str>,
    ) -> f64 {
        if !self.model.has_bigrams() {
            return NEUTRAL_SCORE;
        }

        let normalize = |w: &str| normalize_word(w, self.min_word_length);
        let word_norm = normalize(word);

        let mut score = 0.0;
        let mut contributions = 0u32;

        if let Some(prev_norm) = prev.and_then(&normalize) {
            if let Some(row) = self.model.following(&prev_norm) {
                if let Some(ratio) = word_norm.as_deref().and_then(|w| row_ratio(row, w)) {
                    score += (ratio * BIGRAM_SCALE).min(100.0);
                }
                contributions += 1;
            }
        }

        if let (Some(next), Some(word_norm)) = (next, word_norm.as_deref()) {
            if let Some(row) = self.model.following(word_norm) {
                if let Some(ratio) = normalize(next).and_then(|n| row_ratio(row, &n)) {
                    score += (ratio * BIGRAM_SCALE).min(100.0);
                }
                contributions += 1;
            }
        }

        if self.model.total_trigrams() > 0 {
            let history = (
                prev_prev.and_then(&normalize),
                prev.and_then(&normalize),
            );
            if let (Some(prev_prev_norm), Some(prev_norm)) = history {
                if let Some(row) = self.model.trigram_following(&prev_prev_norm, &prev_norm) {
                    if let Some(ratio) = word_norm.as_deref().and_then(|w| row_ratio(row, w)) {
                        score += (ratio * TRIGRAM_SCALE).min(100.0);
                        contributions += 1;
                    }
                }
            }
        }

        if contributions == 0 {
            NEUTRAL_SCORE
        } else {
            score / f64::from(contributions)
        }
    }
}
