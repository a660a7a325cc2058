//! Approximate lexical search over the dictionary.
//!
//! Words are bucketed by character length at build time so a lookup only
//! scores the slice of the dictionary whose length is close enough to the
//! query to ever reach a usable ratio.

use std::cmp::Ordering;
use std::collections::HashMap;

/// Buckets beyond this length difference are never scanned; at the ratio
/// thresholds this engine uses, such pairs cannot win anyway.
const MAX_LENGTH_DIFF: usize = 3;

/// A length-bucketed index over dictionary words, searched with a
/// normalized Levenshtein ratio.
///
/// Built once per dictionary and immutable afterwards; lookups are `&self`.
#[derive(Debug, Clone, Default)]
pub struct FuzzyIndex {
    by_length: HashMap<usize, Vec<String>>,
    len: usize,
}

impl FuzzyIndex {
    /// Indexes the given words. Complexity O(n) over the dictionary.
    pub fn build<'a>(words: impl IntoIterator<Item = &'a str>) -> Self {
        let mut by_length: HashMap<usize, Vec<String>> = HashMap::new();
        let mut len = 0;
        for word in words {
            by_length
                .entry(word.chars().count())
                .or_default()
                .push(word.to_string());
            len += 1;
        }
        // Deterministic scan order inside each bucket.
        for bucket in by_length.values_mut() {
            bucket.sort_unstable();
        }
        Self { by_length, len }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Top `limit` dictionary words by ratio similarity to `word`, best
    /// first (ratio in [0, 100]; ties broken lexicographically).
    pub fn search(&self, word: &str, limit: usize) -> Vec<(String, f64)> {
        if limit == 0 || self.is_empty() {
            return Vec::new();
        }
        let word_len = word.chars().count();
        let lo = word_len.saturating_sub(MAX_LENGTH_DIFF);
        let hi = word_len + MAX_LENGTH_DIFF;

        let mut scored: Vec<(&str, f64)> = Vec::new();
        for length in lo..=hi {
            let Some(bucket) = self.by_length.get(&length) else { continue };
            for entry in bucket {
                let ratio = strsim::normalized_levenshtein(word, entry) * 100.0;
                scored.push((entry.as_str(), ratio));
            }
        }

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(b.0))
        });
        scored.truncate(limit);
        scored
            .into_iter()
            .map(|(entry, ratio)| (entry.to_string(), ratio))
            .collect()
    }
}
