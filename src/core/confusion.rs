//! Visual confusability of Perso-Arabic characters under OCR.
//!
//! Most recognition errors in this script come from dot placement (ب پ ت ث ن),
//! near-identical letter bodies (ج چ ح خ), and the Persian/Arabic variants of
//! the same letter (ک/ك, ی/ي). The table below encodes those pairs; the model
//! derives a reverse closure ("OCR might have produced X instead of Y") and
//! weights substitutions between confusable characters far below arbitrary
//! edits.

use std::collections::{HashMap, HashSet};

/// Substitution cost for a pair present in each other's confusable set.
const CONFUSABLE_SUBSTITUTION_COST: f64 = 0.3;

/// Length-difference guard: beyond this the DP is skipped and the pair is
/// classified as very dissimilar, not measured exactly.
const MAX_LENGTH_DIFF: usize = 3;

/// For each character, the substitutions OCR is known to produce or consume.
/// Entries may be multi-character (ل misread as لا).
const CONFUSION_TABLE: &[(char, &[&str])] = &[
    // Dots confusion (most common)
    ('ب', &["پ", "ت", "ث", "ن", "ی"]),
    ('پ', &["ب", "ت", "ث", "چ"]),
    ('ت', &["ب", "پ", "ث", "ن"]),
    ('ث', &["ب", "پ", "ت"]),
    ('ج', &["چ", "ح", "خ"]),
    ('چ', &["ج", "ح", "خ"]),
    ('ح', &["ج", "چ", "خ"]),
    ('خ', &["ج", "چ", "ح"]),
    ('د', &["ذ"]),
    ('ذ', &["د"]),
    ('ر', &["ز", "ژ", "و"]),
    ('ز', &["ر", "ژ"]),
    ('ژ', &["ز", "ر"]),
    ('س', &["ش"]),
    ('ش', &["س"]),
    ('ص', &["ض"]),
    ('ض', &["ص"]),
    ('ط', &["ظ"]),
    ('ظ', &["ط"]),
    ('ع', &["غ"]),
    ('غ', &["ع"]),
    ('ف', &["ق"]),
    ('ق', &["ف"]),
    ('ک', &["گ", "ك"]),
    ('گ', &["ک", "ك"]),
    ('ل', &["ا", "لا"]),
    ('م', &["ن"]),
    ('ن', &["ب", "ت", "ث", "م", "ی"]),
    ('و', &["ر", "ؤ"]),
    ('ه', &["ة", "ۀ", "ھ"]),
    ('ی', &["ي", "ى", "ئ", "ب", "ت", "ن"]),
    // Arabic-specific
    ('ك', &["ک", "گ"]),
    ('ي', &["ی", "ى"]),
    ('ة', &["ه", "ۀ"]),
    ('أ', &["ا", "إ", "آ"]),
    ('إ', &["ا", "أ", "آ"]),
    ('آ', &["ا", "أ", "إ"]),
    ('ؤ', &["و", "ء"]),
    ('ئ', &["ی", "ء"]),
    // Digits (Persian vs Arabic forms)
    ('۴', &["۵", "4"]),
    ('۵', &["۴", "5"]),
    ('۶', &["6"]),
    ('٤', &["٥", "۴", "۵"]),
    ('٥', &["٤", "۴", "۵"]),
    ('٦', &["۶", "6"]),
];

/// Immutable character-confusability model.
///
/// Built once from the static table; correction calls only read it, so a
/// single instance can back any number of concurrent correctors.
#[derive(Debug, Clone)]
pub struct ConfusionModel {
    /// Forward substitutions, possibly multi-character.
    forward: HashMap<char, Vec<&'static str>>,
    /// Single-character confusable sets, directional, for the weighted DP.
    pairs: HashMap<char, HashSet<char>>,
    /// Reverse closure over single-character entries; every character maps
    /// to itself as well.
    reverse: HashMap<char, Vec<char>>,
}

impl ConfusionModel {
    /// Builds the model for Perso-Arabic script.
    pub fn perso_arabic() -> Self {
        let mut forward: HashMap<char, Vec<&'static str>> = HashMap::new();
        let mut pairs: HashMap<char, HashSet<char>> = HashMap::new();
        let mut reverse: HashMap<char, Vec<char>> = HashMap::new();

        for &(correct, confusions) in CONFUSION_TABLE {
            forward.insert(correct, confusions.to_vec());
            reverse.entry(correct).or_default();
            for confusion in confusions {
                let mut chars = confusion.chars();
                let first = chars.next();
                // Multi-character substitutions take part in variant
                // generation only; the DP works on single characters.
                if let (Some(c), None) = (first, chars.next()) {
                    pairs.entry(correct).or_default().insert(c);
                    let produced = reverse.entry(c).or_default();
                    if !produced.contains(&correct) {
                        produced.push(correct);
                    }
                }
            }
        }
        for produced in reverse.values_mut() {
            produced.sort_unstable();
        }
        // Identity entries close the reverse map.
        for (&c, produced) in &mut reverse {
            if !produced.contains(&c) {
                produced.push(c);
            }
        }

        Self { forward, pairs, reverse }
    }

    /// True when the pair appears in either direction's confusable set.
    pub fn confusable(&self, a: char, b: char) -> bool {
        self.pairs.get(&a).is_some_and(|set| set.contains(&b))
            || self.pairs.get(&b).is_some_and(|set| set.contains(&a))
    }

    /// Generates the intended-word hypotheses for `word` by substituting each
    /// position with its confusable alternatives, in both directions.
    ///
    /// The unmodified word is always the first entry; the result is
    /// deterministic and capped at `max_variants`.
    pub fn generate_variants(&self, word: &str, max_variants: usize) -> Vec<String> {
        let chars: Vec<char> = word.chars().collect();
        let mut seen: HashSet<String> = HashSet::new();
        let mut variants: Vec<String> = Vec::new();

        seen.insert(word.to_string());
        variants.push(word.to_string());
        if variants.len() >= max_variants {
            return variants;
        }

        for (i, &c) in chars.iter().enumerate() {
            if let Some(replacements) = self.forward.get(&c) {
                for replacement in replacements {
                    let variant = substitute(&chars, i, replacement);
                    if seen.insert(variant.clone()) {
                        variants.push(variant);
                        if variants.len() >= max_variants {
                            return variants;
                        }
                    }
                }
            }
        }
        for (i, &c) in chars.iter().enumerate() {
            if let Some(produced_by) = self.reverse.get(&c) {
                for &original in produced_by {
                    let mut buf = [0u8; 4];
                    let variant = substitute(&chars, i, original.encode_utf8(&mut buf));
                    if seen.insert(variant.clone()) {
                        variants.push(variant);
                        if variants.len() >= max_variants {
                            return variants;
                        }
                    }
                }
            }
        }

        variants
    }

    /// Edit distance where substitutions between confusable characters cost
    /// 0.3 instead of 1.0. Insertions and deletions cost 1.0.
    ///
    /// When the lengths differ by more than the guard, the DP is skipped and
    /// `max(len)` is returned; callers must treat that branch as "very
    /// dissimilar" rather than an exact distance.
    pub fn edit_distance(&self, a: &str, b: &str) -> f64 {
        if a == b {
            return 0.0;
        }
        let a: Vec<char> = a.chars().collect();
        let b: Vec<char> = b.chars().collect();
        let (la, lb) = (a.len(), b.len());

        if la.abs_diff(lb) > MAX_LENGTH_DIFF {
            return la.max(lb) as f64;
        }

        let mut dp = vec![vec![0.0f64; lb + 1]; la + 1];
        for (i, row) in dp.iter_mut().enumerate() {
            row[0] = i as f64;
        }
        for j in 0..=lb {
            dp[0][j] = j as f64;
        }

        for i in 1..=la {
            for j in 1..=lb {
                let substitution = if a[i - 1] == b[j - 1] {
                    0.0
                } else if self.confusable(a[i - 1], b[j - 1]) {
                    CONFUSABLE_SUBSTITUTION_COST
                } else {
                    1.0
                };
                dp[i][j] = (dp[i - 1][j] + 1.0)
                    .min(dp[i][j - 1] + 1.0)
                    .min(dp[i - 1][j - 1] + substitution);
            }
        }

        dp[la][lb]
    }

    /// Similarity in [0, 100] derived from `edit_distance`. Reflexive
    /// (`similarity(a, a) == 100`) and symmetric.
    pub fn similarity(&self, a: &str, b: &str) -> f64 {
        if a == b {
            return 100.0;
        }
        let max_len = a.chars().count().max(b.chars().count()).max(1);
        let distance = self.edit_distance(a, b);
        (100.0 * (1.0 - distance / max_len as f64)).clamp(0.0, 100.0)
    }
}

fn substitute(chars: &[char], index: usize, replacement: &str) -> String {
    let mut out = String::with_capacity(chars.len() + replacement.len());
    out.extend(&chars[..index]);
    out.push_str(replacement);
    out.extend(&chars[index + 1..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn similarity_is_reflexive_and_symmetric() {
        let model = ConfusionModel::perso_arabic();
        for word in ["کتاب", "درس", "a", ""] {
            assert_eq!(model.similarity(word, word), 100.0);
        }
        let pairs = [("کتاب", "كتاب"), ("درس", "درست"), ("ریاضی", "رياضي")];
        for (a, b) in pairs {
            let ab = model.similarity(a, b);
            let ba = model.similarity(b, a);
            assert!((ab - ba).abs() < 1e-9, "{a}/{b}: {ab} vs {ba}");
        }
    }

    #[test]
    fn confusable_substitution_costs_less() {
        let model = ConfusionModel::perso_arabic();
        // ک and ك are a known confusion pair; single cheap substitution.
        assert!((model.edit_distance("کتاب", "كتاب") - 0.3).abs() < 1e-9);
        assert!(model.similarity("کتاب", "كتاب") >= 90.0);
        // An unrelated substitution of the same shape costs full price.
        assert!(model.similarity("کتاب", "متاب") < model.similarity("کتاب", "كتاب"));
    }

    #[test]
    fn variants_cover_confusable_pairs() {
        let model = ConfusionModel::perso_arabic();
        let variants = model.generate_variants("كتاب", 20);
        assert_eq!(variants[0], "كتاب");
        assert!(variants.contains(&"کتاب".to_string()));
    }

    #[test]
    fn variants_respect_cap_and_include_original() {
        let model = ConfusionModel::perso_arabic();
        let variants = model.generate_variants("بیننده", 5);
        assert_eq!(variants.len(), 5);
        assert_eq!(variants[0], "بیننده");
        let unique: HashSet<_> = variants.iter().collect();
        assert_eq!(unique.len(), variants.len());
    }

    #[test]
    fn length_guard_short_circuits() {
        let model = ConfusionModel::perso_arabic();
        // 8 chars vs 2 chars: guard trips, distance is max(len).
        assert_eq!(model.edit_distance("ابابابات", "اب"), 8.0);
        assert_eq!(model.similarity("ابابابات", "اب"), 0.0);
    }

    #[test]
    fn multi_character_substitution_generates_variant() {
        let model = ConfusionModel::perso_arabic();
        let variants = model.generate_variants("سلم", 20);
        // ل misread as لا.
        assert!(variants.contains(&"سلام".to_string()));
    }
}
