//! The set of known-valid words the corrector trusts.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::error::{Result, VirastError};

/// Strips edge characters outside the word range (`\w` plus the Arabic and
/// Arabic Supplement blocks) and rejects tokens that end up shorter than
/// `min_len` or purely numeric.
///
/// This is the one normalization routine in the crate; dictionary building,
/// corpus indexing, and context lookups all go through it so that words
/// compare identically everywhere.
pub fn normalize_word(word: &str, min_len: usize) -> Option<String> {
    let trimmed = word.trim_matches(|c| !is_word_char(c));
    if trimmed.chars().count() < min_len {
        return None;
    }
    if trimmed.chars().all(char::is_numeric) {
        return None;
    }
    Some(trimmed.to_string())
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || is_script_char(c)
}

/// Arabic block plus the Arabic Supplement block.
pub(crate) fn is_script_char(c: char) -> bool {
    matches!(c, '\u{0600}'..='\u{06FF}' | '\u{0750}'..='\u{077F}')
}

/// Known-valid words with their corpus frequencies.
///
/// Loaded read-only at startup; correction calls never mutate it. Every
/// stored word is normalized and at least `min_word_length` characters long.
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    words: HashSet<String>,
    frequencies: HashMap<String, u64>,
    min_word_length: usize,
}

impl Dictionary {
    pub fn new(min_word_length: usize) -> Self {
        Self {
            words: HashSet::new(),
            frequencies: HashMap::new(),
            min_word_length,
        }
    }

    /// Loads a UTF-8 word list, one word per line. Blank lines and entries
    /// shorter than `min_word_length` are skipped.
    pub fn from_file(path: &Path, min_word_length: usize) -> Result<Self> {
        if !path.is_file() {
            return Err(VirastError::ResourceMissing { path: path.to_path_buf() });
        }
        let bytes = fs::read(path)?;
        let text = String::from_utf8_lossy(&bytes);

        let mut dictionary = Self::new(min_word_length);
        for line in text.lines() {
            dictionary.add(line);
        }
        info!(words = dictionary.len(), path = %path.display(), "loaded dictionary");
        Ok(dictionary)
    }

    /// Like [`from_file`](Self::from_file) but degrades to an empty
    /// dictionary when the file is missing or unreadable: the corrector then
    /// accepts every word rather than failing.
    pub fn load_or_empty(path: &Path, min_word_length: usize) -> Self {
        match Self::from_file(path, min_word_length) {
            Ok(dictionary) => dictionary,
            Err(err) => {
                warn!(%err, "dictionary unavailable, corrections disabled");
                Self::new(min_word_length)
            }
        }
    }

    /// Derives a dictionary from a directory of `.txt` corpus files: every
    /// run of Arabic-script characters becomes a word, with frequencies.
    pub fn from_corpus_dir(dir: &Path, min_word_length: usize) -> Result<Self> {
        if !dir.is_dir() {
            return Err(VirastError::ResourceMissing { path: dir.to_path_buf() });
        }
        let mut dictionary = Self::new(min_word_length);
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("txt") {
                continue;
            }
            let Ok(bytes) = fs::read(&path) else { continue };
            let text = String::from_utf8_lossy(&bytes);
            for word in text.split(|c| !is_script_char(c)) {
                if word.chars().count() >= min_word_length {
                    dictionary.add_with_count(word, 1);
                }
            }
        }
        info!(words = dictionary.len(), dir = %dir.display(), "built dictionary from corpus");
        Ok(dictionary)
    }

    /// Inserts one word after normalization. No-op for tokens the
    /// normalizer rejects.
    pub fn add(&mut self, word: &str) {
        if let Some(normalized) = normalize_word(word, self.min_word_length) {
            self.words.insert(normalized);
        }
    }

    fn add_with_count(&mut self, word: &str, count: u64) {
        if let Some(normalized) = normalize_word(word, self.min_word_length) {
            *self.frequencies.entry(normalized.clone()).or_insert(0) += count;
            self.words.insert(normalized);
        }
    }

    /// Membership test: the raw token, or its normalized form.
    pub fn contains(&self, word: &str) -> bool {
        if self.words.contains(word) {
            return true;
        }
        normalize_word(word, self.min_word_length)
            .is_some_and(|normalized| self.words.contains(&normalized))
    }

    pub fn frequency(&self, word: &str) -> u64 {
        self.frequencies.get(word).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn min_word_length(&self) -> usize {
        self.min_word_length
    }

    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(String::as_str)
    }

    /// Writes the word list, most frequent first, one word per line.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut entries: Vec<(&str, u64)> = self
            .words
            .iter()
            .map(|w| (w.as_str(), self.frequency(w)))
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

        let mut out = String::new();
        for (word, _) in entries {
            out.push_str(word);
            out.push('\n');
        }
        fs::write(path, out)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_strips_edges_and_rejects_junk() {
        assert_eq!(normalize_word("«کتاب»", 2).as_deref(), Some("کتاب"));
        assert_eq!(normalize_word("کتاب،", 2).as_deref(), Some("کتاب"));
        assert_eq!(normalize_word("و", 2), None);
        assert_eq!(normalize_word("۱۲۳", 2), None);
        assert_eq!(normalize_word("123", 2), None);
        assert_eq!(normalize_word("...", 2), None);
        // Interior punctuation survives; only edges are stripped.
        assert_eq!(normalize_word("(می‌روم)", 2).as_deref(), Some("می‌روم"));
    }

    #[test]
    fn contains_matches_raw_and_normalized_forms() {
        let mut dictionary = Dictionary::new(2);
        dictionary.add("کتاب");
        assert!(dictionary.contains("کتاب"));
        assert!(dictionary.contains("کتاب،"));
        assert!(!dictionary.contains("درس"));
    }

    #[test]
    fn word_list_loading_skips_blank_and_short_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("words.txt");
        fs::write(&path, "کتاب\n\nد\nدرس\n").unwrap();

        let dictionary = Dictionary::from_file(&path, 2).unwrap();
        assert_eq!(dictionary.len(), 2);
        assert!(dictionary.contains("کتاب"));
        assert!(dictionary.contains("درس"));
    }

    #[test]
    fn missing_word_list_is_resource_missing() {
        let err = Dictionary::from_file(Path::new("no/such/file.txt"), 2).unwrap_err();
        assert!(matches!(err, VirastError::ResourceMissing { .. }));
        let dictionary = Dictionary::load_or_empty(Path::new("no/such/file.txt"), 2);
        assert!(dictionary.is_empty());
    }

    #[test]
    fn saved_word_list_is_frequency_sorted_and_reloadable() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("c.txt"), "کتاب کتاب درس").unwrap();
        let dictionary = Dictionary::from_corpus_dir(dir.path(), 2).unwrap();

        let out = dir.path().join("out/dictionary.txt");
        dictionary.save(&out).unwrap();
        assert_eq!(fs::read_to_string(&out).unwrap(), "کتاب\nدرس\n");

        let reloaded = Dictionary::from_file(&out, 2).unwrap();
        assert_eq!(reloaded.len(), 2);
    }

    #[test]
    fn corpus_derived_dictionary_counts_frequencies() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "کتاب درس کتاب").unwrap();
        fs::write(dir.path().join("b.txt"), "کتاب خوب!").unwrap();
        fs::write(dir.path().join("ignored.log"), "کتاب").unwrap();

        let dictionary = Dictionary::from_corpus_dir(dir.path(), 2).unwrap();
        assert_eq!(dictionary.frequency("کتاب"), 3);
        assert_eq!(dictionary.frequency("درس"), 1);
        assert_eq!(dictionary.frequency("خوب"), 1);
        assert_eq!(dictionary.len(), 3);
    }
}
