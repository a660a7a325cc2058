//! Offline corpus indexing: building the context model from text files.

use std::fs;
use std::path::{Path, PathBuf};

use encoding_rs::{Encoding, ISO_8859_6, UTF_8, WINDOWS_1256};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::core::context::ContextModel;
use crate::core::dictionary::normalize_word;
use crate::error::{Result, VirastError};

/// Encodings attempted in order for every corpus file. Scanned books in this
/// script predate UTF-8 often enough that the legacy Arabic codepages matter.
const ENCODING_LADDER: &[&Encoding] = &[UTF_8, WINDOWS_1256, ISO_8859_6];

/// Outcome of one decode attempt over the encoding ladder.
#[derive(Debug)]
pub enum DecodeOutcome {
    Decoded(String),
    Failed(&'static str),
}

/// Tries each encoding in the ladder and stops at the first clean decode.
/// UTF-8 byte-order marks are recognized and stripped.
pub fn decode(bytes: &[u8]) -> DecodeOutcome {
    for encoding in ENCODING_LADDER {
        let (text, _, had_errors) = encoding.decode(bytes);
        if !had_errors {
            return DecodeOutcome::Decoded(text.into_owned());
        }
    }
    DecodeOutcome::Failed("malformed under every supported encoding")
}

/// Per-run statistics of a corpus indexing pass.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CorpusStats {
    pub files_processed: u64,
    pub files_failed: u64,
    pub total_words: u64,
    pub unique_words: usize,
    pub total_bigrams: u64,
    pub unique_bigram_heads: usize,
    pub total_trigrams: u64,
}

/// Accumulates word, bigram, and trigram counts from corpus text into a
/// [`ContextModel`].
///
/// Files are independent: directory runs index them in parallel, one local
/// model per file, and fold the results together with the model's merge
/// operation.
pub struct CorpusIndexer {
    model: ContextModel,
    min_word_length: usize,
    files_processed: u64,
    files_failed: u64,
}

impl CorpusIndexer {
    pub fn new(min_word_length: usize) -> Self {
        Self::with_model(ContextModel::default(), min_word_length)
    }

    /// Starts from an existing model, so a new corpus run extends previous
    /// statistics instead of replacing them.
    pub fn with_model(model: ContextModel, min_word_length: usize) -> Self {
        Self {
            model,
            min_word_length,
            files_processed: 0,
            files_failed: 0,
        }
    }

    /// Indexes one document: normalized tokens update the word frequencies,
    /// and sliding windows of two and three consecutive surviving tokens
    /// update the bigram and trigram counts.
    pub fn process(&mut self, text: &str) {
        index_text(&mut self.model, text, self.min_word_length);
    }

    /// Reads and indexes one file. An undecodable or unreadable file is
    /// counted as a failure and reported, but the indexer stays usable.
    pub fn process_file(&mut self, path: &Path) -> Result<()> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) => {
                self.files_failed += 1;
                return Err(err.into());
            }
        };
        match decode(&bytes) {
            DecodeOutcome::Decoded(text) => {
                self.process(&text);
                self.files_processed += 1;
                Ok(())
            }
            DecodeOutcome::Failed(reason) => {
                self.files_failed += 1;
                warn!(path = %path.display(), reason, "skipping corpus file");
                Err(VirastError::DecodeFailure { path: path.to_path_buf() })
            }
        }
    }

    /// Indexes every file under `root` whose name matches `pattern`
    /// (`*`-glob on file names). Files are processed in parallel and merged;
    /// failures are counted, never fatal for the batch.
    pub fn process_directory(
        &mut self,
        root: &Path,
        pattern: &str,
        recursive: bool,
    ) -> Result<CorpusStats> {
        if !root.is_dir() {
            return Err(VirastError::ResourceMissing { path: root.to_path_buf() });
        }
        let mut files = Vec::new();
        collect_files(root, pattern, recursive, &mut files)?;
        files.sort();
        info!(files = files.len(), root = %root.display(), "indexing corpus");

        let min_word_length = self.min_word_length;
        let (merged, processed, failed) = files
            .par_iter()
            .map(|path| {
                let mut local = ContextModel::default();
                match fs::read(path) {
                    Ok(bytes) => match decode(&bytes) {
                        DecodeOutcome::Decoded(text) => {
                            index_text(&mut local, &text, min_word_length);
                            (local, 1u64, 0u64)
                        }
                        DecodeOutcome::Failed(reason) => {
                            warn!(path = %path.display(), reason, "skipping corpus file");
                            (local, 0, 1)
                        }
                    },
                    Err(err) => {
                        warn!(path = %path.display(), %err, "skipping corpus file");
                        (local, 0, 1)
                    }
                }
            })
            .reduce(
                || (ContextModel::default(), 0, 0),
                |mut acc, item| {
                    acc.0.merge(item.0);
                    (acc.0, acc.1 + item.1, acc.2 + item.2)
                },
            );

        self.model.merge(merged);
        self.files_processed += processed;
        self.files_failed += failed;
        Ok(self.stats())
    }

    /// Folds another model's counts into this indexer's model.
    pub fn merge(&mut self, other: ContextModel) {
        self.model.merge(other);
    }

    pub fn stats(&self) -> CorpusStats {
        CorpusStats {
            files_processed: self.files_processed,
            files_failed: self.files_failed,
            total_words: self.model.total_words(),
            unique_words: self.model.unique_words(),
            total_bigrams: self.model.total_bigrams(),
            unique_bigram_heads: self.model.unique_bigram_heads(),
            total_trigrams: self.model.total_trigrams(),
        }
    }

    pub fn model(&self) -> &ContextModel {
        &self.model
    }

    pub fn into_model(self) -> ContextModel {
        self.model
    }

    /// Writes the corpus vocabulary, most frequent first, one word per
    /// line, keeping entries seen at least `min_freq` times. Returns the
    /// number of words written.
    pub fn save_vocabulary(&self, path: &Path, min_freq: u64) -> Result<usize> {
        let mut entries: Vec<(&str, u64)> = self
            .model
            .words()
            .filter(|&(_, freq)| freq >= min_freq)
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

        let mut out = String::new();
        for (word, _) in &entries {
            out.push_str(word);
            out.push('\n');
        }
        fs::write(path, out)?;
        Ok(entries.len())
    }
}

fn index_text(model: &mut ContextModel, text: &str, min_word_length: usize) {
    let tokens: Vec<String> = text
        .split_whitespace()
        .filter_map(|token| normalize_word(token, min_word_length))
        .collect();

    for token in &tokens {
        model.record_word(token);
    }
    for window in tokens.windows(2) {
        model.record_bigram(&window[0], &window[1]);
    }
    for window in tokens.windows(3) {
        model.record_trigram(&window[0], &window[1], &window[2]);
    }
}

fn collect_files(
    dir: &Path,
    pattern: &str,
    recursive: bool,
    out: &mut Vec<PathBuf>,
) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            if recursive {
                collect_files(&path, pattern, recursive, out)?;
            }
            continue;
        }
        let matches = path
            .file_name()
            .and_then(|name| name.to_str())
            .map_or(false, |name| matches_pattern(name, pattern));
        if matches {
            out.push(path);
        }
    }
    Ok(())
}

/// Minimal `*`-glob on file names: literal segments between stars must
/// appear in order, with the first anchored at the start and the last at the
/// end.
fn matches_pattern(name: &str, pattern: &str) -> bool {
    let segments: Vec<&str> = pattern.split('*').collect();
    let [first, middle @ .., last] = segments.as_slice() else {
        // A single segment means the pattern has no '*' at all.
        return name == pattern;
    };

    if !name.starts_with(first) || !name.ends_with(last) {
        return false;
    }
    if name.len() < first.len() + last.len() {
        return false;
    }
    let mut haystack = &name[first.len()..name.len() - last.len()];
    for segment in middle {
        if segment.is_empty() {
            continue;
        }
        match haystack.find(segment) {
            Some(pos) => haystack = &haystack[pos + segment.len()..],
            None => return false,
        }
    }
    true
}
