use std::path::PathBuf;

use thiserror::Error;

/// Standard result type for fallible operations in this crate.
pub type Result<T> = std::result::Result<T, VirastError>;

/// Failures that can occur while loading resources or indexing corpora.
///
/// None of these escape the correction API itself: a missing resource
/// degrades to neutral scoring, an undecodable corpus file is skipped and
/// counted, and a misaligned confidence stream falls back to context-only
/// correction. The variants exist so the loading and indexing layer can
/// report what happened.
#[derive(Debug, Error)]
pub enum VirastError {
    #[error("resource not found: {}", path.display())]
    ResourceMissing { path: PathBuf },

    #[error("{}: no supported encoding produced a clean decode", path.display())]
    DecodeFailure { path: PathBuf },

    #[error("confidence arrays do not align: {words} words, {arrays} arrays")]
    AlignmentMismatch { words: usize, arrays: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot serialization failed: {0}")]
    Snapshot(#[from] bincode::Error),
}
