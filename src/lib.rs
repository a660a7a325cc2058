//! Post-correction for Perso-Arabic OCR output.
//!
//! The recognizer upstream is good at shapes and bad at dots; this crate
//! holds the knowledge it lacks: a dictionary of valid words, a table of
//! visually-confusable characters, and n-gram statistics from a corpus.
//! Together they decide, per recognized word, whether the raw output should
//! be kept or replaced, and can rank whole-line alternative readings.

pub mod core;
pub mod corpus;
pub mod error;
pub mod fuzzy;
pub mod persistence;

pub use crate::core::confusion::ConfusionModel;
pub use crate::core::context::ContextModel;
pub use crate::core::corrector::WordCorrector;
pub use crate::core::dictionary::Dictionary;
pub use crate::core::types::CorrectorConfig;
pub use crate::corpus::CorpusIndexer;
pub use crate::error::{Result, VirastError};
