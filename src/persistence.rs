//! Snapshot persistence for the context model.
//!
//! One immutable bincode snapshot holds all counts and totals. Writes go
//! through a temporary file in the target directory and are persisted
//! atomically, so a crash mid-write never leaves a truncated model behind.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::{info, warn};

use crate::core::context::ContextModel;
use crate::error::{Result, VirastError};

pub fn save_model(model: &ContextModel, path: &Path) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let temp_file = NamedTempFile::new_in(parent)?;
    let writer = BufWriter::new(&temp_file);
    bincode::serialize_into(writer, model)?;
    temp_file.persist(path).map_err(|err| VirastError::Io(err.error))?;
    Ok(())
}

pub fn load_model(path: &Path) -> Result<ContextModel> {
    if !path.is_file() {
        return Err(VirastError::ResourceMissing { path: path.to_path_buf() });
    }
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let model: ContextModel = bincode::deserialize_from(reader)?;
    info!(
        bigrams = model.total_bigrams(),
        trigrams = model.total_trigrams(),
        path = %path.display(),
        "loaded context model"
    );
    Ok(model)
}

/// Loads a snapshot if one is present and readable; otherwise logs the
/// failure and returns the empty model, which scores every context
/// neutrally.
pub fn load_model_or_default(path: &Path) -> ContextModel {
    match load_model(path) {
        Ok(model) => model,
        Err(err) => {
            warn!(%err, "context model unavailable, scoring will be neutral");
            ContextModel::default()
        }
    }
}
