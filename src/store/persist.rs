//! Store file round-tripping.
//!
//! The on-disk format mirrors the embeddings JSON the demo app ships:
//! threshold, text prefix, and one record per prompt with its precomputed
//! vector, so the engine can run load-only on machines without the
//! embedding runtime.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ClipwatchError, Result};
use crate::store::{Prompt, StoreSnapshot};

#[derive(Debug, Serialize, Deserialize)]
struct StoreFile {
    threshold: f32,
    text_prefix: String,
    #[serde(default)]
    prompts: Vec<Prompt>,
}

impl From<&StoreSnapshot> for StoreFile {
    fn from(snapshot: &StoreSnapshot) -> Self {
        Self {
            threshold: snapshot.threshold,
            text_prefix: snapshot.text_prefix.clone(),
            prompts: snapshot.prompts.clone(),
        }
    }
}

impl From<StoreFile> for StoreSnapshot {
    fn from(file: StoreFile) -> Self {
        Self {
            prompts: file.prompts,
            threshold: file.threshold.clamp(0.0, 1.0),
            text_prefix: file.text_prefix,
        }
    }
}

/// Serialize the snapshot to `path`. I/O and encoding failures surface.
pub fn write_store(path: &Path, snapshot: &StoreSnapshot) -> Result<()> {
    let json = serde_json::to_string_pretty(&StoreFile::from(snapshot))?;
    fs::write(path, json)?;
    Ok(())
}

/// Read a snapshot from `path`.
///
/// Returns `Ok(Some(empty))` for a missing file, after seeding it with a
/// default store so a later load finds something well-formed. Returns
/// `Ok(None)` for malformed content, which callers treat as "nothing to
/// load". Only a real read failure on an existing file is an error.
pub fn read_store(path: &Path) -> Result<Option<StoreSnapshot>> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            if let Err(e) = write_store(path, &StoreSnapshot::default()) {
                warn!("could not seed default store at {}: {}", path.display(), e);
            }
            return Ok(Some(StoreSnapshot::default()));
        }
        Err(e) => {
            return Err(ClipwatchError::Persistence(format!(
                "cannot read {}: {}",
                path.display(),
                e
            )))
        }
    };

    match serde_json::from_str::<StoreFile>(&raw) {
        Ok(file) => Ok(Some(file.into())),
        Err(e) => {
            warn!("malformed store file {}: {}", path.display(), e);
            Ok(None)
        }
    }
}
