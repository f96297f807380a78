//! Saved user metadata.
//!
//! Users who stamp the same author/copyright on every batch can save it once
//! and reuse it with `--saved-metadata`. The record is stored as pretty JSON
//! at `<config dir>/towebp/metadata.json` (e.g. `~/.config/towebp/` on Linux).
//! A missing file means "nothing saved" and loads as `Ok(None)`.

use crate::metadata::ImageMetadata;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Stored metadata is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Could not determine the user config directory")]
    NoConfigDir,
}

#[derive(Debug, Clone)]
pub struct MetadataStore {
    path: PathBuf,
}

impl MetadataStore {
    /// Store in the per-user config directory.
    pub fn open_default() -> Result<Self, StoreError> {
        let mut path = dirs::config_dir()
            .or_else(dirs::home_dir)
            .ok_or(StoreError::NoConfigDir)?;
        path.push("towebp");
        path.push("metadata.json");
        Ok(Self { path })
    }

    /// Store at an explicit file path.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Option<ImageMetadata>, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, metadata: &ImageMetadata) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(metadata)?;
        std::fs::write(&self.path, json)?;
        tracing::debug!(path = %self.path.display(), "saved metadata");
        Ok(())
    }

    /// Delete the saved record. Clearing an empty store is not an error.
    pub fn clear(&self) -> Result<(), StoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
