//! Checkpoint persistence for crawl state
//!
//! Each crawler owns one JSON file, `<name>-crawler-state.json`, inside its
//! output directory. Every save rewrites the whole file: the content goes to
//! a sibling temporary file first and is then renamed over the checkpoint,
//! so a crash mid-write leaves the previous checkpoint intact.

use crate::state::{CrawlState, StateError};
use std::fs;
use std::path::{Path, PathBuf};

/// Suffix appended to the crawler name to form the checkpoint file name
const STATE_FILE_SUFFIX: &str = "crawler-state.json";

/// Durable checkpoint of a [`CrawlState`], scoped by crawler name
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    /// Creates a store for the named crawler under `dir`
    pub fn new(dir: impl AsRef<Path>, name: &str) -> Self {
        Self {
            path: dir.as_ref().join(state_file_name(name)),
        }
    }

    /// Path of the checkpoint file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true if a checkpoint is present on disk
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Overwrites the checkpoint with `state`
    ///
    /// Missing parent directories are created.
    pub fn save(&self, state: &CrawlState) -> Result<(), StateError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Round-trip through Value so object keys come out sorted
        let value = serde_json::to_value(state)?;
        let json = serde_json::to_string_pretty(&value)?;

        let tmp = self.tmp_path();
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;

        tracing::trace!(
            "Checkpoint saved: {} queued, {} visited",
            state.fringe.len(),
            state.visited.len()
        );
        Ok(())
    }

    /// Loads the checkpoint, or `None` if there is none
    pub fn restore(&self) -> Result<Option<CrawlState>, StateError> {
        if !self.path.is_file() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)?;
        let state = serde_json::from_str(&content).map_err(|e| StateError::Corrupt {
            path: self.path.clone(),
            source: e,
        })?;

        Ok(Some(state))
    }

    /// Removes the checkpoint so a later [`restore`](Self::restore) reports absence
    pub fn clear(&self) -> Result<(), StateError> {
        for path in [&self.path, &self.tmp_path()] {
            if path.is_file() {
                fs::remove_file(path)?;
            }
        }
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

/// Checkpoint file name for a crawler: `<name>-crawler-state.json`
pub fn state_file_name(name: &str) -> String {
    format!("{}-{}", name, STATE_FILE_SUFFIX)
}
