//! Filesystem sink writing one JSON document per record
//!
//! Layout: `<root>/dump/<refid>/entry.json`.

use crate::storage::traits::{Sink, SinkError, SinkResult};
use crate::storage::{ItemStub, Record};
use std::fs;
use std::path::{Path, PathBuf};

const DUMP_DIR: &str = "dump";
const ENTRY_FILE: &str = "entry.json";

/// Sink storing records as pretty-printed JSON files keyed by identifier
#[derive(Debug, Clone)]
pub struct JsonDirSink {
    root: PathBuf,
}

impl JsonDirSink {
    /// Creates a sink rooted at the crawler's output directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding one subdirectory per record
    pub fn dump_dir(&self) -> PathBuf {
        self.root.join(DUMP_DIR)
    }

    /// Path of the record file for an identifier
    pub fn entry_path(&self, refid: &str) -> SinkResult<PathBuf> {
        validate_refid(refid)?;
        Ok(self.dump_dir().join(refid).join(ENTRY_FILE))
    }

    /// Reads a stored record back
    pub fn load(&self, refid: &str) -> SinkResult<Option<Record>> {
        let path = self.entry_path(refid)?;
        if !path.is_file() {
            return Ok(None);
        }
        let content = fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Number of records currently stored
    pub fn count(&self) -> SinkResult<usize> {
        Ok(self.entry_files()?.len())
    }

    fn entry_files(&self) -> SinkResult<Vec<PathBuf>> {
        let dump_dir = self.dump_dir();
        if !dump_dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in fs::read_dir(&dump_dir)? {
            let path = entry?.path().join(ENTRY_FILE);
            if path.is_file() {
                files.push(path);
            }
        }
        Ok(files)
    }
}

impl Sink for JsonDirSink {
    fn exists(&self, stub: &ItemStub) -> SinkResult<bool> {
        Ok(self.entry_path(&stub.refid)?.is_file())
    }

    fn store(&mut self, record: &Record) -> SinkResult<()> {
        let path = self.entry_path(&record.refid)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Round-trip through Value so object keys come out sorted
        let value = serde_json::to_value(record)?;
        fs::write(&path, serde_json::to_string_pretty(&value)?)?;

        tracing::debug!("Stored record {} at {}", record.refid, path.display());
        Ok(())
    }

    fn purge_all(&mut self) -> SinkResult<()> {
        let files = self.entry_files()?;
        for path in &files {
            fs::remove_file(path)?;
            if let Some(dir) = path.parent() {
                remove_dir_if_empty(dir);
            }
        }
        tracing::info!("Purged {} records from {}", files.len(), self.root.display());
        Ok(())
    }
}

/// Identifiers become directory names; reject anything that could escape `dump/`
fn validate_refid(refid: &str) -> SinkResult<()> {
    let valid = !refid.is_empty()
        && refid != "."
        && refid != ".."
        && !refid.contains(['/', '\\'])
        && !refid.chars().any(char::is_control);

    if valid {
        Ok(())
    } else {
        Err(SinkError::InvalidIdentity(refid.to_string()))
    }
}

fn remove_dir_if_empty(dir: &Path) {
    // Fails when other files live next to entry.json; those are left alone
    let _ = fs::remove_dir(dir);
}
