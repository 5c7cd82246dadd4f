//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlState`: the root URL, frontier queue and visited set of one crawler
//! - `StateStore`: the on-disk checkpoint of a `CrawlState`

mod crawl_state;
mod store;

use std::path::PathBuf;
use thiserror::Error;

// Re-export main types
pub use crawl_state::CrawlState;
pub use store::{state_file_name, StateStore};

/// Errors that can occur while saving or restoring a checkpoint
#[derive(Debug, Error)]
pub enum StateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Corrupt checkpoint {path}: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
}
