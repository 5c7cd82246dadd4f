//! Sink trait and error types
//!
//! This module defines the interface site-specific record stores implement
//! so the engine can skip already-harvested items and persist new ones.

use crate::storage::{ItemStub, Record};
use thiserror::Error;

/// Errors that can occur during sink operations
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid record identifier: {0:?}")]
    InvalidIdentity(String),
}

/// Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

/// Persistence layer for completed records
///
/// A record is written at most once per identifier: the engine consults
/// [`exists`](Sink::exists) before fetching a stub's detail page and only
/// calls [`store`](Sink::store) when it returned `false`.
pub trait Sink {
    /// Returns true if a record with the stub's identifier is already stored
    fn exists(&self, stub: &ItemStub) -> SinkResult<bool>;

    /// Persists a completed record
    fn store(&mut self, record: &Record) -> SinkResult<()>;

    /// Deletes every record this sink has written
    fn purge_all(&mut self) -> SinkResult<()>;
}
