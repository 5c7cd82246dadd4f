//! Storage module for harvested records
//!
//! This module holds the record types passed between extractor and sink,
//! the `Sink` trait, and a filesystem sink writing one JSON file per record.

mod json_dir;
mod traits;

pub use json_dir::JsonDirSink;
pub use traits::{Sink, SinkError, SinkResult};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Partial record discovered on a listing page
///
/// Carries the unique identifier and the detail-page URL, plus any fields
/// the listing already exposed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemStub {
    /// Unique reference identifier
    pub refid: String,

    /// Detail page URL
    pub url: String,

    /// Provisional fields from the listing page
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl ItemStub {
    /// Creates a stub with no provisional fields
    pub fn new(refid: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            refid: refid.into(),
            url: url.into(),
            fields: Map::new(),
        }
    }

    /// Sets a provisional field
    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    /// Promotes the stub to a record, keeping every field it carries
    pub fn into_record(self) -> Record {
        Record {
            refid: self.refid,
            url: self.url,
            fields: self.fields,
        }
    }
}

/// A complete harvested entity
///
/// `refid` and `url` are always present; everything else is site-defined
/// and forwarded untouched by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Unique reference identifier
    pub refid: String,

    /// Provenance URL
    pub url: String,

    /// Site-specific attributes
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Record {
    /// Sets a field, ignoring empty values
    pub fn set(&mut self, key: &str, value: Option<String>) {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            self.fields.insert(key.to_string(), Value::String(value));
        }
    }

    /// Returns a string field
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }
}
