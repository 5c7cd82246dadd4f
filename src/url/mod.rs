//! URL handling module for Kennel-Crawl
//!
//! Normalization is a pure function with no process-wide state; the engine
//! uses it to derive visited-set keys.

mod normalize;

pub use normalize::{normalize_key, normalize_url};
