//! Site-specific extractors
//!
//! Each site pairs an [`Extractor`](crate::extract::Extractor) with a
//! [`Sink`](crate::storage::Sink); the pair is chosen from configuration
//! when the crawler is built.

pub mod fci;

pub use fci::{FciExtractor, FciPage, FCI_ROOT_URL};
