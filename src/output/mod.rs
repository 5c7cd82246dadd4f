//! Output module for crawl reporting
//!
//! This module handles:
//! - Counters collected while a crawl runs
//! - Status reports read back from a crawler's checkpoint and sink

pub mod stats;

pub use stats::{load_status, print_stats, print_status, CrawlStats, CrawlStatus, StatusError};
