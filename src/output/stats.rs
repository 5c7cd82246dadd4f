//! Crawl statistics
//!
//! Counters collected during a run, and a status report built from the
//! checkpoint and sink of a crawler that is not running.

use crate::state::{StateError, StateStore};
use crate::storage::{JsonDirSink, SinkError};
use std::time::Duration;
use thiserror::Error;

/// Counters for one call to `Crawler::run`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStats {
    /// Frontier URLs fetched and marked visited
    pub pages_visited: u64,

    /// Visited pages that answered with a non-200 status
    pub pages_failed: u64,

    /// Frontier entries discarded because they were already visited
    pub duplicates_skipped: u64,

    /// Frontier entries discarded because they were not valid URLs
    pub urls_dropped: u64,

    /// Links appended to the frontier
    pub links_discovered: usize,

    /// Item stubs reported by listing pages
    pub items_discovered: usize,

    /// Stubs skipped because the sink already held them
    pub items_existing: u64,

    /// Stubs whose detail page answered with a non-200 status
    pub items_failed: u64,

    /// Records handed to the sink
    pub records_stored: u64,

    /// HTTP requests issued
    pub fetches: u64,

    /// Wall time of the run
    pub elapsed: Duration,
}

/// Errors that can occur while building a status report
#[derive(Debug, Error)]
pub enum StatusError {
    #[error("Checkpoint error: {0}")]
    State(#[from] StateError),

    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),
}

/// Snapshot of a crawler's persisted progress
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlStatus {
    /// Checkpoint file path
    pub checkpoint: String,

    /// Root URL from the checkpoint, if one exists
    pub root_url: Option<String>,

    /// URLs still queued
    pub queued: usize,

    /// URLs already visited
    pub visited: usize,

    /// Records present in the sink
    pub records: usize,
}

impl CrawlStatus {
    /// Returns true if a checkpoint exists and its frontier is empty
    pub fn is_complete(&self) -> bool {
        self.root_url.is_some() && self.queued == 0
    }
}

/// Loads a status report from a checkpoint store and a record sink
pub fn load_status(store: &StateStore, sink: &JsonDirSink) -> Result<CrawlStatus, StatusError> {
    let state = store.restore()?;
    let records = sink.count()?;

    Ok(CrawlStatus {
        checkpoint: store.path().display().to_string(),
        root_url: state.as_ref().map(|s| s.root_url.clone()),
        queued: state.as_ref().map_or(0, |s| s.fringe.len()),
        visited: state.as_ref().map_or(0, |s| s.visited.len()),
        records,
    })
}

/// Prints a status report to stdout
pub fn print_status(status: &CrawlStatus) {
    println!("=== Crawl Status ===\n");

    println!("Checkpoint: {}", status.checkpoint);
    match &status.root_url {
        Some(root) => {
            println!("  Root URL: {}", root);
            println!("  Queued: {}", status.queued);
            println!("  Visited: {}", status.visited);
        }
        None => println!("  (no checkpoint)"),
    }
    println!();

    println!("Records stored: {}", status.records);

    if status.is_complete() {
        println!("\nCrawl is complete; run with --reset to start over");
    }
}

/// Prints run counters to stdout
pub fn print_stats(stats: &CrawlStats) {
    println!("=== Crawl Statistics ===\n");

    println!("Pages:");
    println!("  Visited: {}", stats.pages_visited);
    println!("  Non-200: {}", stats.pages_failed);
    println!("  Duplicates skipped: {}", stats.duplicates_skipped);
    if stats.urls_dropped > 0 {
        println!("  Invalid URLs dropped: {}", stats.urls_dropped);
    }
    println!("  Links discovered: {}", stats.links_discovered);
    println!();

    println!("Items:");
    println!("  Discovered: {}", stats.items_discovered);
    println!("  Already stored: {}", stats.items_existing);
    println!("  Detail page non-200: {}", stats.items_failed);
    println!("  Stored: {}", stats.records_stored);
    println!();

    let secs = stats.elapsed.as_secs_f64();
    let rate = if secs > 0.0 {
        stats.fetches as f64 / secs
    } else {
        0.0
    };
    println!(
        "Fetches: {} in {:.1}s ({:.2} req/sec)",
        stats.fetches, secs, rate
    );
}
