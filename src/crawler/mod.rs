//! Crawler module for page fetching and crawl orchestration
//!
//! This module contains the core crawling logic:
//! - HTTP fetching with a fixed inter-request delay
//! - The breadth-first engine with checkpoint-per-page resumability

mod engine;
mod fetcher;

pub use engine::{Crawler, CrawlerSettings};
pub use fetcher::{build_http_client, FetchResponse, Fetcher};
