//! Kennel-Crawl: a resumable breed-nomenclature harvester
//!
//! This crate implements a breadth-first crawler that walks a paginated site,
//! checkpoints its frontier after every page, and hands discovered records to
//! a site-specific sink that skips anything already harvested.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod output;
pub mod sites;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Kennel-Crawl operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("Extraction error for {url}: {source}")]
    Extract {
        url: String,
        source: extract::ExtractError,
    },

    #[error("Checkpoint error: {0}")]
    State(#[from] state::StateError),

    #[error("Sink error: {0}")]
    Sink(#[from] storage::SinkError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),
}

/// Result type alias for Kennel-Crawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Crawler, CrawlerSettings, Fetcher};
pub use extract::Extractor;
pub use state::{CrawlState, StateStore};
pub use storage::{ItemStub, JsonDirSink, Record, Sink};
pub use crate::url::normalize_url;
