//! Configuration module for Kennel-Crawl
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use kennel_crawl::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("fci.toml")).unwrap();
//! println!("Checkpoints go to: {}", config.output_dir().display());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, OutputConfig, Site, UserAgentConfig, DEFAULT_TIMEOUT_SECS};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
