use crate::sites::FCI_ROOT_URL;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Default HTTP timeout when `timeout-secs` is not set
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Main configuration structure for Kennel-Crawl
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: Option<UserAgentConfig>,
    pub output: OutputConfig,
}

/// Which site-specific extractor/sink pair to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Site {
    /// FCI breed nomenclature
    Fci,
}

impl Site {
    /// Entry point used when `root-url` is not configured
    pub fn default_root_url(self) -> &'static str {
        match self {
            Site::Fci => FCI_ROOT_URL,
        }
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Crawler name; scopes the checkpoint file and output directory
    pub name: String,

    /// Site plugin to use
    #[serde(default = "default_site")]
    pub site: Site,

    /// Root URL the frontier starts from; defaults to the site's entry point
    #[serde(rename = "root-url", default)]
    pub root_url: Option<String>,

    /// Fixed delay before every request (milliseconds)
    #[serde(rename = "delay-ms", default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Request timeout in seconds, 0 disables it
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the identification header: `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Base data directory; each crawler writes under `<data-dir>/<name>`
    #[serde(rename = "data-dir")]
    pub data_dir: String,
}

impl CrawlerConfig {
    /// Configured root URL, or the site's entry point
    pub fn root_url(&self) -> &str {
        self.root_url
            .as_deref()
            .unwrap_or_else(|| self.site.default_root_url())
    }
}

impl Config {
    /// Directory holding this crawler's checkpoint and records
    pub fn output_dir(&self) -> PathBuf {
        PathBuf::from(&self.output.data_dir).join(&self.crawler.name)
    }

    /// Request timeout, `None` when disabled
    pub fn timeout(&self) -> Option<Duration> {
        match self.crawler.timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

fn default_site() -> Site {
    Site::Fci
}

fn default_delay_ms() -> u64 {
    10
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}
