//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the HTTP client with an optional user agent string
//! - The fixed delay issued before every request
//! - GET requests returning status and raw body

use crate::config::UserAgentConfig;
use crate::CrawlError;
use reqwest::Client;
use std::time::Duration;

/// Upper bound on connection setup when a request timeout is set
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// A fetched HTTP response
///
/// Only the status and body matter to the engine; the final URL lets
/// extractors resolve relative links after redirects.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// Final URL after redirects
    pub url: String,
    /// HTTP status code
    pub status: u16,
    /// Raw response body
    pub body: Vec<u8>,
}

impl FetchResponse {
    /// Returns true for HTTP 200
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// Body decoded as UTF-8, replacing invalid sequences
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - Identification sent with every request, if any
/// * `timeout` - Whole-request timeout, `None` for no limit at all (connection
///   setup included)
///
/// # Example
///
/// ```no_run
/// use kennel_crawl::config::UserAgentConfig;
/// use kennel_crawl::crawler::build_http_client;
/// use std::time::Duration;
///
/// let config = UserAgentConfig {
///     crawler_name: "KennelCrawl".to_string(),
///     crawler_version: "0.1".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(Some(&config), Some(Duration::from_secs(30))).unwrap();
/// ```
pub fn build_http_client(
    user_agent: Option<&UserAgentConfig>,
    timeout: Option<Duration>,
) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder().gzip(true).brotli(true);

    if let Some(user_agent) = user_agent {
        builder = builder.user_agent(user_agent.header_value());
    }

    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }

    if let Some(connect_timeout) = connect_timeout(timeout) {
        builder = builder.connect_timeout(connect_timeout);
    }

    builder.build()
}

/// Connection setup limit derived from the request timeout
fn connect_timeout(timeout: Option<Duration>) -> Option<Duration> {
    timeout.map(|timeout| timeout.min(CONNECT_TIMEOUT))
}

/// Sequential HTTP fetcher with a fixed pre-request delay
///
/// The client is reused for every request of a run so connections are
/// kept alive between pages.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    delay: Duration,
}

impl Fetcher {
    /// Creates a fetcher around an existing client
    pub fn new(client: Client, delay: Duration) -> Self {
        Self { client, delay }
    }

    /// Builds a client and wraps it
    pub fn build(
        user_agent: Option<&UserAgentConfig>,
        timeout: Option<Duration>,
        delay: Duration,
    ) -> Result<Self, CrawlError> {
        Ok(Self::new(build_http_client(user_agent, timeout)?, delay))
    }

    /// Issues a GET request after sleeping the configured delay
    ///
    /// Any status code is a successful fetch; only transport failures
    /// (connection, DNS, timeout, body read) are errors.
    pub async fn get(&self, url: &str) -> Result<FetchResponse, CrawlError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        tracing::info!("{}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| http_error(url, e))?;
        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let body = response.bytes().await.map_err(|e| http_error(url, e))?;

        Ok(FetchResponse {
            url: final_url,
            status,
            body: body.to_vec(),
        })
    }
}

fn http_error(url: &str, source: reqwest::Error) -> CrawlError {
    CrawlError::Http {
        url: url.to_string(),
        source,
    }
}
