//! Crawl engine - breadth-first crawl with per-page checkpoints
//!
//! The engine owns the crawl state and drives fetcher, extractor and sink:
//! - Pops the next URL from the frontier and skips it if already visited
//! - Fetches it; non-200 answers are logged and contribute nothing
//! - Harvests every item stub the sink does not already hold
//! - Removes the URL from the frontier, enqueues its links at the back,
//!   marks it visited and rewrites the checkpoint, all in one step
//!
//! A process killed at any point resumes from the last checkpoint without
//! revisiting anything marked visited. A run that fails leaves the
//! in-memory state equal to the checkpoint, so calling `run` again retries
//! the failed URL.

use crate::config::{Config, UserAgentConfig};
use crate::crawler::fetcher::{FetchResponse, Fetcher};
use crate::extract::{ExtractError, Extractor};
use crate::output::CrawlStats;
use crate::state::{CrawlState, StateStore};
use crate::storage::{ItemStub, Sink};
use crate::url::normalize_key;
use crate::CrawlError;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Engine configuration surface
#[derive(Debug, Clone)]
pub struct CrawlerSettings {
    /// Crawler name; scopes the checkpoint file
    pub name: String,
    /// Directory the checkpoint is written to
    pub output_dir: PathBuf,
    /// URL the crawl starts from
    pub root_url: String,
    /// Fixed delay before every request
    pub delay: Duration,
    /// Identification header, if any
    pub user_agent: Option<UserAgentConfig>,
    /// Request timeout, `None` for no limit
    pub timeout: Option<Duration>,
}

impl CrawlerSettings {
    /// Builds engine settings from a loaded configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            name: config.crawler.name.clone(),
            output_dir: config.output_dir(),
            root_url: config.crawler.root_url().to_string(),
            delay: Duration::from_millis(config.crawler.delay_ms),
            user_agent: config.user_agent.clone(),
            timeout: config.timeout(),
        }
    }
}

/// Resumable breadth-first crawler
///
/// Generic over the site's [`Extractor`] and [`Sink`], both chosen when the
/// crawler is constructed.
pub struct Crawler<E, S> {
    name: String,
    root_url: String,
    fetcher: Fetcher,
    extractor: E,
    sink: S,
    store: StateStore,
    state: CrawlState,
}

impl<E, S> Crawler<E, S>
where
    E: Extractor,
    S: Sink,
{
    /// Creates a crawler, resuming from its checkpoint when one exists
    ///
    /// # Returns
    ///
    /// * `Ok(Crawler)` - Ready to run
    /// * `Err(CrawlError)` - HTTP client could not be built or the checkpoint is unreadable
    pub fn new(settings: CrawlerSettings, extractor: E, sink: S) -> Result<Self, CrawlError> {
        let fetcher = Fetcher::build(
            settings.user_agent.as_ref(),
            settings.timeout,
            settings.delay,
        )?;
        Self::with_fetcher(settings, fetcher, extractor, sink)
    }

    /// Creates a crawler around an already configured fetcher
    pub fn with_fetcher(
        settings: CrawlerSettings,
        fetcher: Fetcher,
        extractor: E,
        sink: S,
    ) -> Result<Self, CrawlError> {
        let store = StateStore::new(&settings.output_dir, &settings.name);

        let state = match store.restore()? {
            Some(state) => {
                if state.root_url != settings.root_url {
                    tracing::warn!(
                        "Checkpoint root {} differs from configured root {}; keeping checkpoint until reset",
                        state.root_url,
                        settings.root_url
                    );
                }
                tracing::info!(
                    "Resuming {} from {}: {} queued, {} visited",
                    settings.name,
                    store.path().display(),
                    state.fringe.len(),
                    state.visited.len()
                );
                state
            }
            None => {
                tracing::info!(
                    "No checkpoint for {}, starting at {}",
                    settings.name,
                    settings.root_url
                );
                CrawlState::new(settings.root_url.clone())
            }
        };

        Ok(Self {
            name: settings.name,
            root_url: settings.root_url,
            fetcher,
            extractor,
            sink,
            store,
            state,
        })
    }

    /// Current crawl state
    pub fn state(&self) -> &CrawlState {
        &self.state
    }

    /// Checkpoint store
    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Record sink
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Runs the crawl until the frontier is empty
    ///
    /// Transport, extraction, sink and checkpoint failures abort the run.
    /// The failing URL stays at the front of the frontier, both in memory
    /// and in the checkpoint, and links found on it are not enqueued.
    pub async fn run(&mut self) -> Result<CrawlStats, CrawlError> {
        tracing::info!("Starting crawl {}", self.name);

        let mut stats = CrawlStats::default();
        let start_time = Instant::now();

        while let Some(next) = self.state.peek_next().map(String::from) {
            let url = match normalize_key(&next) {
                Ok(url) => url,
                Err(e) => {
                    tracing::warn!("Dropping frontier entry {}: {}", next, e);
                    stats.urls_dropped += 1;
                    self.state.pop_next();
                    continue;
                }
            };

            if self.state.is_visited(&url) {
                tracing::debug!("Already visited {}", url);
                stats.duplicates_skipped += 1;
                self.state.pop_next();
                continue;
            }

            let links = self.visit(&url, &mut stats).await?;
            stats.links_discovered += self.commit(url, links)?;
            stats.pages_visited += 1;
        }

        stats.elapsed = start_time.elapsed();
        tracing::info!(
            "Crawl {} completed: {} pages visited, {} records stored, {} fetches in {:?}",
            self.name,
            stats.pages_visited,
            stats.records_stored,
            stats.fetches,
            stats.elapsed
        );

        Ok(stats)
    }

    /// Starts over from the configured root: clears the checkpoint, the
    /// in-memory state and the sink
    ///
    /// A checkpoint kept across a root change is discarded here. Not atomic:
    /// the checkpoint is removed first and the sink purged second; if purging
    /// fails the crawl restarts from the root and records that survived are
    /// simply reported as existing.
    pub fn reset(&mut self) -> Result<(), CrawlError> {
        self.store.clear()?;
        self.state.reset(self.root_url.clone());
        self.sink.purge_all()?;

        tracing::info!("Reset crawl {} to {}", self.name, self.state.root_url);
        Ok(())
    }

    /// Moves the processed front entry to the visited set and checkpoints
    ///
    /// The new state is saved before it replaces the in-memory one, so a
    /// failed save leaves both unchanged. Returns the number of links added.
    fn commit(&mut self, url: String, links: Vec<String>) -> Result<usize, CrawlError> {
        let mut next = self.state.clone();
        next.pop_next();
        let added = next.enqueue(links);
        next.mark_visited(url);

        self.store.save(&next)?;
        self.state = next;
        Ok(added)
    }

    /// Processes one listing page and returns the links it discovered
    async fn visit(
        &mut self,
        url: &str,
        stats: &mut CrawlStats,
    ) -> Result<Vec<String>, CrawlError> {
        let response = self.fetcher.get(url).await?;
        stats.fetches += 1;

        if !response.is_ok() {
            tracing::warn!("{} {}", response.status, url);
            stats.pages_failed += 1;
            return Ok(Vec::new());
        }

        let (links, items) = {
            let page = self.decode(&response)?;
            let links = self
                .extractor
                .discover_links(&page)
                .map_err(|e| extract_error(url, e))?;
            let items = self
                .extractor
                .discover_items(&page)
                .map_err(|e| extract_error(url, e))?;
            (links, items)
        };

        stats.items_discovered += items.len();

        for stub in items {
            if self.sink.exists(&stub)? {
                tracing::debug!("Item {} already stored", stub.refid);
                stats.items_existing += 1;
                continue;
            }
            self.harvest(stub, stats).await?;
        }

        Ok(links)
    }

    /// Fetches a stub's detail page, completes it and stores the record
    async fn harvest(&mut self, stub: ItemStub, stats: &mut CrawlStats) -> Result<(), CrawlError> {
        let response = self.fetcher.get(&stub.url).await?;
        stats.fetches += 1;

        if !response.is_ok() {
            tracing::warn!("{} {} (item {})", response.status, stub.url, stub.refid);
            stats.items_failed += 1;
            return Ok(());
        }

        let record = {
            let page = self.decode(&response)?;
            self.extractor
                .complete_item(stub, &page)
                .map_err(|e| extract_error(&response.url, e))?
        };

        self.sink.store(&record)?;
        stats.records_stored += 1;
        Ok(())
    }

    fn decode(&self, response: &FetchResponse) -> Result<E::Page, CrawlError> {
        self.extractor
            .decode(response)
            .map_err(|e| extract_error(&response.url, e))
    }
}

fn extract_error(url: &str, source: ExtractError) -> CrawlError {
    CrawlError::Extract {
        url: url.to_string(),
        source,
    }
}
