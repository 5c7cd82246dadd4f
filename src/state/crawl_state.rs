/// Crawl state definitions: the frontier and visited set of one crawler
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};

/// The resumable state of a single named crawler
///
/// Serialized as the checkpoint object
/// `{"fringe": [...], "rootUrl": "...", "visited": [...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlState {
    /// URL the crawl started from
    #[serde(rename = "rootUrl")]
    pub root_url: String,

    /// URLs awaiting visitation, in discovery order; may hold duplicates
    pub fringe: VecDeque<String>,

    /// Normalized URLs already processed
    pub visited: BTreeSet<String>,
}

impl CrawlState {
    /// Creates a fresh state whose frontier holds only the root URL
    pub fn new(root_url: impl Into<String>) -> Self {
        let root_url = root_url.into();
        Self {
            fringe: VecDeque::from([root_url.clone()]),
            root_url,
            visited: BTreeSet::new(),
        }
    }

    /// Restarts from `root_url` with a single-entry frontier and nothing visited
    pub fn reset(&mut self, root_url: impl Into<String>) {
        self.root_url = root_url.into();
        self.fringe.clear();
        self.fringe.push_back(self.root_url.clone());
        self.visited.clear();
    }

    /// Next URL to visit, left in place
    pub fn peek_next(&self) -> Option<&str> {
        self.fringe.front().map(String::as_str)
    }

    /// Removes and returns the next URL to visit
    pub fn pop_next(&mut self) -> Option<String> {
        self.fringe.pop_front()
    }

    /// Appends discovered URLs to the back of the frontier, keeping their order
    pub fn enqueue<I>(&mut self, urls: I) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        let before = self.fringe.len();
        self.fringe.extend(urls);
        self.fringe.len() - before
    }

    /// Returns true if the normalized URL was already processed
    pub fn is_visited(&self, normalized: &str) -> bool {
        self.visited.contains(normalized)
    }

    /// Records a normalized URL as processed
    pub fn mark_visited(&mut self, normalized: String) {
        self.visited.insert(normalized);
    }

    /// Returns true if nothing is left to visit
    pub fn is_exhausted(&self) -> bool {
        self.fringe.is_empty()
    }
}
