//! Content extraction interface
//!
//! An [`Extractor`] turns fetched responses into an opaque page value and
//! reports the links and item stubs it finds there. Each target site
//! supplies its own implementation; the engine is generic over it.

mod links;

pub use links::{collect_links, resolve_link};

use crate::crawler::FetchResponse;
use crate::storage::{ItemStub, Record};
use thiserror::Error;

/// Errors raised while decoding or extracting a page
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Malformed page: {0}")]
    Malformed(String),

    #[error("Missing field '{field}' for item {refid}")]
    MissingField { refid: String, field: String },

    #[error("Invalid selector '{0}'")]
    Selector(String),

    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),
}

/// Site-specific page extraction
///
/// The engine calls [`decode`](Extractor::decode) once per successful fetch
/// and passes the resulting page back into the other methods without
/// looking inside it.
pub trait Extractor {
    /// Extractor-defined representation of a fetched document
    type Page;

    /// Converts a raw response into a page
    fn decode(&self, response: &FetchResponse) -> Result<Self::Page, ExtractError>;

    /// Links to enqueue, in discovery order
    fn discover_links(&self, page: &Self::Page) -> Result<Vec<String>, ExtractError>;

    /// Item stubs listed on the page
    fn discover_items(&self, page: &Self::Page) -> Result<Vec<ItemStub>, ExtractError>;

    /// Completes a stub into a full record using its detail page
    fn complete_item(&self, stub: ItemStub, detail: &Self::Page) -> Result<Record, ExtractError>;
}
