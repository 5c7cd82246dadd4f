//! Link resolution helpers shared by site extractors

use scraper::{Html, Selector};
use url::Url;

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - fragment-only links
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
pub fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    // Same page anchors
    if href.starts_with('#') {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) => {
            if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
                Some(absolute_url.to_string())
            } else {
                None
            }
        }
        Err(_) => None,
    }
}

/// Collects the resolved `attr` values of every element matching `selector`
///
/// Document order is preserved; unresolvable values are dropped.
pub fn collect_links(
    document: &Html,
    selector: &Selector,
    attr: &str,
    base_url: &Url,
) -> Vec<String> {
    document
        .select(selector)
        .filter_map(|element| element.value().attr(attr))
        .filter_map(|href| resolve_link(href, base_url))
        .collect()
}
