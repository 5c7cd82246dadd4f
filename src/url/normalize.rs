use crate::UrlError;
use url::Url;

/// Normalizes a URL into its canonical visited-set key
///
/// The URL is parsed into its components and reassembled without the
/// fragment. Nothing else is rewritten: the path keeps its trailing slash
/// (or lack of one), query parameters keep their order, and the scheme is
/// left as given. The parser itself lowercases the scheme and host and
/// gives an empty HTTP path its root `/`.
///
/// # Arguments
///
/// * `url_str` - The URL string to normalize
///
/// # Returns
///
/// * `Ok(Url)` - Normalized URL
/// * `Err(UrlError)` - Failed to parse the URL or the scheme is not HTTP(S)
///
/// # Examples
///
/// ```
/// use kennel_crawl::url::normalize_url;
///
/// let url = normalize_url("http://www.fci.be/en/nomenclature/#top").unwrap();
/// assert_eq!(url.as_str(), "http://www.fci.be/en/nomenclature/");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    url.set_fragment(None);

    Ok(url)
}

/// Normalizes a URL and returns it as the string key stored in the visited set
pub fn normalize_key(url_str: &str) -> Result<String, UrlError> {
    normalize_url(url_str).map(String::from)
}
