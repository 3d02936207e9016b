use crate::UrlError;
use url::Url;

/// Normalizes a URL for use as a cache identity
///
/// # Normalization Steps
///
/// 1. Trim surrounding whitespace and parse; reject if malformed
/// 2. Accept only `http` and `https` schemes
/// 3. Require a host (the parser lowercases it)
/// 4. Remove dot segments; an empty path becomes `/` (done by the parser)
/// 5. Remove fragment (everything after #)
///
/// Scheme, `www.` prefixes and query order are preserved: two URLs that a
/// server may answer differently never share a cache entry.
///
/// # Examples
///
/// ```
/// use sumi_courier::url::normalize_url;
///
/// let url = normalize_url("http://EXAMPLE.com/a/../b#top").unwrap();
/// assert_eq!(url.as_str(), "http://example.com/b");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    url.set_fragment(None);

    Ok(url)
}

/// Returns the string a request URL is cached under
///
/// Falls back to the trimmed input when it cannot be normalized, so that
/// unparsable URLs still map to a stable key (the fetch itself will fail).
pub fn cache_identity(url_str: &str) -> String {
    match normalize_url(url_str) {
        Ok(url) => url.to_string(),
        Err(e) => {
            tracing::trace!("Using raw cache identity for {}: {}", url_str, e);
            url_str.trim().to_string()
        }
    }
}

/// Resolves a redirect `Location` header against the URL that returned it
///
/// Absolute locations are returned as-is; relative ones are joined onto
/// `base`. If `base` itself is not a valid URL, the location is returned
/// unchanged and the transport gets to reject it.
pub fn resolve_location(base: &str, location: &str) -> String {
    match Url::parse(base).and_then(|b| b.join(location)) {
        Ok(resolved) => resolved.to_string(),
        Err(_) => location.to_string(),
    }
}
