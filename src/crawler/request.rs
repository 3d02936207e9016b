//! Caller-facing request shape and its resolution against scheduler defaults

use crate::crawler::transport::parse_header;
use crate::CourierError;
use reqwest::header::HeaderMap;
use std::collections::BTreeMap;

/// A fetch request submitted to the scheduler
///
/// # Example
///
/// ```
/// use sumi_courier::FetchRequest;
///
/// let request = FetchRequest::new("https://example.com/")
///     .header("Referer", "https://example.com/start")
///     .with_document();
/// assert!(request.want_document);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchRequest {
    /// URL to fetch (required)
    pub url: String,

    /// Headers merged over the scheduler's default headers
    pub headers: BTreeMap<String, String>,

    /// Whether the response should be parsed into an HTML document
    pub want_document: bool,
}

impl FetchRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Adds or replaces a request header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Requests a parsed document alongside the body
    pub fn with_document(mut self) -> Self {
        self.want_document = true;
        self
    }
}

impl From<&str> for FetchRequest {
    fn from(url: &str) -> Self {
        Self::new(url)
    }
}

impl From<String> for FetchRequest {
    fn from(url: String) -> Self {
        Self::new(url)
    }
}

/// A request after validation and header merging
#[derive(Debug, Clone)]
pub(crate) struct RequestOptions {
    pub url: String,
    pub headers: HeaderMap,
    pub want_document: bool,
}

impl RequestOptions {
    /// Validates `request` and merges its headers over `defaults`
    ///
    /// Runs synchronously so that parameter errors are reported before the
    /// request reaches the cache or the queue.
    pub fn resolve(request: FetchRequest, defaults: &HeaderMap) -> Result<Self, CourierError> {
        let url = request.url.trim();
        if url.is_empty() {
            return Err(CourierError::MissingUrl);
        }

        let mut headers = defaults.clone();
        for (name, value) in &request.headers {
            let (name_value, header_value) =
                parse_header(name, value).map_err(|message| CourierError::InvalidHeader {
                    name: name.clone(),
                    message,
                })?;
            headers.insert(name_value, header_value);
        }

        Ok(Self {
            url: url.to_string(),
            headers,
            want_document: request.want_document,
        })
    }
}

/// Builds the default header map from name/value pairs
pub(crate) fn header_map<'a>(
    pairs: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> Result<HeaderMap, CourierError> {
    let mut headers = HeaderMap::new();
    for (name, value) in pairs {
        let (name_value, header_value) =
            parse_header(name, value).map_err(|message| CourierError::InvalidHeader {
                name: name.to_string(),
                message,
            })?;
        headers.insert(name_value, header_value);
    }
    Ok(headers)
}
