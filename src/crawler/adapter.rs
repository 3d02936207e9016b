//! Response adapter: turns a raw page into the caller-facing result

use crate::crawler::parser::{extract_title, DocumentParser};
use crate::CourierError;
use bytes::Bytes;
use scraper::Html;

/// A page ready for delivery, either fetched or read from the cache
#[derive(Debug, Clone)]
pub(crate) struct RawPage {
    pub content_type: String,
    pub body: Bytes,
    pub from_cache: bool,
}

/// Result of a successful fetch
#[derive(Debug)]
pub struct FetchResponse {
    /// The requested URL
    pub url: String,

    /// Content-Type of the response (empty when the server sent none)
    pub content_type: String,

    /// Response body as text
    pub body: String,

    /// Parsed document, present only when requested
    pub document: Option<Html>,

    /// Whether the response was served from the cache
    pub from_cache: bool,
}

impl FetchResponse {
    /// Page title, when a document was parsed and has one
    pub fn title(&self) -> Option<String> {
        self.document.as_ref().and_then(extract_title)
    }
}

/// Converts a raw page into a [`FetchResponse`]
///
/// When a document is requested and parsing fails, the error carries the
/// page text so callers can still use it.
pub(crate) fn adapt(
    parser: &dyn DocumentParser,
    url: &str,
    want_document: bool,
    page: RawPage,
) -> Result<FetchResponse, CourierError> {
    let body = String::from_utf8_lossy(&page.body).into_owned();

    let document = if want_document {
        match parser.parse(&body) {
            Ok(document) => Some(document),
            Err(message) => {
                tracing::debug!("Failed to parse document for {}: {}", url, message);
                return Err(CourierError::HtmlParse {
                    url: url.to_string(),
                    message,
                    body,
                });
            }
        }
    } else {
        None
    };

    Ok(FetchResponse {
        url: url.to_string(),
        content_type: page.content_type,
        body,
        document,
        from_cache: page.from_cache,
    })
}
