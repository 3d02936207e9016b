//! HTTP transport
//!
//! The scheduler never talks to the network directly: it goes through the
//! [`Transport`] trait, which performs exactly one request per call and never
//! follows redirects on its own. [`ReqwestTransport`] is the production
//! implementation.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, LOCATION};
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use thiserror::Error;

/// Errors raised by a single transport call
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Request timeout")]
    Timeout,

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Failed to read response body: {0}")]
    Body(String),

    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_connect() {
            Self::Connect(e.to_string())
        } else if e.is_body() || e.is_decode() {
            Self::Body(e.to_string())
        } else {
            Self::Other(e.to_string())
        }
    }
}

/// Raw response of one transport call
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// HTTP status code
    pub status: u16,

    /// Response headers
    pub headers: HeaderMap,

    /// Redirect target, present only on redirect responses
    pub location: Option<String>,

    /// Response body
    pub body: Bytes,
}

/// Reads the Content-Type header, defaulting to an empty string
pub fn content_type_of(headers: &HeaderMap) -> &str {
    headers
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

/// A single-request HTTP transport
#[async_trait]
pub trait Transport: Send + Sync {
    /// Performs one request without following redirects
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to request
    /// * `headers` - Headers to send
    /// * `timeout` - Upper bound for the whole exchange
    async fn fetch(
        &self,
        url: &str,
        headers: &HeaderMap,
        timeout: Duration,
    ) -> Result<TransportResponse, TransportError>;
}

/// Builds the HTTP client used by [`ReqwestTransport`]
///
/// Redirects are disabled: the fetcher follows them itself so that it can
/// count hops. Identification headers (User-Agent and friends) come from
/// the per-request header map rather than the client.
pub fn build_http_client() -> Result<Client, reqwest::Error> {
    Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::none())
        .gzip(true)
        .brotli(true)
        .build()
}

/// Transport backed by a `reqwest::Client`
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Creates a transport with a freshly built client
    pub fn new() -> Result<Self, reqwest::Error> {
        Ok(Self::with_client(build_http_client()?))
    }

    /// Wraps an existing client
    ///
    /// The client should be configured with `Policy::none()`; otherwise
    /// reqwest follows redirects itself and the hop limit is not enforced.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn fetch(
        &self,
        url: &str,
        headers: &HeaderMap,
        timeout: Duration,
    ) -> Result<TransportResponse, TransportError> {
        let response = self
            .client
            .get(url)
            .headers(headers.clone())
            .timeout(timeout)
            .send()
            .await?;

        let status = response.status();
        let headers = response.headers().clone();

        let location = if status.is_redirection() {
            headers
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.to_string())
        } else {
            None
        };

        let body = response.bytes().await?;

        Ok(TransportResponse {
            status: status.as_u16(),
            headers,
            location,
            body,
        })
    }
}

/// Converts a name/value pair into typed header parts
///
/// # Returns
///
/// * `Ok((HeaderName, HeaderValue))` - Valid header
/// * `Err(String)` - Description of what is wrong with the name or value
pub fn parse_header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue), String> {
    let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| e.to_string())?;
    let value = HeaderValue::from_str(value).map_err(|e| e.to_string())?;
    Ok((name, value))
}
