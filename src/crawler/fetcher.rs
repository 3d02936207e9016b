//! Redirect-following fetcher
//!
//! Resolves a URL into a final page by issuing one transport call per hop:
//!
//! | Response | Outcome |
//! |----------|---------|
//! | Transport error | Fail with the transport error |
//! | Redirect, budget left | Follow the location (relative ones resolved) |
//! | Redirect, budget spent | Fail with `RedirectLimit` |
//! | Status 200 | Succeed with headers and body |
//! | Any other status | Fail with `InvalidStatus` |
//!
//! Intermediate hops are never handed to the cache.

use crate::crawler::transport::{content_type_of, Transport};
use crate::url::resolve_location;
use crate::CourierError;
use bytes::Bytes;
use reqwest::header::HeaderMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Final page of a successful fetch
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL that answered with 200, after redirects
    pub final_url: String,

    /// Number of redirects followed to get there
    pub redirects: u32,

    /// Headers of the final response
    pub headers: HeaderMap,

    /// Body of the final response
    pub body: Bytes,
}

impl FetchedPage {
    /// Content-Type of the final response, empty when absent
    pub fn content_type(&self) -> &str {
        content_type_of(&self.headers)
    }
}

/// Fetcher following redirects up to a fixed number of hops
#[derive(Clone)]
pub struct RedirectFetcher {
    transport: Arc<dyn Transport>,
    timeout: Duration,
    max_redirect: u32,
}

impl RedirectFetcher {
    pub fn new(transport: Arc<dyn Transport>, timeout: Duration, max_redirect: u32) -> Self {
        Self {
            transport,
            timeout,
            max_redirect,
        }
    }

    /// Fetches `url`, following at most `max_redirect` redirects
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to start from
    /// * `headers` - Headers sent on every hop
    ///
    /// # Returns
    ///
    /// * `Ok(FetchedPage)` - A 200 response was reached
    /// * `Err(CourierError)` - Transport failure, non-200 status, or too many redirects
    pub async fn fetch(&self, url: &str, headers: &HeaderMap) -> Result<FetchedPage, CourierError> {
        let mut current = url.to_string();
        let mut hops: u32 = 0;

        loop {
            let started = Instant::now();
            tracing::trace!("Requesting (hop={}): {}", hops, current);

            let response = self
                .transport
                .fetch(&current, headers, self.timeout)
                .await
                .map_err(|source| CourierError::Transport {
                    url: current.clone(),
                    source,
                })?;

            if let Some(location) = response.location.as_deref() {
                // `hops` redirects have been followed so far; this would be one more
                if hops >= self.max_redirect {
                    tracing::debug!("Max redirect ({}) reached at {}", self.max_redirect, current);
                    return Err(CourierError::RedirectLimit {
                        url: url.to_string(),
                        max: self.max_redirect,
                    });
                }

                let next = resolve_location(&current, location);
                tracing::debug!("Redirect (hop={}): {} => {}", hops, current, next);
                hops += 1;
                current = next;
                continue;
            }

            if response.status != 200 {
                tracing::debug!(
                    "Invalid status code {} for {} (spent={:?})",
                    response.status,
                    current,
                    started.elapsed()
                );
                return Err(CourierError::InvalidStatus {
                    url: current,
                    status: response.status,
                });
            }

            tracing::trace!("Fetched {} (spent={:?})", current, started.elapsed());

            return Ok(FetchedPage {
                final_url: current,
                redirects: hops,
                headers: response.headers,
                body: response.body,
            });
        }
    }
}
