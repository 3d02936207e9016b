use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Default request timeout (milliseconds)
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Default minimum delay between two dispatched requests (milliseconds)
pub const DEFAULT_DELAY_MS: u64 = 2_000;

/// Default number of redirects followed before giving up
pub const DEFAULT_MAX_REDIRECT: u32 = 5;

/// Default cache time-to-live (seconds): one week
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600 * 24 * 7;

/// Content types cached by default
pub const DEFAULT_CACHE_CONTENT_TYPES: &[&str] = &["text/html"];

/// Headers sent with every request unless overridden
pub const DEFAULT_HEADERS: &[(&str, &str)] = &[
    (
        "Accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
    ),
    ("Accept-Language", "en-US,en;q=0.8"),
    ("Cache-Control", "max-age=0"),
    (
        "User-Agent",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    ),
];

/// Main configuration structure for Sumi-Courier
///
/// Every section and field is optional; missing values take the defaults
/// above. The cache store itself is not part of the file: it is handed to
/// the scheduler builder at construction time.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub request: RequestConfig,
    pub cache: CacheConfig,
}

/// Request behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RequestConfig {
    /// Extra headers, merged over the built-in defaults
    pub headers: BTreeMap<String, String>,

    /// Per-request timeout (milliseconds)
    #[serde(rename = "timeout")]
    pub timeout_ms: u64,

    /// Minimum time between two dispatched requests (milliseconds)
    #[serde(rename = "delay")]
    pub delay_ms: u64,

    /// Maximum number of redirects followed per request
    #[serde(rename = "max-redirect")]
    pub max_redirect: u32,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            headers: BTreeMap::new(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            delay_ms: DEFAULT_DELAY_MS,
            max_redirect: DEFAULT_MAX_REDIRECT,
        }
    }
}

/// Response cache configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Time-to-live of cached pages (seconds)
    #[serde(rename = "ttl")]
    pub ttl_secs: u64,

    /// Content types eligible for caching, matched case-insensitively as substrings
    #[serde(rename = "content-types")]
    pub content_types: Vec<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: DEFAULT_CACHE_TTL_SECS,
            content_types: DEFAULT_CACHE_CONTENT_TYPES
                .iter()
                .map(|t| t.to_string())
                .collect(),
        }
    }
}

impl Config {
    /// Returns the built-in default headers overlaid with the configured ones
    ///
    /// Header names are compared case-insensitively; configured values win.
    pub fn effective_headers(&self) -> Vec<(String, String)> {
        let mut merged: Vec<(String, String)> = DEFAULT_HEADERS
            .iter()
            .filter(|(name, _)| {
                !self
                    .request
                    .headers
                    .keys()
                    .any(|k| k.eq_ignore_ascii_case(name))
            })
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();

        merged.extend(
            self.request
                .headers
                .iter()
                .map(|(name, value)| (name.clone(), value.clone())),
        );

        merged
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.request.timeout_ms)
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.request.delay_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_secs)
    }
}
