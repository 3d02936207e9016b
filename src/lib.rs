//! Sumi-Courier: a polite, single-lane fetch scheduler
//!
//! This crate serializes page fetches from many callers onto one network lane,
//! enforcing a minimum delay between requests, following redirects, caching
//! responses by content type, and optionally parsing HTML documents.

pub mod cache;
pub mod config;
pub mod crawler;
pub mod url;

use thiserror::Error;

pub use crate::cache::StoreError;
pub use crate::crawler::TransportError;

/// Main error type for Sumi-Courier operations
#[derive(Debug, Error)]
pub enum CourierError {
    #[error("Missing parameter `url`")]
    MissingUrl,

    #[error("Invalid header `{name}`: {message}")]
    InvalidHeader { name: String, message: String },

    #[error("Transport error for {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: TransportError,
    },

    #[error("Max redirect ({max}) exceeded for {url}")]
    RedirectLimit { url: String, max: u32 },

    #[error("Invalid status code {status} for {url}")]
    InvalidStatus { url: String, status: u16 },

    #[error("Cache read error: {0}")]
    CacheRead(#[source] StoreError),

    #[error("Cache write error: {0}")]
    CacheWrite(#[source] StoreError),

    #[error("HTML parse error for {url}: {message}")]
    HtmlParse {
        url: String,
        message: String,
        /// Raw page text, still usable when parsing fails
        body: String,
    },

    #[error("Scheduler is shut down")]
    Closed,

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

impl CourierError {
    /// Returns true for request validation failures raised before queueing
    pub fn is_parameter_error(&self) -> bool {
        matches!(self, Self::MissingUrl | Self::InvalidHeader { .. })
    }

    /// Returns true for network, status and redirect failures
    pub fn is_transport_error(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::InvalidStatus { .. } | Self::RedirectLimit { .. }
        )
    }

    /// Raw body delivered alongside the error, if any
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::HtmlParse { body, .. } => Some(body),
            _ => None,
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid header in config: {0}")]
    InvalidHeader(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for Sumi-Courier operations
pub type Result<T> = std::result::Result<T, CourierError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use cache::{CacheEntry, CacheGateway, CacheStore, MemoryStore};
pub use config::Config;
pub use crawler::{FetchRequest, FetchResponse, Scheduler, SchedulerBuilder};
