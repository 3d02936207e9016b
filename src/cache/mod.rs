//! Response cache gateway
//!
//! This module sits between the scheduler and an external key/value store:
//! - Derives cache keys from normalized request URLs
//! - Serializes and deserializes cached (content type, body) pairs
//! - Decides which content types are worth caching
//!
//! Without a configured store every lookup misses and every write is a no-op.

mod entry;
mod store;

pub use entry::{cache_key, CacheEntry, CACHE_KEY_PREFIX};
pub use store::{CacheStore, MemoryStore, StoreError, StoreResult};

use crate::config::Config;
use crate::url::cache_identity;
use crate::CourierError;
use std::sync::Arc;
use std::time::Duration;

/// Gateway translating request URLs into cached page entries
#[derive(Clone)]
pub struct CacheGateway {
    store: Option<Arc<dyn CacheStore>>,
    ttl: Duration,
    /// Lowercased allowlist entries
    content_types: Vec<String>,
}

impl CacheGateway {
    /// Creates a gateway over an optional store
    ///
    /// # Arguments
    ///
    /// * `store` - The backing store; `None` disables caching entirely
    /// * `ttl` - Expiry handed to the store on every write
    /// * `content_types` - Allowlist of content-type substrings
    pub fn new<S: AsRef<str>>(
        store: Option<Arc<dyn CacheStore>>,
        ttl: Duration,
        content_types: &[S],
    ) -> Self {
        Self {
            store,
            ttl,
            content_types: content_types
                .iter()
                .map(|t| t.as_ref().to_lowercase())
                .collect(),
        }
    }

    /// Creates a gateway using the cache section of a configuration
    pub fn from_config(config: &Config, store: Option<Arc<dyn CacheStore>>) -> Self {
        Self::new(store, config.cache_ttl(), config.cache.content_types.as_slice())
    }

    /// Returns true if a store is configured
    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    /// Looks up the cached page for `url`
    ///
    /// # Returns
    ///
    /// * `Ok(Some(CacheEntry))` - A well-formed entry was found
    /// * `Ok(None)` - No store, no entry, or a malformed stored value
    /// * `Err(CourierError::CacheRead)` - The store failed
    pub async fn lookup(&self, url: &str) -> Result<Option<CacheEntry>, CourierError> {
        let Some(store) = &self.store else {
            return Ok(None);
        };

        let key = cache_key(&cache_identity(url));
        let value = store.get(&key).await.map_err(CourierError::CacheRead)?;

        match value {
            Some(value) => {
                let entry = CacheEntry::decode(&value);
                if entry.is_none() {
                    tracing::warn!("Ignoring malformed cache value for {} ({})", url, key);
                }
                Ok(entry)
            }
            None => Ok(None),
        }
    }

    /// Stores a fetched page for `url`
    ///
    /// A no-op when no store is configured. Store failures surface as
    /// `CourierError::CacheWrite`.
    pub async fn store(&self, url: &str, content_type: &str, body: &str) -> Result<(), CourierError> {
        let Some(store) = &self.store else {
            return Ok(());
        };

        let key = cache_key(&cache_identity(url));
        let value = CacheEntry::new(content_type, body).encode();

        tracing::debug!(
            "Saving cache: [content_type={}, length={}] {}",
            content_type,
            body.len(),
            url
        );

        store
            .set_with_ttl(&key, &value, self.ttl)
            .await
            .map_err(CourierError::CacheWrite)
    }

    /// Checks whether a response content type may be cached
    ///
    /// Matching is a case-insensitive substring test, so `text/html` also
    /// covers `text/html; charset=utf-8`.
    pub fn is_cacheable(&self, content_type: &str) -> bool {
        let content_type = content_type.to_lowercase();
        self.content_types
            .iter()
            .any(|allowed| content_type.contains(allowed.as_str()))
    }
}

impl std::fmt::Debug for CacheGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheGateway")
            .field("enabled", &self.is_enabled())
            .field("ttl", &self.ttl)
            .field("content_types", &self.content_types)
            .finish()
    }
}
