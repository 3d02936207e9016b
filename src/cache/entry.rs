use sha2::{Digest, Sha256};

/// Namespace prepended to every cache key
pub const CACHE_KEY_PREFIX: &str = "cache:html:";

/// Separator between content type and body in a stored value
const DELIMITER: char = '\n';

/// A cached page: the response content type and its raw body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub content_type: String,
    pub body: String,
}

impl CacheEntry {
    pub fn new(content_type: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            body: body.into(),
        }
    }

    /// Serializes the entry as `content_type + "\n" + body`
    pub fn encode(&self) -> String {
        let mut value = String::with_capacity(self.content_type.len() + 1 + self.body.len());
        value.push_str(&self.content_type);
        value.push(DELIMITER);
        value.push_str(&self.body);
        value
    }

    /// Splits a stored value at its first newline
    ///
    /// Returns `None` for values without a newline; callers treat those as
    /// cache misses.
    pub fn decode(value: &str) -> Option<Self> {
        let (content_type, body) = value.split_once(DELIMITER)?;
        Some(Self::new(content_type, body))
    }
}

/// Computes the store key for a (normalized) request URL
///
/// The key is [`CACHE_KEY_PREFIX`] followed by the hex SHA-256 of the URL.
pub fn cache_key(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    format!("{}{}", CACHE_KEY_PREFIX, hex::encode(hasher.finalize()))
}
