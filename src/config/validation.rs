use crate::config::types::{CacheConfig, Config, RequestConfig};
use crate::ConfigError;
use reqwest::header::{HeaderName, HeaderValue};

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_request_config(&config.request)?;
    validate_cache_config(&config.cache)?;
    Ok(())
}

/// Validates request configuration
fn validate_request_config(config: &RequestConfig) -> Result<(), ConfigError> {
    if config.timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "timeout must be greater than 0ms".to_string(),
        ));
    }

    // A zero delay is allowed: the lane still dispatches one request at a time.

    for (name, value) in &config.headers {
        validate_header(name, value)?;
    }

    Ok(())
}

/// Validates cache configuration
fn validate_cache_config(config: &CacheConfig) -> Result<(), ConfigError> {
    if config.ttl_secs == 0 {
        return Err(ConfigError::Validation(
            "cache ttl must be greater than 0s".to_string(),
        ));
    }

    // An empty entry would match every content type
    if let Some(position) = config.content_types.iter().position(|t| t.trim().is_empty()) {
        return Err(ConfigError::Validation(format!(
            "cache content-types entry #{} cannot be empty",
            position
        )));
    }

    Ok(())
}

/// Validates a single header name/value pair
fn validate_header(name: &str, value: &str) -> Result<(), ConfigError> {
    HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| ConfigError::InvalidHeader(format!("'{}': {}", name, e)))?;
    HeaderValue::from_str(value)
        .map_err(|e| ConfigError::InvalidHeader(format!("value of '{}': {}", name, e)))?;
    Ok(())
}
