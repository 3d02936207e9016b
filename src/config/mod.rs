//! Configuration module for Sumi-Courier
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use sumi_courier::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("courier.toml")).unwrap();
//! println!("Delay between requests: {:?}", config.delay());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    CacheConfig, Config, RequestConfig, DEFAULT_CACHE_CONTENT_TYPES, DEFAULT_CACHE_TTL_SECS,
    DEFAULT_DELAY_MS, DEFAULT_HEADERS, DEFAULT_MAX_REDIRECT, DEFAULT_TIMEOUT_MS,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
