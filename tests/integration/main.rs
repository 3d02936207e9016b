//! Integration tests for the fetch scheduler
//!
//! These tests use wiremock to create mock HTTP servers and drive the full
//! submit → cache → queue → fetch → adapt cycle through the reqwest transport.

mod cache_tests;
mod scheduler_tests;

use std::sync::Arc;
use sumi_courier::{CacheStore, Config, Scheduler};

/// Creates a test configuration with a short delay
pub fn create_test_config(delay_ms: u64) -> Config {
    let mut config = Config::default();
    config.request.delay_ms = delay_ms;
    config.request.timeout_ms = 5_000;
    config
}

/// Builds a scheduler over the real HTTP transport
pub fn create_scheduler(config: Config, store: Option<Arc<dyn CacheStore>>) -> Scheduler {
    let mut builder = Scheduler::builder(config);
    if let Some(store) = store {
        builder = builder.store(store);
    }
    builder.build().expect("Failed to build scheduler")
}
