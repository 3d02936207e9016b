use crate::{create_scheduler, create_test_config};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use sumi_courier::cache::{cache_key, StoreResult};
use sumi_courier::{CacheStore, CourierError, MemoryStore, StoreError};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Store whose reads always fail
struct UnreachableStore;

#[async_trait]
impl CacheStore for UnreachableStore {
    async fn get(&self, _key: &str) -> StoreResult<Option<String>> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn set_with_ttl(&self, _key: &str, _value: &str, _ttl: Duration) -> StoreResult<()> {
        Ok(())
    }
}

/// Store whose writes always fail
struct ReadOnlyStore;

#[async_trait]
impl CacheStore for ReadOnlyStore {
    async fn get(&self, _key: &str) -> StoreResult<Option<String>> {
        Ok(None)
    }

    async fn set_with_ttl(&self, _key: &str, _value: &str, _ttl: Duration) -> StoreResult<()> {
        Err(StoreError::Backend("read-only replica".to_string()))
    }
}

async fn mount_page(mock_server: &MockServer, page: &str, body: &str, content_type: &str, hits: u64) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", content_type),
        )
        .expect(hits)
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_second_request_served_from_cache() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/a", "hi", "text/html", 1).await;

    let store = Arc::new(MemoryStore::new());
    let scheduler = create_scheduler(create_test_config(10), Some(store.clone()));
    let url = format!("{}/a", mock_server.uri());

    let first = scheduler.submit(url.as_str()).await.expect("First fetch failed");
    let second = scheduler.submit(url.as_str()).await.expect("Second fetch failed");

    assert!(!first.from_cache);
    assert!(second.from_cache);
    assert_eq!(first.content_type, second.content_type);
    assert_eq!(first.body, second.body);
    assert_eq!(second.body, "hi");

    // Entry layout: namespaced hashed key, "content-type\nbody" value
    let stored = store.get(&cache_key(&url)).await.unwrap();
    assert_eq!(stored, Some("text/html\nhi".to_string()));
    assert!(store.keys()[0].starts_with("cache:html:"));

    // Cache hits never reach the lane
    assert_eq!(scheduler.dispatched(), 1);
}

#[tokio::test]
async fn test_charset_suffix_is_cacheable() {
    let mock_server = MockServer::start().await;
    mount_page(
        &mock_server,
        "/utf8",
        "<p>ok</p>",
        "text/html; charset=utf-8",
        1,
    )
    .await;

    let store = Arc::new(MemoryStore::new());
    let scheduler = create_scheduler(create_test_config(10), Some(store.clone()));
    let url = format!("{}/utf8", mock_server.uri());

    scheduler.submit(url.as_str()).await.unwrap();
    let cached = scheduler.submit(url.as_str()).await.unwrap();

    assert!(cached.from_cache);
    assert_eq!(cached.content_type, "text/html; charset=utf-8");
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_other_content_types_not_cached() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/data.json", "{}", "application/json", 2).await;

    let store = Arc::new(MemoryStore::new());
    let scheduler = create_scheduler(create_test_config(10), Some(store.clone()));
    let url = format!("{}/data.json", mock_server.uri());

    scheduler.submit(url.as_str()).await.unwrap();
    let again = scheduler.submit(url.as_str()).await.unwrap();

    assert!(!again.from_cache);
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_configured_content_types() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/data.json", "{}", "application/json", 1).await;

    let mut config = create_test_config(10);
    config.cache.content_types = vec!["Application/JSON".to_string()];

    let store = Arc::new(MemoryStore::new());
    let scheduler = create_scheduler(config, Some(store.clone()));
    let url = format!("{}/data.json", mock_server.uri());

    scheduler.submit(url.as_str()).await.unwrap();
    assert!(scheduler.submit(url.as_str()).await.unwrap().from_cache);
}

#[tokio::test]
async fn test_cache_read_error_aborts_before_fetch() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/a", "hi", "text/html", 0).await;

    let scheduler = create_scheduler(create_test_config(10), Some(Arc::new(UnreachableStore)));
    let err = scheduler
        .submit(format!("{}/a", mock_server.uri()))
        .await
        .unwrap_err();

    assert!(matches!(err, CourierError::CacheRead(_)));
    assert_eq!(scheduler.dispatched(), 0);
}

#[tokio::test]
async fn test_cache_write_error_discards_body() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/a", "hi", "text/html", 1).await;
    mount_page(&mock_server, "/b", "bye", "text/plain", 1).await;

    let scheduler = create_scheduler(create_test_config(10), Some(Arc::new(ReadOnlyStore)));
    let (a, b) = tokio::join!(
        scheduler.submit(format!("{}/a", mock_server.uri())),
        scheduler.submit(format!("{}/b", mock_server.uri())),
    );

    let err = a.unwrap_err();
    assert!(matches!(err, CourierError::CacheWrite(_)));
    assert_eq!(err.body(), None);

    // Not cacheable, so never written, so unaffected
    assert_eq!(b.unwrap().body, "bye");
}

#[tokio::test]
async fn test_expired_entry_is_refetched() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/a", "hi", "text/html", 2).await;

    let mut config = create_test_config(0);
    config.cache.ttl_secs = 1;

    let store = Arc::new(MemoryStore::new());
    let scheduler = create_scheduler(config, Some(store));
    let url = format!("{}/a", mock_server.uri());

    scheduler.submit(url.as_str()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(1100)).await;
    let again = scheduler.submit(url.as_str()).await.unwrap();

    assert!(!again.from_cache);
}
