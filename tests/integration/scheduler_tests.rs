use crate::{create_scheduler, create_test_config};
use std::time::{Duration, Instant};
use sumi_courier::{CourierError, FetchRequest};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_simple_fetch_without_store() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("hi")
                .insert_header("content-type", "text/html"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let scheduler = create_scheduler(create_test_config(10), None);
    let response = scheduler
        .submit(format!("{}/a", mock_server.uri()))
        .await
        .expect("Fetch failed");

    assert_eq!(response.content_type, "text/html");
    assert_eq!(response.body, "hi");
    assert!(response.document.is_none());
    assert!(!response.from_cache);
}

#[tokio::test]
async fn test_missing_url_fails_before_network() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let scheduler = create_scheduler(create_test_config(10), None);
    let err = scheduler.submit(FetchRequest::default()).await.unwrap_err();

    assert!(matches!(err, CourierError::MissingUrl));
    assert!(err.is_parameter_error());
    assert_eq!(scheduler.queue_len(), 0);
    assert_eq!(scheduler.dispatched(), 0);
}

#[tokio::test]
async fn test_not_found_is_reported() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not here"))
        .mount(&mock_server)
        .await;

    let scheduler = create_scheduler(create_test_config(10), None);
    let err = scheduler
        .submit(format!("{}/gone", mock_server.uri()))
        .await
        .unwrap_err();

    assert!(matches!(err, CourierError::InvalidStatus { status: 404, .. }));
    assert!(err.to_string().contains("404"));
    assert_eq!(err.body(), None);
}

#[tokio::test]
async fn test_requests_are_paced_in_submission_order() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    for page in ["/1", "/2", "/3"] {
        Mock::given(method("GET"))
            .and(path(page))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(page)
                    .insert_header("content-type", "text/plain"),
            )
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    let delay = Duration::from_millis(100);
    let scheduler = create_scheduler(create_test_config(100), None);

    let started = Instant::now();
    let (one, two, three) = tokio::join!(
        scheduler.submit(format!("{}/1", base_url)),
        scheduler.submit(format!("{}/2", base_url)),
        scheduler.submit(format!("{}/3", base_url)),
    );
    let elapsed = started.elapsed();

    assert_eq!(one.unwrap().body, "/1");
    assert_eq!(two.unwrap().body, "/2");
    assert_eq!(three.unwrap().body, "/3");

    // Three dispatches need at least two full delays between them
    assert!(elapsed >= delay * 2, "Finished too fast: {:?}", elapsed);

    let received = mock_server
        .received_requests()
        .await
        .expect("Request recording disabled");
    let order: Vec<String> = received.iter().map(|r| r.url.path().to_string()).collect();
    assert_eq!(order, vec!["/1", "/2", "/3"]);
}

#[tokio::test]
async fn test_queue_keeps_draining_after_failures() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/error"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("fine")
                .insert_header("content-type", "text/html"),
        )
        .mount(&mock_server)
        .await;

    let scheduler = create_scheduler(create_test_config(20), None);

    let (first, second, third) = tokio::join!(
        scheduler.submit(format!("{}/error", base_url)),
        scheduler.submit(format!("{}/ok", base_url)),
        scheduler.submit(format!("{}/error", base_url)),
    );

    assert!(matches!(
        first.unwrap_err(),
        CourierError::InvalidStatus { status: 500, .. }
    ));
    assert_eq!(second.unwrap().body, "fine");
    assert!(third.unwrap_err().is_transport_error());
    assert_eq!(scheduler.dispatched(), 3);
    assert_eq!(scheduler.queue_len(), 0);
}

#[tokio::test]
async fn test_request_headers_override_defaults() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("user-agent", "TestBot/1.0"))
        .and(header("x-crawl-run", "42"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("ok")
                .insert_header("content-type", "text/html"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let scheduler = create_scheduler(create_test_config(10), None);
    let request = FetchRequest::new(format!("{}/", mock_server.uri()))
        .header("User-Agent", "TestBot/1.0")
        .header("X-Crawl-Run", "42");

    let response = scheduler.submit(request).await.expect("Fetch failed");
    assert_eq!(response.body, "ok");
}

#[tokio::test]
async fn test_configured_headers_sent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(header("user-agent", "ConfiguredBot/2.0"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(10);
    config
        .request
        .headers
        .insert("User-Agent".to_string(), "ConfiguredBot/2.0".to_string());

    let scheduler = create_scheduler(config, None);
    let response = scheduler
        .submit(mock_server.uri())
        .await
        .expect("Fetch failed");

    // No Content-Type header on the response
    assert_eq!(response.content_type, "");
}

#[tokio::test]
async fn test_document_parsing() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(
                    r#"<html><head><title>Page Title</title></head><body><p>Body</p></body></html>"#,
                )
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .mount(&mock_server)
        .await;

    let scheduler = create_scheduler(create_test_config(10), None);
    let response = scheduler
        .submit(FetchRequest::new(format!("{}/page", mock_server.uri())).with_document())
        .await
        .expect("Fetch failed");

    assert!(response.document.is_some());
    assert_eq!(response.title(), Some("Page Title".to_string()));
    assert_eq!(response.content_type, "text/html; charset=utf-8");
}

#[tokio::test]
async fn test_timeout_is_transport_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("late")
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(10);
    config.request.timeout_ms = 100;

    let scheduler = create_scheduler(config, None);
    let err = scheduler.submit(mock_server.uri()).await.unwrap_err();

    assert!(matches!(err, CourierError::Transport { .. }));
}
