//! Fail-fast health checks, session creation and never-failing cleanup

mod support;

use serde_json::json;
use std::time::Duration;
use test_case::test_case;

use shopbot_e2e::health::{create_session_or_throw, health_check, safe_cleanup, try_cleanup_session};
use shopbot_e2e::mock::Method;
use shopbot_e2e::{ApiClient, CleanupError, E2eError, MockBackend, MockResponse};

use support::{client_for, config_for, dead_url};

#[tokio::test]
async fn health_check_passes_on_200() {
    let mock = MockBackend::start().await.unwrap();
    mock.on(Method::GET, "/health", MockResponse::json(200, json!({ "status": "ok" })));

    let client = reqwest::Client::new();
    health_check(&client, &mock.url(), Duration::from_secs(2))
        .await
        .unwrap();
    assert_eq!(mock.hits(&Method::GET, "/health"), 1);
}

#[test_case(500 ; "server error")]
#[test_case(503 ; "unavailable")]
#[test_case(204 ; "no content is not healthy")]
#[tokio::test]
async fn health_check_fails_on_non_200(status: u16) {
    let mock = MockBackend::start().await.unwrap();
    mock.on(Method::GET, "/health", MockResponse::empty(status));

    let err = health_check(&reqwest::Client::new(), &mock.url(), Duration::from_secs(2))
        .await
        .unwrap_err();
    match err {
        E2eError::BackendUnavailable { reason, .. } => {
            assert!(reason.contains(&status.to_string()), "{}", reason)
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn health_check_fails_on_timeout() {
    let mock = MockBackend::start().await.unwrap();
    mock.on(
        Method::GET,
        "/health",
        MockResponse::empty(200).with_delay(Duration::from_secs(2)),
    );

    let err = health_check(&reqwest::Client::new(), &mock.url(), Duration::from_millis(100))
        .await
        .unwrap_err();
    assert!(matches!(err, E2eError::BackendUnavailable { .. }));
}

#[tokio::test]
async fn health_check_fails_when_unreachable() {
    let err = health_check(&reqwest::Client::new(), &dead_url(), Duration::from_secs(1))
        .await
        .unwrap_err();
    assert!(matches!(err, E2eError::BackendUnavailable { .. }));
}

#[test_case(json!({ "data": { "sessionId": "s-camel" } }), "s-camel" ; "data camel")]
#[test_case(json!({ "data": { "session_id": "s-snake" } }), "s-snake" ; "data snake")]
#[test_case(json!({ "session": { "session_id": "s-legacy" } }), "s-legacy" ; "legacy")]
#[tokio::test]
async fn create_session_accepts_known_shapes(body: serde_json::Value, expected: &str) {
    let mock = MockBackend::start().await.unwrap();
    mock.on(Method::POST, "/api/v1/widget/session", MockResponse::json(201, body));
    let api = client_for(&mock);

    let session_id = create_session_or_throw(&api, "merchant-1").await.unwrap();
    assert_eq!(session_id, expected);

    let sent = mock.requests_to(&Method::POST, "/api/v1/widget/session");
    assert_eq!(sent[0].json().unwrap()["merchant_id"], "merchant-1");
}

#[tokio::test]
async fn create_session_fails_on_error_status() {
    let mock = MockBackend::start().await.unwrap();
    mock.on(
        Method::POST,
        "/api/v1/widget/session",
        MockResponse::error(429, "Too many sessions", Some(12003)),
    );
    let api = client_for(&mock);

    match create_session_or_throw(&api, "merchant-1").await {
        Err(E2eError::UnexpectedStatus { status, .. }) => assert_eq!(status, 429),
        other => panic!("expected UnexpectedStatus, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn create_session_fails_on_unknown_shape() {
    let mock = MockBackend::start().await.unwrap();
    mock.on(
        Method::POST,
        "/api/v1/widget/session",
        MockResponse::json(200, json!({ "data": { "id": "no-session-field" } })),
    );
    let api = client_for(&mock);

    assert!(matches!(
        create_session_or_throw(&api, "merchant-1").await,
        Err(E2eError::Decode(_))
    ));
}

#[test_case(204 ; "deleted")]
#[test_case(404 ; "already gone")]
#[tokio::test]
async fn try_cleanup_accepts_gone_sessions(status: u16) {
    let mock = MockBackend::start().await.unwrap();
    mock.on(Method::DELETE, "/api/v1/widget/session/:id", MockResponse::empty(status));
    let api = client_for(&mock);

    assert!(try_cleanup_session(&api, "s-1").await.is_ok());
}

#[tokio::test]
async fn try_cleanup_reports_server_error() {
    let mock = MockBackend::start().await.unwrap();
    mock.on(
        Method::DELETE,
        "/api/v1/widget/session/:id",
        MockResponse::error(500, "boom", None),
    );
    let api = client_for(&mock);

    assert!(matches!(
        try_cleanup_session(&api, "s-1").await,
        Err(CleanupError::Status { status: 500, .. })
    ));
}

#[test_case(404 ; "not found")]
#[test_case(500 ; "server error")]
#[tokio::test]
async fn safe_cleanup_never_fails_on_status(status: u16) {
    let mock = MockBackend::start().await.unwrap();
    mock.on(
        Method::DELETE,
        "/api/v1/widget/session/:id",
        MockResponse::error(status, "nope", None),
    );
    let api = client_for(&mock);

    safe_cleanup(&api, "s-1").await;
    assert_eq!(mock.hits(&Method::DELETE, "/api/v1/widget/session/s-1"), 1);
}

#[tokio::test]
async fn safe_cleanup_never_fails_on_network_error() {
    let mock = MockBackend::start().await.unwrap();
    let config = shopbot_e2e::HarnessConfig {
        api_url: dead_url(),
        ..config_for(&mock)
    };
    let api = ApiClient::new(config).unwrap();

    assert!(matches!(
        try_cleanup_session(&api, "s-1").await,
        Err(CleanupError::Request { .. })
    ));
    safe_cleanup(&api, "s-1").await;
}
