//! API client behaviour against the in-process mock backend

mod support;

use base64::Engine;
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;

use shopbot_common::{ApiOutcome, ErrorCode};
use shopbot_e2e::api::{sign_shopify_payload, CSRF_HEADER, SHOPIFY_HMAC_HEADER, SHOPIFY_TOPIC_HEADER};
use shopbot_e2e::assertions::assert_status_in;
use shopbot_e2e::factories::{FactoryRng, FaqFactory, FulfillmentWebhookFactory};
use shopbot_e2e::mock::{error_flat, paginated, Method};
use shopbot_e2e::{ApiClient, ConversationQuery, MockBackend, MockResponse};

use support::{client_for, config_for};

#[tokio::test]
async fn csrf_token_only_on_mutating_requests() {
    let mock = MockBackend::start().await.unwrap();
    mock.on(Method::GET, "/api/v1/csrf-token", MockResponse::json(200, json!({ "csrf_token": "tok-1" })));
    mock.on(Method::GET, "/api/v1/merchant/faqs", MockResponse::ok(json!([])));
    mock.on(Method::POST, "/api/v1/merchant/faqs", MockResponse::created(json!({ "id": 1 })));
    let api = client_for(&mock);

    assert_eq!(api.fetch_csrf_token().await.unwrap(), "tok-1");

    let mut rng = FactoryRng::seeded(1);
    api.list_faqs().await.unwrap();
    api.create_faq(&FaqFactory::new().build(&mut rng)).await.unwrap();

    let get = &mock.requests_to(&Method::GET, "/api/v1/merchant/faqs")[0];
    assert!(get.header(CSRF_HEADER).is_none());
    let post = &mock.requests_to(&Method::POST, "/api/v1/merchant/faqs")[0];
    assert_eq!(post.header(CSRF_HEADER), Some("tok-1"));
}

#[tokio::test]
async fn missing_csrf_is_an_assertable_403() {
    let mock = MockBackend::start().await.unwrap();
    mock.on(
        Method::PUT,
        "/api/v1/merchant/business-info",
        MockResponse::error(403, "CSRF token missing", Some(ErrorCode::CSRF_INVALID.0)),
    );
    let api = client_for(&mock);
    let mut rng = FactoryRng::seeded(2);
    let info = shopbot_e2e::factories::BusinessInfoFactory::new().build(&mut rng);

    let response = api.update_business_info(&info).await.unwrap();
    assert_status_in(&response, &[401, 403]).unwrap();
    assert_eq!(response.outcome().unwrap().error_code(), Some(ErrorCode::CSRF_INVALID));
}

#[tokio::test]
async fn bearer_token_from_login_is_reused() {
    let mock = MockBackend::start().await.unwrap();
    mock.on(
        Method::POST,
        "/api/v1/auth/login",
        MockResponse::ok(json!({ "token": "jwt-abc", "merchant": { "id": 1 } })),
    );
    mock.on(Method::GET, "/api/v1/merchant/business-info", MockResponse::ok(json!({})));
    let api = client_for(&mock);

    api.login("owner@example.com", "hunter22").await.unwrap();
    api.get_business_info().await.unwrap();

    let req = &mock.requests_to(&Method::GET, "/api/v1/merchant/business-info")[0];
    assert_eq!(req.header("authorization"), Some("Bearer jwt-abc"));
}

#[tokio::test]
async fn webhook_signature_verifies_with_secret() {
    let mock = MockBackend::start().await.unwrap();
    mock.on(Method::POST, "/api/webhooks/shopify", MockResponse::json(200, json!({ "received": true })));
    let config = shopbot_e2e::HarnessConfig {
        shopify_api_secret: Some("shpss_test".to_string()),
        ..config_for(&mock)
    };
    let api = ApiClient::new(config).unwrap();

    let mut rng = FactoryRng::seeded(3);
    let payload = FulfillmentWebhookFactory::multi_package(2).build(&mut rng);
    let response = api
        .post_shopify_webhook("fulfillments/create", "demo.myshopify.com", &payload)
        .await
        .unwrap();
    assert_status_in(&response, &[200, 500]).unwrap();

    let req = &mock.requests_to(&Method::POST, "/api/webhooks/shopify")[0];
    assert_eq!(req.header(SHOPIFY_TOPIC_HEADER), Some("fulfillments/create"));

    let signature = req.header(SHOPIFY_HMAC_HEADER).unwrap();
    let mut mac = Hmac::<Sha256>::new_from_slice(b"shpss_test").unwrap();
    mac.update(&req.body);
    let expected = base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes());
    assert_eq!(signature, expected);
    assert_eq!(signature, sign_shopify_payload("shpss_test", &req.body).unwrap());
}

#[tokio::test]
async fn unsigned_webhook_without_secret() {
    let mock = MockBackend::start().await.unwrap();
    mock.on(
        Method::POST,
        "/api/webhooks/shopify",
        MockResponse::json(401, error_flat("Invalid HMAC", 3018)),
    );
    let api = client_for(&mock);
    let mut rng = FactoryRng::seeded(4);
    let payload = FulfillmentWebhookFactory::new().build(&mut rng);

    let response = api
        .post_shopify_webhook("fulfillments/create", "demo.myshopify.com", &payload)
        .await
        .unwrap();
    assert_eq!(response.status, 401);
    let req = &mock.requests_to(&Method::POST, "/api/webhooks/shopify")[0];
    assert!(req.header(SHOPIFY_HMAC_HEADER).is_none());
}

#[tokio::test]
async fn conversation_filters_reach_the_backend() {
    let mock = MockBackend::start().await.unwrap();
    mock.on(
        Method::GET,
        "/api/conversations",
        MockResponse::json(200, paginated(json!([]), 1, 20, 0)),
    );
    let api = client_for(&mock);

    let query = ConversationQuery::new()
        .search("where is my order")
        .status("active")
        .status("handoff")
        .has_handoff(true)
        .page(1, 20);
    let response = api.list_conversations(&query).await.unwrap();

    match response.outcome().unwrap() {
        ApiOutcome::Success { meta, .. } => {
            assert_eq!(meta.and_then(|m| m.pagination).map(|p| p.per_page), Some(20));
        }
        other => panic!("unexpected outcome: {:?}", other),
    }

    let pairs = mock.requests_to(&Method::GET, "/api/conversations")[0].query_pairs();
    let statuses: Vec<&str> = pairs
        .iter()
        .filter(|(k, _)| k == "status[]")
        .map(|(_, v)| v.as_str())
        .collect();
    assert_eq!(statuses, vec!["active", "handoff"]);
    assert!(pairs.contains(&("search".to_string(), "where is my order".to_string())));
    assert!(pairs.contains(&("has_handoff".to_string(), "true".to_string())));
}

#[tokio::test]
async fn unmatched_route_is_a_decodable_404() {
    let mock = MockBackend::start().await.unwrap();
    let api = client_for(&mock);

    let response = api.get("/api/v1/nowhere").await.unwrap();
    assert_eq!(response.status, 404);
    assert!(response.require_success().is_err());
    assert!(response.outcome().unwrap().error_code().is_none());
}
