//! Backend API client used by fixtures, health checks and API-level scenarios
//!
//! Every call returns an [`ApiResponse`] whatever the status code: a 403 CSRF
//! rejection or a 422 validation error is an outcome a test asserts on, not
//! an exception. Only transport failures (connection refused, timeout) are
//! errors here.

use base64::Engine;
use hmac::{Hmac, Mac};
use parking_lot::RwLock;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use sha2::Sha256;
use shopbot_common::{
    decode_envelope, ApiOutcome, BusinessInfo, Error as CommonError, Faq, MerchantData,
    SessionCreated, ShopifyFulfillmentWebhook,
};
use std::time::Duration;
use tracing::debug;

use crate::config::HarnessConfig;
use crate::error::{E2eError, E2eResult};

pub const CSRF_HEADER: &str = "X-CSRF-Token";
pub const SHOPIFY_HMAC_HEADER: &str = "X-Shopify-Hmac-Sha256";
pub const SHOPIFY_TOPIC_HEADER: &str = "X-Shopify-Topic";
pub const SHOPIFY_SHOP_HEADER: &str = "X-Shopify-Shop-Domain";

type HmacSha256 = Hmac<Sha256>;

/// Raw status and parsed body of a backend response
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub endpoint: String,
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode the body through the envelope decoder.
    pub fn outcome(&self) -> E2eResult<ApiOutcome> {
        Ok(decode_envelope(self.status, &self.body)?)
    }

    /// Envelope `data` as a concrete type; non-2xx is an error.
    pub fn data<T: DeserializeOwned>(&self) -> E2eResult<T> {
        let ok = self.require_success()?;
        Ok(ok.outcome()?.data()?)
    }

    /// Fail fast unless the call succeeded.
    pub fn require_success(&self) -> E2eResult<&Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(E2eError::UnexpectedStatus {
                endpoint: self.endpoint.clone(),
                status: self.status,
                body: self.body.to_string(),
            })
        }
    }
}

/// Query for `GET /api/conversations`
#[derive(Debug, Clone, Default)]
pub struct ConversationQuery {
    pub search: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub status: Vec<String>,
    pub sentiment: Vec<String>,
    pub has_handoff: Option<bool>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

impl ConversationQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn date_range(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.date_from = Some(from.into());
        self.date_to = Some(to.into());
        self
    }

    pub fn status(mut self, status: impl ToString) -> Self {
        self.status.push(status.to_string());
        self
    }

    pub fn sentiment(mut self, sentiment: impl ToString) -> Self {
        self.sentiment.push(sentiment.to_string());
        self
    }

    pub fn has_handoff(mut self, value: bool) -> Self {
        self.has_handoff = Some(value);
        self
    }

    pub fn page(mut self, page: u32, per_page: u32) -> Self {
        self.page = Some(page);
        self.per_page = Some(per_page);
        self
    }

    pub fn sort(mut self, by: impl Into<String>, order: impl Into<String>) -> Self {
        self.sort_by = Some(by.into());
        self.sort_order = Some(order.into());
        self
    }

    /// Query pairs; multi-valued filters repeat as `status[]` / `sentiment[]`.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        let mut push = |k: &str, v: Option<String>| {
            if let Some(v) = v {
                pairs.push((k.to_string(), v));
            }
        };
        push("search", self.search.clone());
        push("date_from", self.date_from.clone());
        push("date_to", self.date_to.clone());
        for s in &self.status {
            push("status[]", Some(s.clone()));
        }
        for s in &self.sentiment {
            push("sentiment[]", Some(s.clone()));
        }
        push("has_handoff", self.has_handoff.map(|b| b.to_string()));
        push("page", self.page.map(|p| p.to_string()));
        push("per_page", self.per_page.map(|p| p.to_string()));
        push("sort_by", self.sort_by.clone());
        push("sort_order", self.sort_order.clone());
        pairs
    }
}

/// Base64 HMAC-SHA256 of the raw body, as Shopify signs webhooks.
pub fn sign_shopify_payload(secret: &str, body: &[u8]) -> E2eResult<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| E2eError::Setup(format!("invalid webhook secret: {}", e)))?;
    mac.update(body);
    Ok(base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
}

/// Thin client over the backend REST API
pub struct ApiClient {
    http: reqwest::Client,
    config: HarnessConfig,
    auth_token: RwLock<Option<String>>,
    csrf_token: RwLock<Option<String>>,
}

impl ApiClient {
    pub fn new(config: HarnessConfig) -> E2eResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        let auth_token = RwLock::new(config.test_auth_token.clone());
        Ok(Self {
            http,
            config,
            auth_token,
            csrf_token: RwLock::new(None),
        })
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub fn set_auth_token(&self, token: Option<String>) {
        *self.auth_token.write() = token;
    }

    pub fn auth_token(&self) -> Option<String> {
        self.auth_token.read().clone()
    }

    pub fn set_csrf_token(&self, token: Option<String>) {
        *self.csrf_token.write() = token;
    }

    pub fn csrf_token(&self) -> Option<String> {
        self.csrf_token.read().clone()
    }

    /// Send a request and capture whatever came back.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        query: &[(String, String)],
        timeout: Option<Duration>,
    ) -> E2eResult<ApiResponse> {
        let url = self.config.api(path);
        let mutating = !matches!(method, Method::GET | Method::HEAD | Method::OPTIONS);
        debug!("{} {}", method, url);

        let mut request = self.http.request(method.clone(), &url);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(token) = self.auth_token() {
            request = request.bearer_auth(token);
        }
        if mutating {
            if let Some(csrf) = self.csrf_token() {
                request = request.header(CSRF_HEADER, csrf);
            }
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        read_response(format!("{} {}", method, path), response).await
    }

    pub async fn get(&self, path: &str) -> E2eResult<ApiResponse> {
        self.send(Method::GET, path, None, &[], None).await
    }

    pub async fn post<T: Serialize>(&self, path: &str, body: &T) -> E2eResult<ApiResponse> {
        let body = serde_json::to_value(body)?;
        self.send(Method::POST, path, Some(&body), &[], None).await
    }

    pub async fn put<T: Serialize>(&self, path: &str, body: &T) -> E2eResult<ApiResponse> {
        let body = serde_json::to_value(body)?;
        self.send(Method::PUT, path, Some(&body), &[], None).await
    }

    pub async fn delete(&self, path: &str) -> E2eResult<ApiResponse> {
        self.send(Method::DELETE, path, None, &[], None).await
    }

    // Auth

    /// Log in and keep the returned bearer token for later calls.
    pub async fn login(&self, email: &str, password: &str) -> E2eResult<ApiResponse> {
        let response = self
            .post("/api/v1/auth/login", &json!({ "email": email, "password": password }))
            .await?;
        if response.is_success() {
            let token = response
                .body
                .pointer("/data/token")
                .or_else(|| response.body.pointer("/data/session/token"))
                .and_then(Value::as_str)
                .map(str::to_string);
            if token.is_some() {
                self.set_auth_token(token);
            }
        }
        Ok(response)
    }

    /// Fetch a CSRF token and attach it to subsequent mutating requests.
    pub async fn fetch_csrf_token(&self) -> E2eResult<String> {
        let response = self.get("/api/v1/csrf-token").await?;
        response.require_success()?;
        let token = response
            .body
            .get("csrf_token")
            .or_else(|| response.body.pointer("/data/csrf_token"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| CommonError::unknown_shape("csrf token", &response.body))?;
        self.set_csrf_token(Some(token.clone()));
        Ok(token)
    }

    pub async fn health(&self) -> E2eResult<ApiResponse> {
        self.send(Method::GET, "/health", None, &[], Some(self.config.health_timeout))
            .await
    }

    // Merchant settings

    pub async fn get_business_info(&self) -> E2eResult<ApiResponse> {
        self.get("/api/v1/merchant/business-info").await
    }

    pub async fn update_business_info(&self, info: &BusinessInfo) -> E2eResult<ApiResponse> {
        self.put("/api/v1/merchant/business-info", info).await
    }

    pub async fn list_faqs(&self) -> E2eResult<ApiResponse> {
        self.get("/api/v1/merchant/faqs").await
    }

    pub async fn create_faq(&self, faq: &Faq) -> E2eResult<ApiResponse> {
        self.post(
            "/api/v1/merchant/faqs",
            &json!({ "question": faq.question, "answer": faq.answer, "keywords": faq.keywords }),
        )
        .await
    }

    pub async fn update_faq(&self, faq: &Faq) -> E2eResult<ApiResponse> {
        self.put(&format!("/api/v1/merchant/faqs/{}", faq.id), faq).await
    }

    pub async fn delete_faq(&self, id: u64) -> E2eResult<ApiResponse> {
        self.delete(&format!("/api/v1/merchant/faqs/{}", id)).await
    }

    pub async fn reorder_faqs(&self, ids: &[u64]) -> E2eResult<ApiResponse> {
        self.put("/api/v1/merchant/faqs/reorder", &json!({ "faq_ids": ids }))
            .await
    }

    // Costs

    pub async fn cost_summary(&self, date_from: Option<&str>, date_to: Option<&str>) -> E2eResult<ApiResponse> {
        let mut query = Vec::new();
        if let Some(from) = date_from {
            query.push(("date_from".to_string(), from.to_string()));
        }
        if let Some(to) = date_to {
            query.push(("date_to".to_string(), to.to_string()));
        }
        self.send(Method::GET, "/api/costs/summary", None, &query, None).await
    }

    pub async fn conversation_cost(&self, conversation_id: &str) -> E2eResult<ApiResponse> {
        self.get(&format!("/api/costs/conversation/{}", conversation_id)).await
    }

    // LLM providers

    pub async fn switch_provider(&self, provider_id: &str, api_key: Option<&str>, model: Option<&str>) -> E2eResult<ApiResponse> {
        self.post(
            "/api/llm/switch-provider",
            &json!({ "provider_id": provider_id, "api_key": api_key, "model": model }),
        )
        .await
    }

    pub async fn validate_provider(&self, provider_id: &str, api_key: Option<&str>) -> E2eResult<ApiResponse> {
        self.post(
            "/api/llm/validate-provider",
            &json!({ "provider_id": provider_id, "api_key": api_key }),
        )
        .await
    }

    pub async fn providers_list(&self) -> E2eResult<ApiResponse> {
        self.get("/api/llm/providers-list").await
    }

    // Conversations

    pub async fn list_conversations(&self, query: &ConversationQuery) -> E2eResult<ApiResponse> {
        self.send(Method::GET, "/api/conversations", None, &query.to_pairs(), None)
            .await
    }

    // Widget

    pub async fn create_widget_session(&self, merchant_id: &str) -> E2eResult<ApiResponse> {
        self.post("/api/v1/widget/session", &json!({ "merchant_id": merchant_id }))
            .await
    }

    /// Create a widget session and decode its id, whichever shape the backend used.
    pub async fn create_widget_session_id(&self, merchant_id: &str) -> E2eResult<SessionCreated> {
        let response = self.create_widget_session(merchant_id).await?;
        response.require_success()?;
        Ok(SessionCreated::decode(&response.body)?)
    }

    pub async fn send_widget_message(&self, session_id: &str, message: &str) -> E2eResult<ApiResponse> {
        self.post(
            "/api/v1/widget/message",
            &json!({ "session_id": session_id, "message": message }),
        )
        .await
    }

    pub async fn widget_config(&self, merchant_id: &str) -> E2eResult<ApiResponse> {
        self.get(&format!("/api/v1/widget/config/{}", merchant_id)).await
    }

    pub async fn end_widget_session(&self, session_id: &str) -> E2eResult<ApiResponse> {
        self.delete(&format!("/api/v1/widget/session/{}", session_id)).await
    }

    // Webhooks

    /// POST a Shopify webhook signed with `SHOPIFY_API_SECRET` (unsigned when no secret is configured).
    pub async fn post_shopify_webhook(
        &self,
        topic: &str,
        shop_domain: &str,
        payload: &ShopifyFulfillmentWebhook,
    ) -> E2eResult<ApiResponse> {
        let body = serde_json::to_vec(payload)?;
        let signature = match &self.config.shopify_api_secret {
            Some(secret) => Some(sign_shopify_payload(secret, &body)?),
            None => None,
        };
        self.post_raw_webhook(topic, shop_domain, body, signature.as_deref()).await
    }

    /// POST raw webhook bytes with an explicit (possibly wrong) signature.
    pub async fn post_raw_webhook(
        &self,
        topic: &str,
        shop_domain: &str,
        body: Vec<u8>,
        signature: Option<&str>,
    ) -> E2eResult<ApiResponse> {
        let path = "/api/webhooks/shopify";
        let mut request = self
            .http
            .post(self.config.api(path))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(SHOPIFY_TOPIC_HEADER, topic)
            .header(SHOPIFY_SHOP_HEADER, shop_domain)
            .body(body);
        if let Some(signature) = signature {
            request = request.header(SHOPIFY_HMAC_HEADER, signature);
        }
        let response = request.send().await?;
        read_response(format!("POST {}", path), response).await
    }

    // Test data

    pub async fn seed_merchant(&self, merchant: &MerchantData) -> E2eResult<ApiResponse> {
        self.post("/api/v1/test/merchants", merchant).await
    }

    pub async fn delete_merchant(&self, merchant_key: &str) -> E2eResult<ApiResponse> {
        self.delete(&format!("/api/v1/test/merchants/{}", merchant_key)).await
    }
}

async fn read_response(endpoint: String, response: reqwest::Response) -> E2eResult<ApiResponse> {
    let status = response.status().as_u16();
    let bytes = response.bytes().await?;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    debug!("{} -> {}", endpoint, status);
    Ok(ApiResponse {
        endpoint,
        status,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversation_query_pairs() {
        let pairs = ConversationQuery::new()
            .search("shoes")
            .status("active")
            .status("handoff")
            .sentiment("negative")
            .has_handoff(true)
            .page(2, 20)
            .sort("updated_at", "desc")
            .to_pairs();

        let keys: Vec<&str> = pairs.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "search", "status[]", "status[]", "sentiment[]", "has_handoff", "page", "per_page",
                "sort_by", "sort_order"
            ]
        );
        assert_eq!(pairs[4].1, "true");
    }

    #[test]
    fn test_empty_query_has_no_pairs() {
        assert!(ConversationQuery::new().to_pairs().is_empty());
    }

    #[test]
    fn test_shopify_signature_known_vector() {
        // HMAC-SHA256("key", "The quick brown fox jumps over the lazy dog")
        let sig = sign_shopify_payload("key", b"The quick brown fox jumps over the lazy dog").unwrap();
        assert_eq!(sig, "97yD9DBThCSxMpjmqm+xQ+9NWaFJRhdZl0edvC0aPNg=");
    }

    #[test]
    fn test_require_success() {
        let ok = ApiResponse {
            endpoint: "GET /x".to_string(),
            status: 201,
            body: Value::Null,
        };
        assert!(ok.require_success().is_ok());

        let bad = ApiResponse { status: 500, ..ok };
        assert!(matches!(
            bad.require_success(),
            Err(E2eError::UnexpectedStatus { status: 500, .. })
        ));
    }
}
