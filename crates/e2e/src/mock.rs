//! In-process mock backend and response builders
//!
//! `MockBackend` is an axum server bound to an ephemeral loopback port. Tests
//! register canned responses per `(method, path)` and afterwards inspect the
//! requests the code under test actually sent.
//!
//! ```text
//! MockBackend::start()
//!   ├── on(GET, "/health", MockResponse::json(200, ...))
//!   ├── on(POST, "/api/v1/widget/session", [503, 201])   queued, last one repeats
//!   ├── on(GET, "/api/v1/widget/config/:id", ...)         `:param` and `*` segments
//!   └── requests() -> Vec<MockRequest>
//! ```

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, info};

use crate::error::E2eResult;

pub use axum::http::Method;

/// `{ data, meta: { requestId, timestamp } }`
pub fn envelope(data: Value) -> Value {
    json!({
        "data": data,
        "meta": {
            "requestId": uuid::Uuid::new_v4().to_string(),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        }
    })
}

/// Envelope with a `meta.pagination` block.
pub fn paginated(data: Value, page: u32, per_page: u32, total: u64) -> Value {
    let total_pages = if per_page == 0 {
        0
    } else {
        ((total + u64::from(per_page) - 1) / u64::from(per_page)) as u32
    };
    let mut body = envelope(data);
    body["meta"]["pagination"] = json!({
        "page": page,
        "perPage": per_page,
        "total": total,
        "totalPages": total_pages,
    });
    body
}

/// `{ detail: { message, error_code } }`
pub fn error_detail(message: &str, code: Option<u32>) -> Value {
    match code {
        Some(code) => json!({ "detail": { "message": message, "error_code": code } }),
        None => json!({ "detail": { "message": message } }),
    }
}

/// `{ error, error_code }`
pub fn error_flat(message: &str, code: u32) -> Value {
    json!({ "error": message, "error_code": code })
}

/// A canned response
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub body: Option<Value>,
    pub delay: Option<Duration>,
    pub headers: Vec<(String, String)>,
}

impl MockResponse {
    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            body: Some(body),
            delay: None,
            headers: Vec::new(),
        }
    }

    /// 200 with `data` wrapped in the success envelope.
    pub fn ok(data: Value) -> Self {
        Self::json(200, envelope(data))
    }

    pub fn created(data: Value) -> Self {
        Self::json(201, envelope(data))
    }

    pub fn error(status: u16, message: &str, code: Option<u32>) -> Self {
        Self::json(status, error_detail(message, code))
    }

    pub fn empty(status: u16) -> Self {
        Self {
            status,
            body: None,
            delay: None,
            headers: Vec::new(),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut response = match self.body {
            Some(body) => (status, axum::Json(body)).into_response(),
            None => status.into_response(),
        };
        for (name, value) in self.headers {
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(&value),
            ) {
                response.headers_mut().insert(name, value);
            }
        }
        response
    }
}

/// A request the mock received
#[derive(Debug, Clone)]
pub struct MockRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl MockRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn json(&self) -> Option<Value> {
        serde_json::from_slice(&self.body).ok()
    }

    /// Query pairs in order, repeated keys preserved.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.query
            .as_deref()
            .map(|q| {
                url::form_urlencoded::parse(q.as_bytes())
                    .into_owned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

struct Route {
    method: Method,
    pattern: Vec<String>,
    responses: VecDeque<MockResponse>,
}

impl Route {
    fn matches(&self, method: &Method, path: &str) -> bool {
        if &self.method != method {
            return false;
        }
        let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
        let mut i = 0;
        for part in &self.pattern {
            if part == "*" {
                return true;
            }
            match segments.get(i) {
                Some(seg) if part.starts_with(':') && !seg.is_empty() => {}
                Some(seg) if seg == part => {}
                _ => return false,
            }
            i += 1;
        }
        i == segments.len()
    }

    /// Queued responses are consumed in order; the last one repeats.
    fn next_response(&mut self) -> Option<MockResponse> {
        if self.responses.len() > 1 {
            self.responses.pop_front()
        } else {
            self.responses.front().cloned()
        }
    }
}

#[derive(Default)]
struct MockState {
    routes: Mutex<Vec<Route>>,
    requests: Mutex<Vec<MockRequest>>,
}

/// Handle to a running mock backend; the server stops when this is dropped.
pub struct MockBackend {
    addr: SocketAddr,
    state: Arc<MockState>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl MockBackend {
    pub async fn start() -> E2eResult<Self> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let state = Arc::new(MockState::default());

        let app = Router::new().fallback(handle).with_state(state.clone());
        let (tx, rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            let server = axum::serve(listener, app).with_graceful_shutdown(async {
                let _ = rx.await;
            });
            if let Err(e) = server.await {
                tracing::error!("Mock backend stopped with error: {}", e);
            }
        });

        info!("Mock backend listening on {}", addr);
        Ok(Self {
            addr,
            state,
            shutdown: Some(tx),
        })
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Register (or replace) the response for a route.
    pub fn on(&self, method: Method, path: &str, response: MockResponse) -> &Self {
        self.on_sequence(method, path, vec![response])
    }

    /// Register responses served in order; the last one repeats.
    pub fn on_sequence(&self, method: Method, path: &str, responses: Vec<MockResponse>) -> &Self {
        let pattern: Vec<String> = path
            .trim_matches('/')
            .split('/')
            .map(str::to_string)
            .collect();
        let mut routes = self.state.routes.lock();
        routes.retain(|r| !(r.method == method && r.pattern == pattern));
        routes.push(Route {
            method,
            pattern,
            responses: responses.into(),
        });
        self
    }

    pub fn requests(&self) -> Vec<MockRequest> {
        self.state.requests.lock().clone()
    }

    pub fn requests_to(&self, method: &Method, path: &str) -> Vec<MockRequest> {
        self.state
            .requests
            .lock()
            .iter()
            .filter(|r| &r.method == method && r.path == path)
            .cloned()
            .collect()
    }

    pub fn hits(&self, method: &Method, path: &str) -> usize {
        self.requests_to(method, path).len()
    }

    pub fn reset(&self) {
        self.state.routes.lock().clear();
        self.state.requests.lock().clear();
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

async fn handle(
    State(state): State<Arc<MockState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    debug!("Mock backend received {} {}", method, path);

    state.requests.lock().push(MockRequest {
        method: method.clone(),
        path: path.clone(),
        query: uri.query().map(str::to_string),
        headers,
        body,
    });

    let response = {
        let mut routes = state.routes.lock();
        routes
            .iter_mut()
            .rev()
            .find(|r| r.matches(&method, &path))
            .and_then(Route::next_response)
    };

    match response {
        Some(response) => {
            if let Some(delay) = response.delay {
                tokio::time::sleep(delay).await;
            }
            response.into_response()
        }
        None => MockResponse::error(404, &format!("No mock registered for {} {}", method, path), None)
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(method: Method, path: &str) -> Route {
        Route {
            method,
            pattern: path.trim_matches('/').split('/').map(str::to_string).collect(),
            responses: VecDeque::new(),
        }
    }

    #[test]
    fn test_route_matching() {
        let r = route(Method::GET, "/api/v1/widget/config/:id");
        assert!(r.matches(&Method::GET, "/api/v1/widget/config/abc"));
        assert!(!r.matches(&Method::GET, "/api/v1/widget/config"));
        assert!(!r.matches(&Method::POST, "/api/v1/widget/config/abc"));
        assert!(!r.matches(&Method::GET, "/api/v1/widget/config/abc/extra"));

        let wildcard = route(Method::DELETE, "/api/v1/merchant/*");
        assert!(wildcard.matches(&Method::DELETE, "/api/v1/merchant/faqs/3"));
    }

    #[test]
    fn test_queued_responses_repeat_last() {
        let mut r = route(Method::GET, "/health");
        r.responses = vec![MockResponse::empty(503), MockResponse::empty(200)].into();
        assert_eq!(r.next_response().unwrap().status, 503);
        assert_eq!(r.next_response().unwrap().status, 200);
        assert_eq!(r.next_response().unwrap().status, 200);
    }

    #[test]
    fn test_paginated_meta() {
        let body = paginated(json!([]), 2, 20, 45);
        assert_eq!(body["meta"]["pagination"]["totalPages"], 3);
        assert!(body["meta"]["requestId"].is_string());
    }

    #[test]
    fn test_query_pairs_decode() {
        let req = MockRequest {
            method: Method::GET,
            path: "/x".to_string(),
            query: Some(
                "search=red+shoes&status%5B%5D=active&status%5B%5D=closed&q=caf%C3%A9&flag".to_string(),
            ),
            headers: HeaderMap::new(),
            body: Bytes::new(),
        };
        let pairs = req.query_pairs();
        assert_eq!(pairs[0], ("search".to_string(), "red shoes".to_string()));
        assert_eq!(pairs[1], ("status[]".to_string(), "active".to_string()));
        assert_eq!(pairs[2].1, "closed");
        assert_eq!(pairs[3].1, "café");
        assert_eq!(pairs[4], ("flag".to_string(), String::new()));
    }
}
