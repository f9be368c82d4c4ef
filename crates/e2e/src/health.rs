//! Fail-fast preconditions and never-failing cleanup
//!
//! [`health_check`] runs once before a suite so an unreachable backend fails
//! everything immediately with one clear error. [`create_session_or_throw`]
//! applies the same rule to widget sessions. Cleanup goes the other way:
//! [`safe_cleanup`] logs what went wrong and returns, so teardown can never
//! mask the result of the test it follows.

use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiResponse};
use crate::error::{CleanupError, E2eError, E2eResult};

/// GET `{base_url}/health` within `timeout`; anything but 200 is an error.
pub async fn health_check(client: &reqwest::Client, base_url: &str, timeout: Duration) -> E2eResult<()> {
    let url = format!("{}/health", base_url.trim_end_matches('/'));
    debug!("Health check {}", url);

    let response = client
        .get(&url)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| E2eError::BackendUnavailable {
            url: url.clone(),
            reason: if e.is_timeout() {
                format!("no response within {}ms", timeout.as_millis())
            } else {
                e.to_string()
            },
        })?;

    let status = response.status().as_u16();
    if status != 200 {
        let body = response.text().await.unwrap_or_default();
        return Err(E2eError::BackendUnavailable {
            url,
            reason: format!("health returned {}: {}", status, body),
        });
    }

    info!("Backend healthy at {}", base_url);
    Ok(())
}

/// Health check against the client's configured API URL.
pub async fn health_check_api(api: &ApiClient) -> E2eResult<()> {
    health_check(api.http(), &api.config().api_url, api.config().health_timeout).await
}

/// Create a widget session or fail; never hands back a missing id.
pub async fn create_session_or_throw(api: &ApiClient, merchant_id: &str) -> E2eResult<String> {
    let response = api.create_widget_session(merchant_id).await?;
    if !matches!(response.status, 200 | 201) {
        return Err(E2eError::UnexpectedStatus {
            endpoint: response.endpoint,
            status: response.status,
            body: response.body.to_string(),
        });
    }
    let created = shopbot_common::SessionCreated::decode(&response.body)?;
    debug!("Created widget session {}", created.session_id());
    Ok(created.session_id().to_string())
}

/// Run one cleanup request and classify the outcome.
///
/// 2xx and 404 count as cleaned up.
pub async fn cleanup_request<F>(resource: &str, request: F) -> Result<(), CleanupError>
where
    F: Future<Output = E2eResult<ApiResponse>>,
{
    match request.await {
        Ok(response) if response.is_success() || response.status == 404 => Ok(()),
        Ok(response) => Err(CleanupError::Status {
            resource: resource.to_string(),
            status: response.status,
        }),
        Err(E2eError::Http(source)) => Err(CleanupError::Request {
            resource: resource.to_string(),
            source,
        }),
        Err(other) => Err(CleanupError::Other {
            resource: resource.to_string(),
            reason: other.to_string(),
        }),
    }
}

pub async fn try_cleanup_session(api: &ApiClient, session_id: &str) -> Result<(), CleanupError> {
    cleanup_request(
        &format!("widget session {}", session_id),
        api.end_widget_session(session_id),
    )
    .await
}

pub async fn try_cleanup_merchant(api: &ApiClient, merchant_key: &str) -> Result<(), CleanupError> {
    cleanup_request(&format!("merchant {}", merchant_key), api.delete_merchant(merchant_key)).await
}

/// End a widget session, logging any failure. Always returns.
pub async fn safe_cleanup(api: &ApiClient, session_id: &str) {
    if let Err(e) = try_cleanup_session(api, session_id).await {
        warn!("Cleanup failed (ignored): {}", e);
    }
}

/// Cleanup outcomes collected over a teardown phase
#[derive(Debug, Default)]
pub struct CleanupLog {
    entries: Vec<(String, Result<(), CleanupError>)>,
}

impl CleanupLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, resource: impl Into<String>, result: Result<(), CleanupError>) {
        let resource = resource.into();
        if let Err(e) = &result {
            warn!("Cleanup failed (ignored): {}", e);
        }
        self.entries.push((resource, result));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &CleanupError)> {
        self.entries
            .iter()
            .filter_map(|(r, res)| res.as_ref().err().map(|e| (r.as_str(), e)))
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} cleanup(s), {} failed",
            self.entries.len(),
            self.failure_count()
        )
    }
}
