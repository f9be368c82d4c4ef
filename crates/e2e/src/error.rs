//! Error types for the E2E harness

use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Server failed to start: {0}")]
    ServerStartup(String),

    #[error("Server health check failed after {0} attempts")]
    ServerHealthCheck(usize),

    #[error("Backend unreachable at {url}: {reason}")]
    BackendUnavailable { url: String, reason: String },

    #[error("Setup failed: {0}")]
    Setup(String),

    #[error("Unexpected status {status} from {endpoint}: {body}")]
    UnexpectedStatus {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("Playwright not found. Install with: npx playwright install")]
    PlaywrightNotFound,

    #[error("Playwright error: {0}")]
    Playwright(String),

    #[error("Scenario parse error: {0}")]
    ScenarioParse(String),

    #[error("Unknown selector reference: {0}")]
    UnknownSelector(String),

    #[error("Step failed: {step} - {reason}")]
    StepFailed { step: String, reason: String },

    #[error("Assertion failed: {message} (expected {expected}, actual {actual})")]
    AssertionFailed {
        message: String,
        expected: String,
        actual: String,
    },

    #[error("Performance threshold exceeded: {name} took {actual_ms}ms (threshold: {threshold_ms}ms)")]
    ThresholdExceeded {
        name: String,
        actual_ms: u64,
        threshold_ms: u64,
    },

    #[error("Timeout waiting for: {0}")]
    Timeout(String),

    #[error("Response decode error: {0}")]
    Decode(#[from] shopbot_common::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl E2eError {
    pub fn assertion(
        message: impl Into<String>,
        expected: impl std::fmt::Display,
        actual: impl std::fmt::Display,
    ) -> Self {
        E2eError::AssertionFailed {
            message: message.into(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }
}

pub type E2eResult<T> = Result<T, E2eError>;

/// Failure while tearing down test data; reported, never propagated into the test result
#[derive(Error, Debug)]
pub enum CleanupError {
    #[error("cleanup request for {resource} failed: {source}")]
    Request {
        resource: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("cleanup of {resource} returned status {status}")]
    Status { resource: String, status: u16 },

    #[error("cleanup of {resource} failed: {reason}")]
    Other { resource: String, reason: String },
}
