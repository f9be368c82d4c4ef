//! Backend response envelope decoding
//!
//! Success bodies look like `{ "data": ..., "meta": { "requestId", "timestamp", "pagination"? } }`.
//! Failures come in three shapes depending on which layer produced them:
//!
//! ```text
//! { "detail": { "message": "...", "error_code": 2001 } }   structured API error
//! { "detail": "Not authenticated" }                         framework error
//! { "error": "...", "error_code": 12003 }                   flat middleware error
//! ```
//!
//! Anything else is reported as [`Error::UnknownShape`] so a contract change
//! surfaces as a decode failure rather than as a silently wrong field.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// Opaque numeric error code returned by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorCode(pub u32);

impl ErrorCode {
    pub const CSRF_INVALID: ErrorCode = ErrorCode(2001);
    pub const LLM_PROVIDER_NOT_FOUND: ErrorCode = ErrorCode(3018);
    pub const LLM_PROVIDER_INVALID_KEY: ErrorCode = ErrorCode(3019);
    pub const LLM_PROVIDER_SWITCH_FAILED: ErrorCode = ErrorCode(3020);
    pub const LLM_PROVIDER_VALIDATION_FAILED: ErrorCode = ErrorCode(3021);
    pub const LLM_PROVIDER_UNAVAILABLE: ErrorCode = ErrorCode(3022);
    pub const WIDGET_RATE_LIMITED: ErrorCode = ErrorCode(12003);
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
    #[serde(default)]
    pub total_pages: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    pub request_id: String,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

/// Decoded response: either the envelope payload or the backend's error
#[derive(Debug, Clone, PartialEq)]
pub enum ApiOutcome {
    Success {
        data: Value,
        meta: Option<Meta>,
    },
    Failure {
        status: u16,
        message: String,
        code: Option<ErrorCode>,
    },
}

impl ApiOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ApiOutcome::Success { .. })
    }

    pub fn error_code(&self) -> Option<ErrorCode> {
        match self {
            ApiOutcome::Failure { code, .. } => *code,
            ApiOutcome::Success { .. } => None,
        }
    }

    /// Deserialize the success payload into a concrete type.
    pub fn data<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        match self {
            ApiOutcome::Success { data, .. } => Ok(serde_json::from_value(data.clone())?),
            ApiOutcome::Failure { status, message, .. } => Err(Error::InvalidValue {
                field: "data".to_string(),
                reason: format!("response was a {} failure: {}", status, message),
            }),
        }
    }
}

fn parse_code(value: Option<&Value>) -> Option<ErrorCode> {
    match value? {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()).map(ErrorCode),
        Value::String(s) => s.parse().ok().map(ErrorCode),
        _ => None,
    }
}

/// Decode a response body according to its HTTP status.
pub fn decode_envelope(status: u16, body: &Value) -> Result<ApiOutcome> {
    if (200..300).contains(&status) {
        let data = body
            .get("data")
            .ok_or_else(|| Error::unknown_shape("success envelope", body))?;
        let meta = match body.get("meta") {
            Some(meta) => Some(serde_json::from_value(meta.clone())?),
            None => None,
        };
        return Ok(ApiOutcome::Success {
            data: data.clone(),
            meta,
        });
    }

    if let Some(detail) = body.get("detail") {
        return match detail {
            Value::Object(obj) => {
                let message = obj
                    .get("message")
                    .and_then(Value::as_str)
                    .ok_or_else(|| Error::unknown_shape("error detail", body))?;
                Ok(ApiOutcome::Failure {
                    status,
                    message: message.to_string(),
                    code: parse_code(obj.get("error_code")),
                })
            }
            Value::String(message) => Ok(ApiOutcome::Failure {
                status,
                message: message.clone(),
                code: None,
            }),
            // FastAPI validation errors carry a list of field errors
            Value::Array(items) => Ok(ApiOutcome::Failure {
                status,
                message: items
                    .iter()
                    .filter_map(|item| item.get("msg").and_then(Value::as_str))
                    .collect::<Vec<_>>()
                    .join("; "),
                code: None,
            }),
            _ => Err(Error::unknown_shape("error detail", body)),
        };
    }

    if let Some(error) = body.get("error").and_then(Value::as_str) {
        return Ok(ApiOutcome::Failure {
            status,
            message: error.to_string(),
            code: parse_code(body.get("error_code")),
        });
    }

    Err(Error::unknown_shape("error envelope", body))
}

/// Widget session creation response, by the shape the backend returned
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCreated {
    /// `{ "data": { "sessionId": ... } }`
    DataCamel(String),
    /// `{ "data": { "session_id": ... } }`
    DataSnake(String),
    /// `{ "session": { "session_id": ... } }`
    LegacySession(String),
}

impl SessionCreated {
    pub fn decode(body: &Value) -> Result<Self> {
        let string_at = |outer: &str, inner: &str| {
            body.get(outer)
                .and_then(|o| o.get(inner))
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        if let Some(id) = string_at("data", "sessionId") {
            return Ok(SessionCreated::DataCamel(id));
        }
        if let Some(id) = string_at("data", "session_id") {
            return Ok(SessionCreated::DataSnake(id));
        }
        if let Some(id) = string_at("session", "session_id") {
            tracing::debug!("widget session returned in legacy shape");
            return Ok(SessionCreated::LegacySession(id));
        }
        Err(Error::unknown_shape("widget session", body))
    }

    pub fn session_id(&self) -> &str {
        match self {
            SessionCreated::DataCamel(id)
            | SessionCreated::DataSnake(id)
            | SessionCreated::LegacySession(id) => id,
        }
    }
}
