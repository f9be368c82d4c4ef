//! Error types for Shopbot common types

use thiserror::Error;

/// Result type alias using the common Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while validating or decoding harness values
#[derive(Error, Debug)]
pub enum Error {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unknown response shape for {context}: {body}")]
    UnknownShape { context: String, body: String },

    #[error("Invariant violated on {entity}: {detail}")]
    Invariant { entity: String, detail: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

impl Error {
    pub fn unknown_shape(context: impl Into<String>, body: &serde_json::Value) -> Self {
        Error::UnknownShape {
            context: context.into(),
            body: body.to_string(),
        }
    }

    pub fn invariant(entity: impl Into<String>, detail: impl Into<String>) -> Self {
        Error::Invariant {
            entity: entity.into(),
            detail: detail.into(),
        }
    }
}
