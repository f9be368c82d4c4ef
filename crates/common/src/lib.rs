//! Shopbot Common Library
//!
//! Value types shared by the Shopbot test harness: the domain records the
//! factories produce, and the decoder for the backend's response envelope.

pub mod envelope;
pub mod error;
pub mod theme;
pub mod types;

// Re-export commonly used types
pub use envelope::{decode_envelope, ApiOutcome, ErrorCode, Meta, Pagination, SessionCreated};
pub use error::{Error, Result};
pub use theme::{ThemeConstraint, ThemeViolation, WidgetTheme, THEME_CONSTRAINTS};
pub use types::*;

/// Harness version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
