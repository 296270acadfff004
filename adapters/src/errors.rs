//! Custom error types specific to the `adapters` crate.
//!
//! This module defines errors that can occur while talking to the hosted
//! backend: transport failures, missing rows, backend error codes, and bad
//! fixture data. Each error knows whether it is transient, so callers can
//! decide between retrying and giving up without inspecting strings.

use std::time::Duration;

use thiserror::Error;

/// Postgres `query_canceled`, returned by the hosted backend when a
/// statement exceeds its timeout.
pub const STATEMENT_TIMEOUT_CODE: &str = "57014";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdapterError {
    #[error("request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
    #[error("network error: {0}")]
    Network(String),
    #[error("row not found")]
    NotFound,
    #[error("backend error {code}: {message}")]
    Backend { code: String, message: String },
    #[error("invalid fixture: {0}")]
    Fixture(String),
}

impl AdapterError {
    /// Returns true when repeating the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::Network(_) => true,
            Self::Backend { code, .. } => code == STATEMENT_TIMEOUT_CODE,
            Self::NotFound | Self::Fixture(_) => false,
        }
    }

    pub fn backend(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Backend {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for AdapterError {
    fn from(err: serde_json::Error) -> Self {
        Self::Fixture(err.to_string())
    }
}
