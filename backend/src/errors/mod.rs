//! Global application error types.
//!
//! The reconciliation core never returns errors to its callers; these types
//! cover the replay binary around it: reading configuration, fixtures and
//! event scripts.

use adapters::AdapterError;
use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to open {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Adapter(#[from] AdapterError),
    #[error("failed to install log subscriber: {0}")]
    Logging(String),
}

pub type Result<T> = std::result::Result<T, AppError>;
