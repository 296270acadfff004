//! Custom error types specific to authentication failures.
//!
//! `LoadError` separates the three ways a profile load can fail: the user is
//! definitively not a user of the portal, the user exists but is gated out,
//! or the backend could not be reached. Only the last one is transient.

use adapters::{AccessStatus, AdapterError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("no user record for subject {subject}")]
    NotFound { subject: String },

    #[error("access disabled for subject {subject}")]
    AccessDisabled { subject: String },

    #[error("access status is {status} for subject {subject}")]
    NotApproved {
        subject: String,
        status: AccessStatus,
    },

    #[error("all retries exhausted after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: AdapterError },

    #[error("profile lookup rejected: {0}")]
    Backend(AdapterError),
}

impl LoadError {
    /// True when the failure says nothing about the user, only about the
    /// backend being unreachable.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RetriesExhausted { .. })
    }

    /// True when the user row was read and failed the access gate.
    pub fn is_access_denied(&self) -> bool {
        matches!(self, Self::AccessDisabled { .. } | Self::NotApproved { .. })
    }
}
