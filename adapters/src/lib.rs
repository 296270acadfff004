//! Core `adapters` crate for abstracting the hosted backend.
//!
//! This crate defines the `AuthProvider` and `UserStore` traits, which outline
//! the two calls the session core makes against the hosted backend-as-a-service,
//! and provides an in-memory implementation of both (`MemoryBackend`) used by
//! the session replay tool and the test suites.

pub mod errors;
pub mod memory;
pub mod models;

use async_trait::async_trait;

pub use errors::{AdapterError, STATEMENT_TIMEOUT_CODE};
pub use memory::{Fixture, MemoryBackend};
pub use models::{AccessStatus, AuthEvent, AuthSession, IdentityToken, RoleRow, UserRow};

/// Source of truth for "is there a live session right now".
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn current_session(&self) -> Result<Option<AuthSession>, AdapterError>;
}

/// Queryable user table keyed by subject id.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fetches the user row together with its role join in one query.
    async fn fetch_user(&self, subject: &str) -> Result<UserRow, AdapterError>;
}
