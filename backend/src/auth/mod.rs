//! Authentication module for reconciling the signed-in user.
//!
//! This module provides the public interface for session-related functionality:
//! the reconciliation state machine, its published state, the sign-out
//! verification handler, and the page access guard built on top of the
//! resolved user.
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod service;
pub mod state;

// Re-exports for convenience
pub use errors::*;
pub use handlers::*;
pub use middleware::*;
pub use models::*;
pub use service::*;
pub use state::*;
