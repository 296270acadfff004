//! Session reconciliation core for the Tenderdesk portal.
//!
//! The portal delegates authentication to a hosted provider whose auth
//! notifications are unordered, duplicated and sometimes wrong. This crate
//! turns that stream into one authoritative "current user", published
//! through a watch channel and consumed by the page access guard.

pub mod auth;
pub mod config;
pub mod errors;
pub mod script;
pub mod services;

pub use auth::{
    AccessDecision, AccessGuard, AppUser, EventOutcome, ReconciliationState, SessionHandle,
    SessionReconciler,
};
pub use config::{Config, ReconcilerConfig};
