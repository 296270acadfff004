//! Data structures for authentication-related entities.
//!
//! This module defines the normalized application user, the reconciliation
//! state published to the rest of the application, and the outcome reported
//! for every auth event the reconciler receives.

use adapters::{AccessStatus, AuthSession, UserRow};
use serde::Serialize;

/// Role name shown when the role join is missing.
pub const DEFAULT_ROLE_NAME: &str = "User";

/// The authorization-relevant profile of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppUser {
    pub id: String,
    pub email: String,
    pub full_name: Option<String>,
    pub role: String,
    pub role_code: Option<String>,
    pub role_color: Option<String>,
    pub access_status: AccessStatus,
    pub allowed_pages: Vec<String>,
    pub access_enabled: bool,
}

impl AppUser {
    /// Normalizes a store row. Gating happens in the profile loader, not here.
    pub fn from_row(row: UserRow) -> Self {
        let (role, role_color, joined_code) = match row.role {
            Some(role) => (role.name, role.color, Some(role.code)),
            None => (DEFAULT_ROLE_NAME.to_string(), None, None),
        };
        Self {
            id: row.id,
            email: row.email,
            full_name: row.full_name,
            role,
            role_code: row.role_code.or(joined_code),
            role_color,
            access_status: row.access_status,
            allowed_pages: row.allowed_pages.unwrap_or_default(),
            access_enabled: row.access_enabled,
        }
    }

    pub fn is_subject(&self, session: &AuthSession) -> bool {
        self.id == session.subject()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "user", rename_all = "snake_case")]
pub enum ReconciliationState {
    #[default]
    Uninitialized,
    Resolving,
    Resolved(Option<AppUser>),
}

impl ReconciliationState {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    pub fn current_user(&self) -> Option<&AppUser> {
        match self {
            Self::Resolved(user) => user.as_ref(),
            Self::Uninitialized | Self::Resolving => None,
        }
    }

    /// True when the state is already resolved to the identity `session`
    /// carries (both absent counts as a match).
    pub fn is_resolved_for(&self, session: Option<&AuthSession>) -> bool {
        match (self, session) {
            (Self::Resolved(None), None) => true,
            (Self::Resolved(Some(user)), Some(session)) => user.is_subject(session),
            _ => false,
        }
    }
}

/// What the reconciler did with one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventOutcome {
    /// Another event was in flight.
    Dropped,
    /// Nothing to do; the state already reflects the event.
    Ignored,
    /// Resolution deferred to the optimistic fallback timer.
    Deferred,
    /// The state was (re)resolved.
    Resolved,
    /// Profile reload failed; the existing user was kept.
    Kept,
    /// A sign-out was found to be spurious.
    Vetoed,
    /// The existing user was forcibly removed.
    Evicted,
}
