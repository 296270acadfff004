//! Generic data models for the `adapters` crate.
//!
//! These models mirror what the hosted backend hands out: sessions issued by
//! the auth provider, user rows joined with their role, and the auth state
//! notifications pushed to the client. They are the raw shapes; the backend
//! crate normalizes them before anything else sees them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque proof of a successful external authentication.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityToken {
    pub subject: String,
    #[serde(default)]
    pub access_token: String,
}

impl IdentityToken {
    pub fn new(subject: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            access_token: access_token.into(),
        }
    }
}

impl fmt::Debug for IdentityToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityToken")
            .field("subject", &self.subject)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

/// A live session as reported by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub identity: IdentityToken,
    /// Unix seconds.
    #[serde(default)]
    pub expires_at: Option<u64>,
}

impl AuthSession {
    pub fn new(identity: IdentityToken) -> Self {
        Self {
            identity,
            expires_at: None,
        }
    }

    /// Shorthand for a session with a throwaway access token.
    pub fn for_subject(subject: impl Into<String>) -> Self {
        let subject = subject.into();
        let token = format!("token-{subject}");
        Self::new(IdentityToken::new(subject, token))
    }

    pub fn subject(&self) -> &str {
        &self.identity.subject
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessStatus {
    Pending,
    Approved,
    Blocked,
}

impl fmt::Display for AccessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Blocked => "blocked",
        };
        f.write_str(s)
    }
}

/// Role metadata joined onto a user row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRow {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

/// A user row with its role join, exactly as the store returns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRow {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub role_code: Option<String>,
    pub access_status: AccessStatus,
    #[serde(default)]
    pub allowed_pages: Option<Vec<String>>,
    pub access_enabled: bool,
    #[serde(default)]
    pub role: Option<RoleRow>,
}

impl UserRow {
    /// An enabled, approved row without a role join.
    pub fn approved(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            full_name: None,
            role_code: None,
            access_status: AccessStatus::Approved,
            allowed_pages: None,
            access_enabled: true,
            role: None,
        }
    }
}

/// Auth state notifications. Delivery is at-least-once and unordered, and
/// `SignedOut` may be spurious.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuthEvent {
    InitialSession {
        #[serde(default)]
        session: Option<AuthSession>,
    },
    SignedIn {
        session: AuthSession,
    },
    SignedOut,
    TokenRefreshed {
        session: AuthSession,
    },
    UserUpdated {
        session: AuthSession,
    },
}

impl AuthEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InitialSession { .. } => "initial_session",
            Self::SignedIn { .. } => "signed_in",
            Self::SignedOut => "signed_out",
            Self::TokenRefreshed { .. } => "token_refreshed",
            Self::UserUpdated { .. } => "user_updated",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_debug_redacts_access_token() {
        let token = IdentityToken::new("u1", "secret-jwt");
        let rendered = format!("{token:?}");
        assert!(rendered.contains("u1"));
        assert!(!rendered.contains("secret-jwt"));
    }

    #[test]
    fn events_parse_from_tagged_json() {
        let event: AuthEvent = serde_json::from_str(
            r#"{"event":"token_refreshed","session":{"identity":{"subject":"u2"}}}"#,
        )
        .unwrap();
        assert_eq!(event.kind(), "token_refreshed");
        assert!(matches!(&event, AuthEvent::TokenRefreshed { session } if session.subject() == "u2"));

        let event: AuthEvent = serde_json::from_str(r#"{"event":"initial_session"}"#).unwrap();
        assert_eq!(event, AuthEvent::InitialSession { session: None });

        let event: AuthEvent = serde_json::from_str(r#"{"event":"signed_out"}"#).unwrap();
        assert_eq!(event, AuthEvent::SignedOut);
    }

    #[test]
    fn user_row_tolerates_missing_optional_columns() {
        let row: UserRow = serde_json::from_str(
            r#"{"id":"u1","email":"a@b.c","access_status":"pending","access_enabled":true}"#,
        )
        .unwrap();
        assert_eq!(row.access_status, AccessStatus::Pending);
        assert!(row.allowed_pages.is_none());
        assert!(row.role.is_none());
    }
}
