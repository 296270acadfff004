//! Handler for `signed_out` notifications.
//!
//! The provider can report a sign-out when an internal token refresh fails
//! even though the session is still valid. Before discarding a resolved user,
//! the handler asks the source of truth whether that user still has a live
//! session, and vetoes the teardown if so.

use crate::services::SessionProbe;

use super::models::AppUser;

#[derive(Clone)]
pub struct TeardownHandler {
    probe: SessionProbe,
}

impl TeardownHandler {
    pub fn new(probe: SessionProbe) -> Self {
        Self { probe }
    }

    /// Returns true when the local session should be torn down.
    ///
    /// A failed verification tears down: a lingering privileged session is
    /// worse than an unnecessary re-login.
    pub async fn should_tear_down(&self, current: Option<&AppUser>) -> bool {
        let Some(user) = current else {
            return true;
        };

        match self.probe.live_session().await {
            Ok(Some(session)) if user.is_subject(&session) => {
                tracing::info!(subject = %user.id, "ignoring spurious sign-out, session still live");
                false
            }
            Ok(Some(session)) => {
                tracing::warn!(
                    subject = %user.id,
                    live_subject = %session.subject(),
                    "live session belongs to another subject, tearing down"
                );
                true
            }
            Ok(None) => {
                tracing::info!(subject = %user.id, "sign-out confirmed");
                true
            }
            Err(err) => {
                tracing::warn!(subject = %user.id, error = %err, "sign-out verification failed, tearing down");
                true
            }
        }
    }
}
