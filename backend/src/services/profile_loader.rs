//! Loads the application user behind an identity token.
//!
//! The loader reads the user row (with its role join) from the store, retries
//! transient failures with exponential backoff, and applies the access gate:
//! a disabled or unapproved user is reported as an error, never returned.

use std::sync::Arc;
use std::time::Duration;

use adapters::{AccessStatus, AdapterError, IdentityToken, UserStore};

use crate::auth::errors::LoadError;
use crate::auth::models::AppUser;
use crate::config::ReconcilerConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &ReconcilerConfig) -> Self {
        Self {
            max_attempts: config.profile_max_attempts,
            base_delay: config.profile_base_delay(),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&ReconcilerConfig::default())
    }
}

#[derive(Clone)]
pub struct ProfileLoader {
    store: Arc<dyn UserStore>,
    policy: RetryPolicy,
}

impl ProfileLoader {
    pub fn new(store: Arc<dyn UserStore>, policy: RetryPolicy) -> Self {
        Self { store, policy }
    }

    pub async fn load(&self, token: &IdentityToken) -> Result<AppUser, LoadError> {
        let row = self.fetch_with_retry(&token.subject).await?;

        if !row.access_enabled {
            return Err(LoadError::AccessDisabled { subject: row.id });
        }
        if row.access_status != AccessStatus::Approved {
            return Err(LoadError::NotApproved {
                subject: row.id,
                status: row.access_status,
            });
        }
        Ok(AppUser::from_row(row))
    }

    async fn fetch_with_retry(&self, subject: &str) -> Result<adapters::UserRow, LoadError> {
        let mut attempt: u32 = 0;
        let mut delay = self.policy.base_delay;

        loop {
            attempt += 1;
            let err = match self.store.fetch_user(subject).await {
                Ok(row) => return Ok(row),
                Err(err) => err,
            };

            match err {
                AdapterError::NotFound => {
                    return Err(LoadError::NotFound {
                        subject: subject.to_string(),
                    })
                }
                err if !err.is_transient() => return Err(LoadError::Backend(err)),
                err if attempt >= self.policy.max_attempts => {
                    tracing::warn!(subject, attempts = attempt, error = %err, "profile load retries exhausted");
                    return Err(LoadError::RetriesExhausted {
                        attempts: attempt,
                        last_error: err,
                    });
                }
                err => {
                    tracing::debug!(
                        subject,
                        attempt,
                        backoff_ms = delay.as_millis() as u64,
                        error = %err,
                        "retrying profile load after backoff"
                    );
                }
            }

            tokio::time::sleep(delay).await;
            delay = delay.saturating_mul(2);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adapters::{MemoryBackend, RoleRow, UserRow, STATEMENT_TIMEOUT_CODE};
    use tokio::time::Instant;

    fn loader(backend: &Arc<MemoryBackend>) -> ProfileLoader {
        ProfileLoader::new(
            backend.clone(),
            RetryPolicy {
                max_attempts: 3,
                base_delay: Duration::from_millis(100),
            },
        )
    }

    fn token(subject: &str) -> IdentityToken {
        IdentityToken::new(subject, "t")
    }

    #[tokio::test]
    async fn loads_normalized_user() {
        let backend = Arc::new(MemoryBackend::new());
        let mut row = UserRow::approved("u1", "u1@example.com");
        row.role = Some(RoleRow {
            code: "admin".into(),
            name: "Administrator".into(),
            color: None,
        });
        backend.insert_user(row);

        let user = loader(&backend).load(&token("u1")).await.unwrap();
        assert_eq!(user.role, "Administrator");
        assert_eq!(backend.fetch_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_transient_errors_with_doubling_backoff() {
        let backend = Arc::new(MemoryBackend::new());
        backend.insert_user(UserRow::approved("u1", "u1@example.com"));
        backend.fail_fetches(AdapterError::backend(STATEMENT_TIMEOUT_CODE, "timeout"), 2);

        let started = Instant::now();
        let user = loader(&backend).load(&token("u1")).await.unwrap();
        assert_eq!(user.id, "u1");
        assert_eq!(backend.fetch_calls(), 3);
        // 100ms then 200ms
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(300), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(400), "{elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts() {
        let backend = Arc::new(MemoryBackend::new());
        backend.insert_user(UserRow::approved("u1", "u1@example.com"));
        backend.fail_fetches(AdapterError::Timeout(Duration::from_secs(1)), 5);

        let err = loader(&backend).load(&token("u1")).await.unwrap_err();
        assert!(matches!(err, LoadError::RetriesExhausted { attempts: 3, .. }));
        assert!(err.is_transient());
        assert_eq!(backend.fetch_calls(), 3);
    }

    #[tokio::test]
    async fn not_found_is_not_retried() {
        let backend = Arc::new(MemoryBackend::new());
        let err = loader(&backend).load(&token("ghost")).await.unwrap_err();
        assert_eq!(
            err,
            LoadError::NotFound {
                subject: "ghost".into()
            }
        );
        assert_eq!(backend.fetch_calls(), 1);
    }

    #[tokio::test]
    async fn definitive_backend_errors_are_not_retried() {
        let backend = Arc::new(MemoryBackend::new());
        backend.fail_fetches(AdapterError::backend("42501", "permission denied"), 3);
        let err = loader(&backend).load(&token("u1")).await.unwrap_err();
        assert!(matches!(err, LoadError::Backend(_)));
        assert_eq!(backend.fetch_calls(), 1);
    }

    #[tokio::test]
    async fn disabled_and_unapproved_users_are_rejected() {
        let backend = Arc::new(MemoryBackend::new());
        let mut disabled = UserRow::approved("off", "off@example.com");
        disabled.access_enabled = false;
        backend.insert_user(disabled);
        let mut pending = UserRow::approved("new", "new@example.com");
        pending.access_status = AccessStatus::Pending;
        backend.insert_user(pending);

        let loader = loader(&backend);
        let err = loader.load(&token("off")).await.unwrap_err();
        assert!(matches!(err, LoadError::AccessDisabled { .. }));
        let err = loader.load(&token("new")).await.unwrap_err();
        assert!(matches!(
            err,
            LoadError::NotApproved {
                status: AccessStatus::Pending,
                ..
            }
        ));
    }
}
