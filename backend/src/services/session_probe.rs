//! Bounded source-of-truth session query.

use std::sync::Arc;
use std::time::Duration;

use adapters::{AdapterError, AuthProvider, AuthSession};

#[derive(Clone)]
pub struct SessionProbe {
    provider: Arc<dyn AuthProvider>,
    timeout: Duration,
}

impl SessionProbe {
    pub fn new(provider: Arc<dyn AuthProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    /// Asks the provider for the live session, giving up after the
    /// configured timeout.
    pub async fn live_session(&self) -> Result<Option<AuthSession>, AdapterError> {
        match tokio::time::timeout(self.timeout, self.provider.current_session()).await {
            Ok(result) => result,
            Err(_) => Err(AdapterError::Timeout(self.timeout)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adapters::MemoryBackend;

    #[tokio::test(start_paused = true)]
    async fn slow_provider_times_out() {
        let backend = Arc::new(MemoryBackend::new().with_latency(Duration::from_secs(10)));
        let probe = SessionProbe::new(backend, Duration::from_secs(5));
        assert_eq!(
            probe.live_session().await,
            Err(AdapterError::Timeout(Duration::from_secs(5)))
        );
    }

    #[tokio::test]
    async fn returns_live_session() {
        let backend = Arc::new(MemoryBackend::new());
        backend.set_live_session(Some(AuthSession::for_subject("u1")));
        let probe = SessionProbe::new(backend, Duration::from_secs(5));
        let session = probe.live_session().await.unwrap();
        assert_eq!(session.as_ref().map(AuthSession::subject), Some("u1"));
    }
}
