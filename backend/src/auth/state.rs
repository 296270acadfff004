//! Published session state.
//!
//! The reconciler owns the only `SessionStore`; everything else holds a
//! `SessionHandle` and observes changes through a watch channel.

use tokio::sync::watch;

use super::models::{AppUser, ReconciliationState};

#[derive(Debug)]
pub struct SessionStore {
    tx: watch::Sender<ReconciliationState>,
}

impl SessionStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ReconciliationState::Uninitialized);
        Self { tx }
    }

    pub fn snapshot(&self) -> ReconciliationState {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> SessionHandle {
        SessionHandle {
            rx: self.tx.subscribe(),
        }
    }

    /// Moves to `Resolving` unless already there. Returns true on change.
    pub(crate) fn begin_resolving(&self) -> bool {
        self.tx.send_if_modified(|state| {
            if matches!(state, ReconciliationState::Resolving) {
                false
            } else {
                *state = ReconciliationState::Resolving;
                true
            }
        })
    }

    pub(crate) fn resolve(&self, user: Option<AppUser>) {
        let next = ReconciliationState::Resolved(user);
        self.tx.send_if_modified(|state| {
            if *state == next {
                false
            } else {
                *state = next;
                true
            }
        });
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Read side of the session state.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    rx: watch::Receiver<ReconciliationState>,
}

impl SessionHandle {
    pub fn state(&self) -> ReconciliationState {
        self.rx.borrow().clone()
    }

    pub fn current_user(&self) -> Option<AppUser> {
        self.rx.borrow().current_user().cloned()
    }

    pub fn is_resolved(&self) -> bool {
        self.rx.borrow().is_resolved()
    }

    /// Waits for the next published change. Returns false once the
    /// reconciler is gone.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }

    /// Waits until the state is resolved and returns the resolved user.
    /// Returns `None` immediately if the reconciler is dropped first.
    pub async fn wait_resolved(&mut self) -> Option<AppUser> {
        match self.rx.wait_for(ReconciliationState::is_resolved).await {
            Ok(state) => state.current_user().cloned(),
            Err(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adapters::UserRow;

    fn user(id: &str) -> AppUser {
        AppUser::from_row(UserRow::approved(id, format!("{id}@example.com")))
    }

    #[test]
    fn readers_see_writes() {
        let store = SessionStore::new();
        let handle = store.subscribe();
        assert_eq!(handle.state(), ReconciliationState::Uninitialized);

        assert!(store.begin_resolving());
        assert!(!store.begin_resolving());
        assert!(!handle.is_resolved());

        store.resolve(Some(user("u1")));
        assert!(handle.is_resolved());
        assert_eq!(handle.current_user().map(|u| u.id), Some("u1".to_string()));
    }

    #[tokio::test]
    async fn wait_resolved_returns_user_once_published() {
        let store = SessionStore::new();
        let mut handle = store.subscribe();
        store.begin_resolving();

        let waiter = tokio::spawn(async move { handle.wait_resolved().await });
        tokio::task::yield_now().await;
        store.resolve(Some(user("u7")));

        let resolved = waiter.await.unwrap();
        assert_eq!(resolved.map(|u| u.id), Some("u7".to_string()));
    }

    #[tokio::test]
    async fn identical_resolution_does_not_notify() {
        let store = SessionStore::new();
        store.resolve(None);
        let mut handle = store.subscribe();
        store.resolve(None);

        let notified =
            tokio::time::timeout(std::time::Duration::from_millis(10), handle.changed()).await;
        assert!(notified.is_err());
    }
}
