//! Core business logic for the authentication system.
//!
//! `SessionReconciler` keeps one authoritative "current user" while consuming
//! the auth provider's notifications, which arrive unordered, duplicated, and
//! occasionally spurious. Two rules drive every transition: the canonical
//! `initial_session` wins over the optimistic `signed_in`, and no negative
//! signal tears down a resolved user without first checking the source of
//! truth.
//!
//! Events are processed one at a time behind a single-flight guard; events
//! arriving meanwhile are dropped. Two fallback timers guarantee the state
//! still resolves when the expected notification never comes: the optimistic
//! timer armed by `signed_in`, and the mount timer armed by [`start`].
//!
//! [`start`]: SessionReconciler::start

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use adapters::{AuthEvent, AuthProvider, AuthSession, UserStore};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::ReconcilerConfig;
use crate::services::{FallbackTimer, FlightPermit, ProfileLoader, RetryPolicy, SessionProbe, SingleFlight};

use super::handlers::TeardownHandler;
use super::models::{AppUser, EventOutcome, ReconciliationState};
use super::state::{SessionHandle, SessionStore};

struct Inner {
    config: ReconcilerConfig,
    store: SessionStore,
    flight: SingleFlight,
    loader: ProfileLoader,
    probe: SessionProbe,
    teardown: TeardownHandler,
    optimistic_timer: FallbackTimer,
    mount_timer: FallbackTimer,
    /// Bumped by every `settle`.
    resolutions: AtomicU64,
}

#[derive(Clone)]
pub struct SessionReconciler {
    inner: Arc<Inner>,
}

impl SessionReconciler {
    pub fn new(
        config: ReconcilerConfig,
        provider: Arc<dyn AuthProvider>,
        users: Arc<dyn UserStore>,
    ) -> Self {
        let probe = SessionProbe::new(provider, config.status_check_timeout());
        let inner = Inner {
            loader: ProfileLoader::new(users, RetryPolicy::from_config(&config)),
            teardown: TeardownHandler::new(probe.clone()),
            probe,
            store: SessionStore::new(),
            flight: SingleFlight::new(),
            optimistic_timer: FallbackTimer::new("optimistic"),
            mount_timer: FallbackTimer::new("mount"),
            resolutions: AtomicU64::new(0),
            config,
        };
        Self {
            inner: Arc::new(inner),
        }
    }

    pub fn subscribe(&self) -> SessionHandle {
        self.inner.store.subscribe()
    }

    pub fn state(&self) -> ReconciliationState {
        self.inner.store.snapshot()
    }

    /// Marks the session as resolving and arms the mount fallback, which
    /// queries the source of truth directly if no event has resolved the
    /// state by then. Only the first call on an uninitialized reconciler has
    /// any effect.
    pub fn start(&self) {
        if self.inner.store.snapshot() != ReconciliationState::Uninitialized {
            return;
        }
        self.inner.store.begin_resolving();

        let weak = self.downgrade();
        self.inner
            .mount_timer
            .arm(self.inner.config.mount_fallback(), async move {
                if let Some(reconciler) = Self::upgrade(&weak) {
                    reconciler.on_mount_timeout().await;
                }
            });
        tracing::debug!("session reconciler started");
    }

    /// Feeds every event from `events` to [`dispatch`](Self::dispatch)
    /// without waiting for the previous one, the way provider callbacks
    /// fire. The task ends when the sender side is closed.
    pub fn listen(&self, mut events: mpsc::UnboundedReceiver<AuthEvent>) -> JoinHandle<()> {
        let reconciler = self.clone();
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                let reconciler = reconciler.clone();
                tokio::spawn(async move {
                    reconciler.dispatch(event).await;
                });
            }
            tracing::debug!("auth event stream closed");
        })
    }

    pub async fn dispatch(&self, event: AuthEvent) -> EventOutcome {
        let kind = event.kind();
        let Some(_permit) = self.inner.flight.try_acquire() else {
            tracing::debug!(event = kind, "another event in flight, dropping");
            return EventOutcome::Dropped;
        };

        let outcome = match event {
            AuthEvent::InitialSession { session } => self.on_initial_session(session).await,
            AuthEvent::SignedIn { session } => self.on_signed_in(session),
            AuthEvent::SignedOut => self.on_signed_out().await,
            AuthEvent::TokenRefreshed { session } | AuthEvent::UserUpdated { session } => {
                self.on_profile_refresh(session).await
            }
        };
        tracing::debug!(event = kind, outcome = ?outcome, "auth event processed");
        outcome
    }

    async fn on_initial_session(&self, session: Option<AuthSession>) -> EventOutcome {
        self.inner.optimistic_timer.disarm();
        if self.inner.store.snapshot().is_resolved_for(session.as_ref()) {
            return EventOutcome::Ignored;
        }

        let user = match session {
            Some(session) => self.load_or_none(&session).await,
            None => None,
        };
        self.settle(user);
        EventOutcome::Resolved
    }

    fn on_signed_in(&self, session: AuthSession) -> EventOutcome {
        let state = self.inner.store.snapshot();
        if state.is_resolved_for(Some(&session)) {
            return EventOutcome::Ignored;
        }
        // A resolved user stays visible until something authoritative
        // replaces it; only an unresolved cycle is marked as resolving.
        if !state.is_resolved() {
            self.inner.store.begin_resolving();
        }

        let armed_at = self.inner.resolutions.load(Ordering::Acquire);
        let weak = self.downgrade();
        self.inner
            .optimistic_timer
            .arm(self.inner.config.optimistic_fallback(), async move {
                if let Some(reconciler) = Self::upgrade(&weak) {
                    reconciler.on_optimistic_timeout(session, armed_at).await;
                }
            });
        EventOutcome::Deferred
    }

    async fn on_signed_out(&self) -> EventOutcome {
        let state = self.inner.store.snapshot();
        if !self.inner.teardown.should_tear_down(state.current_user()).await {
            return EventOutcome::Vetoed;
        }
        self.settle(None);
        EventOutcome::Resolved
    }

    /// `token_refreshed` and `user_updated`: a session for another subject
    /// always evicts; otherwise a reload failure is transient unless the user
    /// was gated out.
    async fn on_profile_refresh(&self, session: AuthSession) -> EventOutcome {
        let current = self.inner.store.snapshot().current_user().cloned();

        if let Some(current) = current.as_ref().filter(|user| !user.is_subject(&session)) {
            tracing::warn!(
                subject = %current.id,
                session_subject = %session.subject(),
                "refreshed session belongs to another subject, forcing sign-out"
            );
            self.settle(None);
            return EventOutcome::Evicted;
        }

        let err = match self.inner.loader.load(&session.identity).await {
            Ok(user) => {
                self.settle(Some(user));
                return EventOutcome::Resolved;
            }
            Err(err) => err,
        };

        match current {
            Some(current) if err.is_access_denied() => {
                tracing::warn!(subject = %current.id, error = %err, "user lost access, forcing sign-out");
                self.settle(None);
                EventOutcome::Evicted
            }
            Some(current) => {
                tracing::warn!(subject = %current.id, error = %err, "profile reload failed, keeping current user");
                EventOutcome::Kept
            }
            None if err.is_transient() && self.fallback_pending() => {
                tracing::debug!(error = %err, "profile reload failed, leaving resolution to fallback");
                EventOutcome::Ignored
            }
            None => {
                tracing::warn!(error = %err, "profile reload failed without a resolved user");
                self.settle(None);
                EventOutcome::Resolved
            }
        }
    }

    async fn on_optimistic_timeout(&self, session: AuthSession, armed_at: u64) {
        let _permit = self.acquire_waiting().await;
        if self.inner.resolutions.load(Ordering::Acquire) != armed_at
            || self.inner.store.snapshot().is_resolved_for(Some(&session))
        {
            tracing::debug!("optimistic fallback found session already resolved");
            return;
        }
        tracing::info!(
            subject = %session.subject(),
            "initial session never arrived, resolving from signed-in session"
        );
        let user = self.load_or_none(&session).await;
        self.settle(user);
    }

    async fn on_mount_timeout(&self) {
        let _permit = self.acquire_waiting().await;
        if self.inner.store.snapshot().is_resolved() {
            return;
        }
        tracing::warn!("no auth event resolved the session, querying source of truth");
        let user = match self.inner.probe.live_session().await {
            Ok(Some(session)) => self.load_or_none(&session).await,
            Ok(None) => None,
            Err(err) => {
                tracing::warn!(error = %err, "source-of-truth session query failed");
                None
            }
        };
        self.settle(user);
    }

    async fn load_or_none(&self, session: &AuthSession) -> Option<AppUser> {
        match self.inner.loader.load(&session.identity).await {
            Ok(user) => Some(user),
            Err(err) => {
                tracing::warn!(subject = %session.subject(), error = %err, "no usable profile for session");
                None
            }
        }
    }

    /// The only path into `Resolved`. Disarms both fallbacks so a timer can
    /// never resolve the same cycle a second time.
    fn settle(&self, user: Option<AppUser>) {
        self.inner.optimistic_timer.disarm();
        self.inner.mount_timer.disarm();
        match &user {
            Some(user) => tracing::info!(subject = %user.id, role = %user.role, "session resolved"),
            None => tracing::info!("session resolved without a user"),
        }
        self.inner.store.resolve(user);
        self.inner.resolutions.fetch_add(1, Ordering::AcqRel);
    }

    fn fallback_pending(&self) -> bool {
        self.inner.optimistic_timer.is_armed() || self.inner.mount_timer.is_armed()
    }

    /// Timer callbacks wait for an in-flight event instead of being dropped.
    async fn acquire_waiting(&self) -> FlightPermit<'_> {
        loop {
            if let Some(permit) = self.inner.flight.try_acquire() {
                return permit;
            }
            tokio::time::sleep(self.inner.config.busy_poll()).await;
        }
    }

    fn downgrade(&self) -> Weak<Inner> {
        Arc::downgrade(&self.inner)
    }

    fn upgrade(weak: &Weak<Inner>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }
}
