//! In-memory adapter implementation.
//!
//! `MemoryBackend` implements both `AuthProvider` and `UserStore` over a user
//! table and a single live-session slot. Failures can be queued per call so
//! callers can reproduce flaky networks, statement timeouts and missing rows,
//! and every call is counted.

use std::collections::{HashMap, VecDeque};
use std::io::Read;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::AdapterError;
use crate::models::{AuthSession, UserRow};
use crate::{AuthProvider, UserStore};

/// Seed data for a `MemoryBackend`, usually read from JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub users: Vec<UserRow>,
    #[serde(default)]
    pub live_session: Option<AuthSession>,
}

#[derive(Debug, Default)]
struct BackendState {
    users: HashMap<String, UserRow>,
    live_session: Option<AuthSession>,
    fetch_failures: VecDeque<AdapterError>,
    session_failures: VecDeque<AdapterError>,
    latency: Duration,
    fetch_calls: usize,
    session_calls: usize,
}

#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: Mutex<BackendState>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fixture(fixture: Fixture) -> Self {
        let backend = Self::new();
        {
            let mut state = backend.lock();
            for user in fixture.users {
                state.users.insert(user.id.clone(), user);
            }
            state.live_session = fixture.live_session;
        }
        backend
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, AdapterError> {
        let fixture: Fixture = serde_json::from_reader(reader)?;
        if let Some(dup) = first_duplicate(&fixture.users) {
            return Err(AdapterError::Fixture(format!("duplicate user id {dup}")));
        }
        log::debug!("loaded fixture with {} users", fixture.users.len());
        Ok(Self::from_fixture(fixture))
    }

    /// Delay applied to every call before it is answered.
    pub fn with_latency(self, latency: Duration) -> Self {
        self.lock().latency = latency;
        self
    }

    pub fn insert_user(&self, user: UserRow) {
        self.lock().users.insert(user.id.clone(), user);
    }

    pub fn remove_user(&self, subject: &str) -> Option<UserRow> {
        self.lock().users.remove(subject)
    }

    pub fn set_live_session(&self, session: Option<AuthSession>) {
        self.lock().live_session = session;
    }

    /// Queues `err` for the next `times` user fetches.
    pub fn fail_fetches(&self, err: AdapterError, times: usize) {
        let mut state = self.lock();
        state
            .fetch_failures
            .extend(std::iter::repeat(err).take(times));
    }

    /// Queues `err` for the next session query.
    pub fn fail_session_query(&self, err: AdapterError) {
        self.lock().session_failures.push_back(err);
    }

    pub fn fetch_calls(&self) -> usize {
        self.lock().fetch_calls
    }

    pub fn session_calls(&self) -> usize {
        self.lock().session_calls
    }

    fn lock(&self) -> MutexGuard<'_, BackendState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn simulate_latency(&self) {
        let latency = self.lock().latency;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }
}

fn first_duplicate(users: &[UserRow]) -> Option<&str> {
    let mut seen = std::collections::HashSet::new();
    users
        .iter()
        .map(|user| user.id.as_str())
        .find(|id| !seen.insert(*id))
}

#[async_trait]
impl AuthProvider for MemoryBackend {
    async fn current_session(&self) -> Result<Option<AuthSession>, AdapterError> {
        let injected = {
            let mut state = self.lock();
            state.session_calls += 1;
            state.session_failures.pop_front()
        };
        self.simulate_latency().await;
        if let Some(err) = injected {
            log::debug!("session query failing with injected error: {err}");
            return Err(err);
        }
        Ok(self.lock().live_session.clone())
    }
}

#[async_trait]
impl UserStore for MemoryBackend {
    async fn fetch_user(&self, subject: &str) -> Result<UserRow, AdapterError> {
        let injected = {
            let mut state = self.lock();
            state.fetch_calls += 1;
            state.fetch_failures.pop_front()
        };
        self.simulate_latency().await;
        if let Some(err) = injected {
            log::debug!("user fetch for {subject} failing with injected error: {err}");
            return Err(err);
        }
        self.lock()
            .users
            .get(subject)
            .cloned()
            .ok_or(AdapterError::NotFound)
    }
}
