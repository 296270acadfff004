//! Cancelable one-shot timers.
//!
//! A `FallbackTimer` holds at most one pending callback. Arming replaces
//! whatever was pending, and disarming aborts it. A timer that fires clears
//! its own slot before running the callback, so a `disarm` issued from inside
//! the callback (or concurrently with it) never cancels work already started.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;

#[derive(Debug)]
struct Armed {
    generation: u64,
    handle: JoinHandle<()>,
}

#[derive(Debug, Default)]
struct Slot {
    next_generation: u64,
    armed: Option<Armed>,
}

#[derive(Debug)]
pub struct FallbackTimer {
    name: &'static str,
    slot: Arc<Mutex<Slot>>,
}

impl FallbackTimer {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            slot: Arc::new(Mutex::new(Slot::default())),
        }
    }

    /// Schedules `on_timeout` to run after `delay`, replacing any pending
    /// callback. Must be called from within a tokio runtime.
    pub fn arm<F>(&self, delay: Duration, on_timeout: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut slot = lock(&self.slot);
        if let Some(previous) = slot.armed.take() {
            previous.handle.abort();
        }
        slot.next_generation += 1;
        let generation = slot.next_generation;

        let shared = Arc::clone(&self.slot);
        let name = self.name;
        // The spawned task cannot observe the slot until this lock is released,
        // so the handle is always stored before the task checks it.
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut slot = lock(&shared);
                let current = slot.armed.as_ref().map(|armed| armed.generation);
                if current != Some(generation) {
                    return;
                }
                slot.armed = None;
            }
            tracing::debug!(timer = name, "fallback timer fired");
            on_timeout.await;
        });
        slot.armed = Some(Armed { generation, handle });
        tracing::trace!(timer = name, delay_ms = delay.as_millis() as u64, "fallback timer armed");
    }

    /// Cancels the pending callback. Returns true if one was pending.
    pub fn disarm(&self) -> bool {
        let armed = lock(&self.slot).armed.take();
        match armed {
            Some(armed) => {
                armed.handle.abort();
                tracing::trace!(timer = self.name, "fallback timer disarmed");
                true
            }
            None => false,
        }
    }

    pub fn is_armed(&self) -> bool {
        lock(&self.slot).armed.is_some()
    }
}

impl Drop for FallbackTimer {
    fn drop(&mut self) {
        self.disarm();
    }
}

fn lock(slot: &Mutex<Slot>) -> MutexGuard<'_, Slot> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}
