//! Timed auth event scripts for replaying provider behaviour.
//!
//! A script is a JSON array of steps, each waiting `after_ms` past the
//! previous step before emitting its event:
//!
//! ```json
//! [
//!   { "event": { "event": "signed_in", "session": { "identity": { "subject": "u1" } } } },
//!   { "after_ms": 40, "event": { "event": "initial_session", "session": { "identity": { "subject": "u1" } } } }
//! ]
//! ```

use std::io::Read;
use std::time::Duration;

use adapters::AuthEvent;
use serde::Deserialize;
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ScriptStep {
    #[serde(default)]
    pub after_ms: u64,
    pub event: AuthEvent,
}

#[derive(Debug, Clone, Default)]
pub struct EventScript {
    steps: Vec<ScriptStep>,
}

impl EventScript {
    pub fn new(steps: Vec<ScriptStep>) -> Self {
        Self { steps }
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, serde_json::Error> {
        Ok(Self::new(serde_json::from_reader(reader)?))
    }

    pub fn steps(&self) -> &[ScriptStep] {
        &self.steps
    }

    /// Emits every step on `events`, honouring the delays. Stops early if
    /// the receiving side is gone and returns how many events were sent.
    pub async fn replay(&self, events: &mpsc::UnboundedSender<AuthEvent>) -> usize {
        let mut sent = 0;
        for step in &self.steps {
            if step.after_ms > 0 {
                tokio::time::sleep(Duration::from_millis(step.after_ms)).await;
            }
            tracing::debug!(event = step.event.kind(), "replaying auth event");
            if events.send(step.event.clone()).is_err() {
                break;
            }
            sent += 1;
        }
        sent
    }
}
