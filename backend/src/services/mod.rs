//! Module for the building blocks of session reconciliation.
//!
//! This module encapsulates the pieces the reconciler composes: loading
//! and gating user profiles, serializing event processing, racing fallback
//! timers against the event stream, and querying the source of truth for a
//! live session.

pub mod fallback_timer;
pub mod profile_loader;
pub mod session_probe;
pub mod single_flight;

pub use fallback_timer::FallbackTimer;
pub use profile_loader::{ProfileLoader, RetryPolicy};
pub use session_probe::SessionProbe;
pub use single_flight::{FlightPermit, SingleFlight};
