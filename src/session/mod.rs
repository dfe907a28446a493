//! AR navigation session.
//!
//! A session walks `Idle -> SafetyPending -> Acquiring -> Active` (skipping
//! the safety step when already acknowledged), can fall into `Error` when the
//! camera is unavailable, and always ends in `Closed`.
//!
//! ## Guarantees
//!
//! - The camera is never requested before the safety notice is accepted.
//! - The camera is held only while `Acquiring` (once requested) or `Active`.
//! - Guidance and hazard timers run only while `Active`; no tick is delivered
//!   after `Closed`.
//! - Every successful acquisition is released exactly once, including ones
//!   that complete after the session has already closed.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let handle = SessionController::spawn(destination, deps, SessionConfig::default());
//! let first = handle.wait_for(|s| s.state != SessionState::Idle).await?;
//! if first.state == SessionState::SafetyPending {
//!     handle.accept_safety(true).await?;
//! }
//! handle.wait_for(|s| s.state.is_active()).await?;
//! handle.close().await?;
//! ```

mod controller;
mod events;
mod periodic;
mod state;

#[cfg(test)]
mod integration_tests;

pub use controller::{
    SessionConfig, SessionController, SessionDeps, SessionHandle, SessionSnapshot, HOME_ROUTE,
};
pub use events::SessionEvent;
pub use periodic::PeriodicTask;
pub use state::SessionState;
