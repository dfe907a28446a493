//! Wayfinder: camera-gated AR navigation sessions for a campus wayfinding
//! client.
//!
//! A session walks a user to a [`directory::Destination`]. It shows a one-time
//! safety notice, acquires the rear camera, runs simulated turn-by-turn
//! guidance and samples frames for hazards until it is closed.
//!
//! The session never talks to a UI directly; everything it wants shown goes
//! through a [`runtime::WayfinderRuntime`].

pub mod camera;
pub mod directory;
pub mod error;
pub mod guidance;
pub mod hazard;
pub mod runtime;
pub mod safety;
pub mod session;
pub mod settings;

#[cfg(feature = "cli")]
pub mod cli;

pub use error::{Result, WayfinderError};
pub use session::{SessionController, SessionHandle, SessionSnapshot, SessionState};
