//! One-time safety acknowledgment that gates camera access.
//!
//! - `AcknowledgmentStore`: external key-value collaborator that persists the flag
//! - `SafetyGate`: the narrow contract the session uses (query / acknowledge / reset)
//! - `SAFETY_TIPS`: what the user is asked to acknowledge

mod gate;
mod store;

pub use gate::{SafetyGate, ACK_KEY, SAFETY_TIPS};
pub use store::{AcknowledgmentStore, JsonFileStore, MemoryStore};
