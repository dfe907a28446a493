use std::sync::Arc;

use super::store::AcknowledgmentStore;

/// Global key for the acknowledgment flag. Not per destination.
pub const ACK_KEY: &str = "ar_safety_accepted";

/// Shown before the first camera access.
pub const SAFETY_TIPS: [&str; 5] = [
    "Be aware of your surroundings at all times",
    "Do not use AR while on stairs or escalators",
    "Hold your phone securely with both hands",
    "Watch for obstacles, people, and vehicles",
    "Use in well-lit areas for best tracking",
];

/// Tracks whether the user has permanently acknowledged the safety notice.
///
/// Storage failures never surface: an unreadable flag counts as "not
/// acknowledged", so the gate is shown rather than silently skipped.
#[derive(Clone)]
pub struct SafetyGate {
    store: Arc<dyn AcknowledgmentStore>,
}

impl SafetyGate {
    pub fn new(store: Arc<dyn AcknowledgmentStore>) -> Self {
        Self { store }
    }

    /// Read the persisted flag. No side effects.
    pub async fn is_acknowledged(&self) -> bool {
        match self.store.get(ACK_KEY).await {
            Ok(acknowledged) => acknowledged,
            Err(e) => {
                tracing::warn!("[safety] Could not read acknowledgment, showing gate: {:#}", e);
                false
            }
        }
    }

    /// Persist the acknowledgment. Idempotent.
    pub async fn acknowledge(&self) {
        if let Err(e) = self.store.set(ACK_KEY, true).await {
            tracing::warn!("[safety] Could not persist acknowledgment: {:#}", e);
        } else {
            tracing::info!("[safety] Acknowledgment persisted");
        }
    }

    /// Forget the acknowledgment, e.g. on account change.
    pub async fn reset(&self) {
        if let Err(e) = self.store.remove(ACK_KEY).await {
            tracing::warn!("[safety] Could not clear acknowledgment: {:#}", e);
        } else {
            tracing::info!("[safety] Acknowledgment cleared");
        }
    }
}
