//! Events a session reports to its host.

use serde::Serialize;

use super::SessionState;
use crate::camera::AcquisitionError;
use crate::guidance::GuidanceStep;
use crate::hazard::HazardSignal;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    StateChanged {
        from: SessionState,
        to: SessionState,
    },

    GuidanceUpdated {
        step: GuidanceStep,
        /// Fraction of the route covered
        progress: f64,
    },

    /// Fires once per session
    Arrived {
        destination: String,
        audio_enabled: bool,
    },

    /// Shown continuously until the matching `HazardCleared`
    HazardRaised { signal: HazardSignal },

    HazardCleared,

    AcquisitionFailed {
        error: AcquisitionError,
        retryable: bool,
    },

    AudioToggled { enabled: bool },

    Closed,
}

impl SessionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::StateChanged { .. } => "state_changed",
            SessionEvent::GuidanceUpdated { .. } => "guidance_updated",
            SessionEvent::Arrived { .. } => "arrived",
            SessionEvent::HazardRaised { .. } => "hazard_raised",
            SessionEvent::HazardCleared => "hazard_cleared",
            SessionEvent::AcquisitionFailed { .. } => "acquisition_failed",
            SessionEvent::AudioToggled { .. } => "audio_toggled",
            SessionEvent::Closed => "closed",
        }
    }
}
