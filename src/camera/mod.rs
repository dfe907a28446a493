//! Camera resource management.
//!
//! The camera is an owned, releasable resource:
//! - `CameraBackend` / `VideoStream`: the platform seam (real device or simulation)
//! - `ResourceHandle`: single-flight acquisition plus release bookkeeping
//! - `StreamHandle`: one held stream; released exactly once
//! - `AcquisitionError`: classified failure surfaced to the session
//!
//! Readiness is reported separately from acquisition: a stream that has been
//! opened has not necessarily decoded its first frame.

mod backend;
mod error;
mod frame;
mod handle;
mod simulated;

use serde::{Deserialize, Serialize};

use crate::settings::CameraSettings;

pub use backend::{CameraBackend, OpenedStream, VideoStream};
pub use error::{AcquisitionError, AcquisitionErrorKind, DeviceFailure};
pub use frame::{Frame, FrameError};
pub use handle::{ResourceHandle, ResourceStats, StreamHandle};
pub use simulated::SimulatedCamera;

/// Which physical camera to prefer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FacingMode {
    /// Rear camera, pointing where the user walks
    #[default]
    Environment,
    /// Front camera
    User,
}

/// Acquisition hints. A backend may deliver something else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraPreferences {
    pub facing_mode: FacingMode,
    pub width: u32,
    pub height: u32,
    pub min_frame_rate: u32,
    pub max_frame_rate: u32,
}

impl Default for CameraPreferences {
    fn default() -> Self {
        Self::from(&CameraSettings::default())
    }
}

impl From<&CameraSettings> for CameraPreferences {
    fn from(settings: &CameraSettings) -> Self {
        Self {
            facing_mode: settings.facing_mode,
            width: settings.width,
            height: settings.height,
            min_frame_rate: settings.min_frame_rate.min(settings.max_frame_rate),
            max_frame_rate: settings.max_frame_rate,
        }
    }
}
