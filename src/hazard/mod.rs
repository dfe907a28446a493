//! Transient hazard warnings derived from sampled frames.
//!
//! Detection is a strategy (`HazardDetector`) so the placeholder heuristic can
//! be swapped for a real model without touching the session. Dwell and expiry
//! are tracked separately by `HazardMonitor`.

mod detector;
mod monitor;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use detector::{HazardConfig, HazardDetector, HeuristicDetector};
pub use monitor::{HazardChange, HazardMonitor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HazardKind {
    LowLight,
    Obstacle,
}

impl HazardKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HazardKind::LowLight => "low_light",
            HazardKind::Obstacle => "obstacle",
        }
    }

    fn default_message(&self) -> &'static str {
        match self {
            HazardKind::LowLight => "Low light detected. Move to a brighter area.",
            HazardKind::Obstacle => "Possible obstacle ahead. Look up and check your path.",
        }
    }
}

impl fmt::Display for HazardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A live warning. At most one exists per session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HazardSignal {
    pub kind: HazardKind,
    pub message: String,
    pub raised_at: DateTime<Utc>,
}

impl HazardSignal {
    /// Signal with the standard copy for its kind, raised now.
    pub fn new(kind: HazardKind) -> Self {
        Self {
            kind,
            message: kind.default_message().to_string(),
            raised_at: Utc::now(),
        }
    }
}
