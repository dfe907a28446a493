//! Settings schema definitions for Wayfinder configuration.
//!
//! All settings structs use `#[serde(default)]` to allow partial configuration files.
//! Missing fields are filled with the defaults below.

use serde::{Deserialize, Serialize};

use crate::camera::FacingMode;

/// Root settings structure for Wayfinder.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WayfinderSettings {
    /// Schema version for migrations
    pub version: u32,

    /// Camera acquisition hints
    pub camera: CameraSettings,

    /// Simulated turn-by-turn guidance
    pub guidance: GuidanceSettings,

    /// Frame sampling and hazard warnings
    pub hazard: HazardSettings,

    /// Persisted state location
    pub storage: StorageSettings,

    /// Advanced/debug settings
    pub advanced: AdvancedSettings,
}

/// Camera acquisition preferences. These are hints, not guarantees.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Preferred camera: "environment" (rear) | "user" (front)
    pub facing_mode: FacingMode,

    /// Ideal frame width in pixels
    pub width: u32,

    /// Ideal frame height in pixels
    pub height: u32,

    /// Lowest acceptable frame rate
    pub min_frame_rate: u32,

    /// Highest requested frame rate
    pub max_frame_rate: u32,
}

/// Guidance simulator cadence and distances.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GuidanceSettings {
    /// Milliseconds between guidance ticks
    pub tick_interval_ms: u64,

    /// Distance remaining when the session becomes active
    pub initial_distance_m: u32,

    /// Distance covered per tick
    pub step_m: u32,

    /// Distance never drops below this until arrival
    pub floor_m: u32,

    /// Used for the ETA label
    pub walking_speed_mps: f64,
}

/// Hazard sampling loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HazardSettings {
    /// Milliseconds between frame samples
    pub sample_interval_ms: u64,

    /// Mean luminance (0-255) below which low light is reported
    pub low_light_threshold: f64,

    /// Chance per sample of the placeholder obstacle warning (0.0 - 1.0)
    pub obstacle_probability: f64,

    /// How long a warning stays live without a renewing sample
    pub dwell_ms: u64,

    /// Width frames are downsampled to before analysis
    pub sample_width: u32,

    /// Height frames are downsampled to before analysis
    pub sample_height: u32,
}

/// Persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StorageSettings {
    /// Data directory override (supports $ENV_VAR syntax)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
}

/// Advanced/debug settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvancedSettings {
    /// Log level: "error" | "warn" | "info" | "debug" | "trace"
    pub log_level: String,
}

// =============================================================================
// Default implementations
// =============================================================================

impl Default for WayfinderSettings {
    fn default() -> Self {
        Self {
            version: 1,
            camera: CameraSettings::default(),
            guidance: GuidanceSettings::default(),
            hazard: HazardSettings::default(),
            storage: StorageSettings::default(),
            advanced: AdvancedSettings::default(),
        }
    }
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            facing_mode: FacingMode::Environment,
            width: 1280,
            height: 720,
            min_frame_rate: 15,
            max_frame_rate: 30,
        }
    }
}

impl Default for GuidanceSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: 5000,
            initial_distance_m: 25,
            step_m: 8,
            floor_m: 5,
            walking_speed_mps: 1.2,
        }
    }
}

impl Default for HazardSettings {
    fn default() -> Self {
        Self {
            sample_interval_ms: 1000,
            low_light_threshold: 20.0,
            obstacle_probability: 0.02,
            dwell_ms: 3000,
            sample_width: 64,
            sample_height: 48,
        }
    }
}

impl Default for AdvancedSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
