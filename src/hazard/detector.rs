use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{HazardKind, HazardSignal};
use crate::camera::Frame;
use crate::settings::HazardSettings;

/// Frame-level hazard classification.
///
/// Must be cheap: implementations run on every sampling tick.
pub trait HazardDetector: Send {
    /// Classify one frame. `None` means clear.
    fn sample(&mut self, frame: &Frame) -> Option<HazardSignal>;
}

/// Tunables for the sampling loop and the heuristic detector.
#[derive(Debug, Clone, PartialEq)]
pub struct HazardConfig {
    pub sample_interval: Duration,
    pub low_light_threshold: f64,
    /// Always within `0.0..=1.0`
    pub obstacle_probability: f64,
    pub dwell: Duration,
    pub sample_width: u32,
    pub sample_height: u32,
}

impl Default for HazardConfig {
    fn default() -> Self {
        Self::from(&HazardSettings::default())
    }
}

impl From<&HazardSettings> for HazardConfig {
    fn from(settings: &HazardSettings) -> Self {
        let probability = if settings.obstacle_probability.is_finite() {
            settings.obstacle_probability.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            sample_interval: Duration::from_millis(settings.sample_interval_ms.max(1)),
            low_light_threshold: settings.low_light_threshold,
            obstacle_probability: probability,
            dwell: Duration::from_millis(settings.dwell_ms),
            sample_width: settings.sample_width.max(1),
            sample_height: settings.sample_height.max(1),
        }
    }
}

/// Placeholder detector: mean brightness plus a random obstacle trigger.
pub struct HeuristicDetector {
    config: HazardConfig,
    rng: StdRng,
}

impl HeuristicDetector {
    pub fn new(config: HazardConfig) -> Self {
        Self {
            config,
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic obstacle trigger.
    pub fn with_seed(config: HazardConfig, seed: u64) -> Self {
        Self {
            config,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn config(&self) -> &HazardConfig {
        &self.config
    }
}

impl HazardDetector for HeuristicDetector {
    fn sample(&mut self, frame: &Frame) -> Option<HazardSignal> {
        if frame.is_empty() {
            return None;
        }

        let small = frame.downsample(self.config.sample_width, self.config.sample_height);
        let luminance = small.mean_luminance();
        tracing::trace!("[hazard] Sampled luminance {:.1}", luminance);

        if luminance < self.config.low_light_threshold {
            return Some(HazardSignal::new(HazardKind::LowLight));
        }
        if self.rng.gen_bool(self.config.obstacle_probability) {
            return Some(HazardSignal::new(HazardKind::Obstacle));
        }
        None
    }
}
