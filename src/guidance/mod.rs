//! Simulated turn-by-turn guidance.
//!
//! There is no route planner: the simulator walks a fixed direction sequence,
//! shrinking the remaining distance each tick until it reports arrival.

mod simulator;

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::settings::GuidanceSettings;

pub use simulator::{GuidanceSimulator, GuidanceUpdate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Straight,
    Left,
    Right,
    Arrived,
}

impl Direction {
    /// The fixed order the simulator walks.
    pub const SEQUENCE: [Direction; 4] = [
        Direction::Straight,
        Direction::Left,
        Direction::Right,
        Direction::Arrived,
    ];

    /// Instruction text shown to the user.
    pub fn label(&self) -> &'static str {
        match self {
            Direction::Straight => "Go Straight",
            Direction::Left => "Turn Left",
            Direction::Right => "Turn Right",
            Direction::Arrived => "You've Arrived!",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Straight => "straight",
            Direction::Left => "left",
            Direction::Right => "right",
            Direction::Arrived => "arrived",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuidanceStep {
    pub direction: Direction,
    pub distance_remaining_m: u32,
    pub estimated_time_label: String,
}

impl GuidanceStep {
    pub fn new(direction: Direction, distance_remaining_m: u32, walking_speed_mps: f64) -> Self {
        Self {
            direction,
            distance_remaining_m,
            estimated_time_label: eta_label(distance_remaining_m, walking_speed_mps),
        }
    }

    /// Fraction of the route covered, `0.0..=1.0`.
    pub fn progress(&self, initial_distance_m: u32) -> f64 {
        if self.direction == Direction::Arrived {
            return 1.0;
        }
        if initial_distance_m == 0 {
            return 0.0;
        }
        let remaining = self.distance_remaining_m as f64 / initial_distance_m as f64;
        (1.0 - remaining).clamp(0.0, 1.0)
    }
}

/// Walking-time estimate for the remaining distance.
pub fn eta_label(distance_m: u32, walking_speed_mps: f64) -> String {
    if distance_m == 0 {
        return "Arrived".to_string();
    }
    if !(walking_speed_mps.is_finite() && walking_speed_mps > 0.0) {
        return "<1 min".to_string();
    }

    let seconds = distance_m as f64 / walking_speed_mps;
    if seconds < 60.0 {
        "<1 min".to_string()
    } else {
        format!("{} min", (seconds / 60.0).ceil() as u64)
    }
}

/// Cadence and distances for one simulated route.
#[derive(Debug, Clone, PartialEq)]
pub struct GuidanceConfig {
    pub tick_interval: Duration,
    pub initial_distance_m: u32,
    pub step_m: u32,
    pub floor_m: u32,
    pub walking_speed_mps: f64,
}

impl Default for GuidanceConfig {
    fn default() -> Self {
        Self::from(&GuidanceSettings::default())
    }
}

impl From<&GuidanceSettings> for GuidanceConfig {
    fn from(settings: &GuidanceSettings) -> Self {
        Self {
            tick_interval: Duration::from_millis(settings.tick_interval_ms.max(1)),
            initial_distance_m: settings.initial_distance_m,
            step_m: settings.step_m,
            floor_m: settings.floor_m,
            walking_speed_mps: settings.walking_speed_mps,
        }
    }
}
