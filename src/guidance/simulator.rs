use serde::Serialize;

use super::{Direction, GuidanceConfig, GuidanceStep};

/// Result of one guidance tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GuidanceUpdate {
    pub step: GuidanceStep,
    /// True on the one tick that reached `Arrived`
    pub arrived: bool,
}

/// Walks `Direction::SEQUENCE`, one entry per tick.
///
/// Scheduling belongs to the caller; the simulator only knows how to take
/// the next step. Once `Arrived` is reached it is finished and every further
/// `advance` returns `None`.
#[derive(Debug, Clone)]
pub struct GuidanceSimulator {
    config: GuidanceConfig,
    index: usize,
    step: GuidanceStep,
}

impl GuidanceSimulator {
    pub fn new(config: GuidanceConfig) -> Self {
        let step = GuidanceStep::new(
            Direction::SEQUENCE[0],
            config.initial_distance_m,
            config.walking_speed_mps,
        );
        Self {
            config,
            index: 0,
            step,
        }
    }

    pub fn config(&self) -> &GuidanceConfig {
        &self.config
    }

    pub fn current(&self) -> &GuidanceStep {
        &self.step
    }

    pub fn is_finished(&self) -> bool {
        self.step.direction == Direction::Arrived
    }

    pub fn advance(&mut self) -> Option<GuidanceUpdate> {
        if self.is_finished() {
            return None;
        }

        self.index += 1;
        let direction = Direction::SEQUENCE[self.index];
        let remaining = self.step.distance_remaining_m;
        let distance = if direction == Direction::Arrived {
            0
        } else {
            // Never below the floor, never above where we already were
            remaining
                .saturating_sub(self.config.step_m)
                .max(self.config.floor_m)
                .min(remaining)
        };

        self.step = GuidanceStep::new(direction, distance, self.config.walking_speed_mps);
        tracing::debug!(
            "[guidance] {} with {} m remaining ({})",
            direction,
            distance,
            self.step.estimated_time_label
        );

        Some(GuidanceUpdate {
            step: self.step.clone(),
            arrived: direction == Direction::Arrived,
        })
    }
}
