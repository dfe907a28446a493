use std::time::Duration;

use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

/// A restartable fixed-cadence timer.
///
/// `tick` never completes while stopped, so it can sit in a `select!`
/// unconditionally. Stopping drops the pending deadline: a tick that was
/// already due is not delivered.
#[derive(Debug)]
pub struct PeriodicTask {
    name: &'static str,
    interval: Option<Interval>,
}

impl PeriodicTask {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            interval: None,
        }
    }

    /// Start ticking every `period`, first tick one period from now.
    /// Restarts the cadence if already running.
    pub fn start(&mut self, period: Duration) {
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.interval = Some(interval);
        tracing::debug!("[session] {} timer started ({:?})", self.name, period);
    }

    /// Returns whether the task was running. No-op when stopped.
    pub fn stop(&mut self) -> bool {
        let was_running = self.interval.take().is_some();
        if was_running {
            tracing::debug!("[session] {} timer stopped", self.name);
        }
        was_running
    }

    pub fn is_running(&self) -> bool {
        self.interval.is_some()
    }

    pub async fn tick(&mut self) {
        match self.interval.as_mut() {
            Some(interval) => {
                interval.tick().await;
            }
            None => std::future::pending::<()>().await,
        }
    }
}
