use std::time::Duration;

use tokio::time::Instant;

use super::{HazardKind, HazardSignal};

/// What a sample or deadline did to the live signal.
#[derive(Debug, Clone, PartialEq)]
pub enum HazardChange {
    /// A new signal replaced whatever was live
    Raised(HazardSignal),
    /// The live signal was confirmed; its dwell window restarted
    Renewed,
    /// The live signal went away
    Cleared,
    Unchanged,
}

/// Holds at most one live hazard and its expiry deadline.
///
/// A clear sample drops a low-light warning immediately, since the scene is
/// known to be bright again. An obstacle warning stays up for the full dwell
/// window unless renewed. Either kind expires once the window passes with no
/// renewing sample.
#[derive(Debug)]
pub struct HazardMonitor {
    dwell: Duration,
    live: Option<(HazardSignal, Instant)>,
}

impl HazardMonitor {
    pub fn new(dwell: Duration) -> Self {
        Self { dwell, live: None }
    }

    pub fn current(&self) -> Option<&HazardSignal> {
        self.live.as_ref().map(|(signal, _)| signal)
    }

    pub fn expires_at(&self) -> Option<Instant> {
        self.live.as_ref().map(|(_, deadline)| *deadline)
    }

    /// Apply one detector result taken at `now`.
    pub fn observe(&mut self, sample: Option<HazardSignal>, now: Instant) -> HazardChange {
        let deadline = now + self.dwell;
        let live_kind = self.current().map(|signal| signal.kind);

        match sample {
            Some(signal) if live_kind == Some(signal.kind) => {
                if let Some((_, expires)) = self.live.as_mut() {
                    *expires = deadline;
                }
                HazardChange::Renewed
            }
            Some(signal) => {
                self.live = Some((signal.clone(), deadline));
                HazardChange::Raised(signal)
            }
            None if live_kind == Some(HazardKind::LowLight) => {
                self.live = None;
                HazardChange::Cleared
            }
            None => self.expire(now),
        }
    }

    /// Drop the live signal if its dwell window has passed.
    pub fn expire(&mut self, now: Instant) -> HazardChange {
        match self.live {
            Some((_, deadline)) if now >= deadline => {
                self.live = None;
                HazardChange::Cleared
            }
            _ => HazardChange::Unchanged,
        }
    }

    /// Forget everything. Returns whether a signal was live.
    pub fn clear(&mut self) -> bool {
        self.live.take().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DWELL: Duration = Duration::from_secs(3);

    #[test]
    fn test_clear_sample_drops_low_light_immediately() {
        let mut monitor = HazardMonitor::new(DWELL);
        let now = Instant::now();

        let change = monitor.observe(Some(HazardSignal::new(HazardKind::LowLight)), now);
        assert!(matches!(change, HazardChange::Raised(ref s) if s.kind == HazardKind::LowLight));

        let change = monitor.observe(None, now + Duration::from_secs(1));
        assert_eq!(change, HazardChange::Cleared);
        assert!(monitor.current().is_none());
    }

    #[test]
    fn test_obstacle_persists_until_dwell_elapses() {
        let mut monitor = HazardMonitor::new(DWELL);
        let start = Instant::now();
        monitor.observe(Some(HazardSignal::new(HazardKind::Obstacle)), start);

        assert_eq!(
            monitor.observe(None, start + Duration::from_secs(1)),
            HazardChange::Unchanged
        );
        assert!(monitor.current().is_some());

        assert_eq!(monitor.expire(start + DWELL), HazardChange::Cleared);
        assert!(monitor.current().is_none());
        assert!(monitor.expires_at().is_none());
    }

    #[test]
    fn test_renewal_extends_deadline() {
        let mut monitor = HazardMonitor::new(DWELL);
        let start = Instant::now();
        monitor.observe(Some(HazardSignal::new(HazardKind::LowLight)), start);

        let later = start + Duration::from_secs(2);
        assert_eq!(
            monitor.observe(Some(HazardSignal::new(HazardKind::LowLight)), later),
            HazardChange::Renewed
        );
        assert_eq!(monitor.expires_at(), Some(later + DWELL));
        assert_eq!(monitor.expire(start + DWELL), HazardChange::Unchanged);
    }

    #[test]
    fn test_new_kind_replaces_live_signal() {
        let mut monitor = HazardMonitor::new(DWELL);
        let now = Instant::now();
        monitor.observe(Some(HazardSignal::new(HazardKind::Obstacle)), now);
        monitor.observe(Some(HazardSignal::new(HazardKind::LowLight)), now);

        assert_eq!(monitor.current().map(|s| s.kind), Some(HazardKind::LowLight));
    }

    #[test]
    fn test_clear_reports_whether_live() {
        let mut monitor = HazardMonitor::new(DWELL);
        assert!(!monitor.clear());
        monitor.observe(Some(HazardSignal::new(HazardKind::Obstacle)), Instant::now());
        assert!(monitor.clear());
    }
}
