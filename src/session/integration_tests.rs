//! Integration tests for the AR navigation session.
//!
//! These drive a real `SessionController` against the simulated camera with
//! the tokio clock paused, covering:
//! - Safety gating (pending, accept, cancel, remembered acknowledgment)
//! - Acquisition failure, retry and readiness
//! - Guidance cadence and the single arrival notification
//! - Hazard raising, clearing and dwell expiry
//! - Cleanup on close and on teardown from every state

#![cfg(test)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use super::{
    SessionConfig, SessionController, SessionDeps, SessionEvent, SessionHandle, SessionSnapshot,
    SessionState, HOME_ROUTE,
};
use crate::camera::{
    AcquisitionErrorKind, CameraBackend, CameraPreferences, DeviceFailure, Frame, FrameError,
    OpenedStream, ResourceHandle, SimulatedCamera, VideoStream,
};
use crate::directory::{DestinationDirectory, StaticDirectory};
use crate::error::WayfinderError;
use crate::guidance::{Direction, GuidanceConfig};
use crate::hazard::{HazardConfig, HazardDetector, HazardKind, HazardSignal, HeuristicDetector};
use crate::runtime::{ChannelRuntime, RuntimeEvent};
use crate::safety::{AcknowledgmentStore, MemoryStore, SafetyGate, ACK_KEY};

// ============================================================================
// Harness
// ============================================================================

fn test_config() -> SessionConfig {
    SessionConfig {
        preferences: CameraPreferences {
            width: 64,
            height: 48,
            ..Default::default()
        },
        guidance: GuidanceConfig::default(),
        hazard: HazardConfig {
            obstacle_probability: 0.0,
            ..Default::default()
        },
    }
}

/// Replays a fixed list of detector results, then reports clear.
struct ScriptedDetector {
    script: VecDeque<Option<HazardKind>>,
}

impl ScriptedDetector {
    fn new(script: Vec<Option<HazardKind>>) -> Self {
        Self {
            script: script.into(),
        }
    }
}

impl HazardDetector for ScriptedDetector {
    fn sample(&mut self, _frame: &Frame) -> Option<HazardSignal> {
        self.script.pop_front().flatten().map(HazardSignal::new)
    }
}

/// Never reports anything; counts how often it is asked.
struct CountingDetector {
    samples: Arc<AtomicUsize>,
}

impl HazardDetector for CountingDetector {
    fn sample(&mut self, _frame: &Frame) -> Option<HazardSignal> {
        self.samples.fetch_add(1, Ordering::SeqCst);
        None
    }
}

struct Harness {
    handle: SessionHandle,
    camera: Arc<SimulatedCamera>,
    resource: Arc<ResourceHandle>,
    store: Arc<MemoryStore>,
    events: mpsc::UnboundedReceiver<RuntimeEvent>,
    seen: Vec<RuntimeEvent>,
}

impl Harness {
    async fn start(camera: SimulatedCamera, acknowledged: bool) -> Self {
        let detector = HeuristicDetector::with_seed(test_config().hazard, 7);
        Self::start_with(camera, acknowledged, Box::new(detector)).await
    }

    async fn start_with(
        camera: SimulatedCamera,
        acknowledged: bool,
        detector: Box<dyn HazardDetector>,
    ) -> Self {
        let store = Arc::new(MemoryStore::new());
        if acknowledged {
            store.set(ACK_KEY, true).await.unwrap();
        }
        Self::start_with_store(camera, store, detector)
    }

    fn start_with_store(
        camera: SimulatedCamera,
        store: Arc<MemoryStore>,
        detector: Box<dyn HazardDetector>,
    ) -> Self {
        let camera = Arc::new(camera);
        let resource = Arc::new(ResourceHandle::new(camera.clone()));
        let (runtime, events) = ChannelRuntime::pair();
        let destination = StaticDirectory::campus().find("3").unwrap();

        let handle = SessionController::spawn(
            destination,
            SessionDeps {
                safety_gate: SafetyGate::new(store.clone()),
                camera: resource.clone(),
                detector,
                runtime: Arc::new(runtime),
            },
            test_config(),
        );

        Self {
            handle,
            camera,
            resource,
            store,
            events,
            seen: Vec::new(),
        }
    }

    async fn wait_state(&self, mut predicate: impl FnMut(&SessionState) -> bool) -> SessionSnapshot {
        tokio::time::timeout(
            Duration::from_secs(120),
            self.handle.wait_for(|snapshot| predicate(&snapshot.state)),
        )
        .await
        .expect("timed out waiting for state")
        .expect("session ended")
    }

    /// Move newly emitted events into `seen` and return how many arrived.
    fn collect(&mut self) -> usize {
        let before = self.seen.len();
        while let Ok(event) = self.events.try_recv() {
            self.seen.push(event);
        }
        self.seen.len() - before
    }

    fn session_events(&mut self) -> Vec<SessionEvent> {
        self.collect();
        self.seen
            .iter()
            .filter_map(|event| match event {
                RuntimeEvent::Session(event) => Some((**event).clone()),
                _ => None,
            })
            .collect()
    }

    /// Every state entered, in order.
    fn states(&mut self) -> Vec<SessionState> {
        self.session_events()
            .into_iter()
            .filter_map(|event| match event {
                SessionEvent::StateChanged { to, .. } => Some(to),
                _ => None,
            })
            .collect()
    }

    fn navigations(&mut self) -> Vec<String> {
        self.collect();
        self.seen
            .iter()
            .filter_map(|event| match event {
                RuntimeEvent::Navigate { to } => Some(to.clone()),
                _ => None,
            })
            .collect()
    }
}

fn permission_denied() -> DeviceFailure {
    DeviceFailure::new("NotAllowedError", "Permission denied by user")
}

async fn advance(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

// ============================================================================
// Safety gate
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_unacknowledged_session_waits_for_consent() {
    let mut h = Harness::start(SimulatedCamera::new(), false).await;

    h.wait_state(|s| *s == SessionState::SafetyPending).await;
    advance(30_000).await;
    assert_eq!(h.camera.open_calls(), 0, "camera requested before consent");
    assert_eq!(h.resource.stats().requests, 0);

    let state = h.handle.accept_safety(true).await.unwrap();
    assert_eq!(state, SessionState::Acquiring);
    h.wait_state(SessionState::is_active).await;

    assert_eq!(
        h.states(),
        vec![
            SessionState::SafetyPending,
            SessionState::Acquiring,
            SessionState::Active
        ]
    );
    assert!(h.store.get(ACK_KEY).await.unwrap());
    assert_eq!(h.camera.open_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_acknowledged_session_skips_gate() {
    let mut h = Harness::start(SimulatedCamera::new(), true).await;

    h.wait_state(SessionState::is_active).await;

    let events = h.session_events();
    assert!(matches!(
        &events[0],
        SessionEvent::StateChanged {
            from: SessionState::Idle,
            to: SessionState::Acquiring
        }
    ));
    assert!(!h.states().contains(&SessionState::SafetyPending));
}

#[tokio::test(start_paused = true)]
async fn test_accept_without_remember_is_not_persisted() {
    let h = Harness::start(SimulatedCamera::new(), false).await;

    h.wait_state(|s| *s == SessionState::SafetyPending).await;
    h.handle.accept_safety(false).await.unwrap();
    h.wait_state(SessionState::is_active).await;

    assert!(!h.store.get(ACK_KEY).await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_cancel_safety_closes_without_camera() {
    let mut h = Harness::start(SimulatedCamera::new(), false).await;

    h.wait_state(|s| *s == SessionState::SafetyPending).await;
    let state = h.handle.cancel_safety().await.unwrap();
    assert_eq!(state, SessionState::Closed);

    advance(10_000).await;
    assert_eq!(h.camera.open_calls(), 0);
    assert_eq!(h.resource.stats().requests, 0);
    assert_eq!(h.navigations(), vec![HOME_ROUTE.to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_unreadable_acknowledgment_shows_gate() {
    let h = Harness::start_with_store(
        SimulatedCamera::new(),
        Arc::new(MemoryStore::failing()),
        Box::new(ScriptedDetector::new(vec![])),
    );

    h.wait_state(|s| *s == SessionState::SafetyPending).await;
    assert_eq!(h.camera.open_calls(), 0);

    // Remembering fails silently; the session still proceeds
    h.handle.accept_safety(true).await.unwrap();
    h.wait_state(SessionState::is_active).await;
}

// ============================================================================
// Acquisition
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_permission_denied_then_retry() {
    let camera = SimulatedCamera::new().fail_times(1, permission_denied());
    let mut h = Harness::start(camera, true).await;

    let snapshot = h.wait_state(|s| s.error().is_some()).await;
    let error = snapshot.state.error().cloned().unwrap();
    assert_eq!(error.category, AcquisitionErrorKind::PermissionDenied);
    assert!(error.message.contains("permission"));
    assert!(h.session_events().iter().any(|e| matches!(
        e,
        SessionEvent::AcquisitionFailed { retryable: true, .. }
    )));

    // Nothing retries on its own
    advance(30_000).await;
    assert_eq!(h.camera.open_calls(), 1);

    let state = h.handle.retry_acquisition().await.unwrap();
    assert_eq!(state, SessionState::Acquiring);
    h.wait_state(SessionState::is_active).await;

    assert_eq!(h.camera.open_calls(), 2);
    let stats = h.resource.stats();
    assert_eq!(stats.requests, 2);
    assert_eq!(stats.acquired, 1);
}

#[tokio::test(start_paused = true)]
async fn test_stream_that_never_becomes_ready_fails() {
    let mut h = Harness::start(SimulatedCamera::new().never_ready(), true).await;

    let snapshot = h.wait_state(|s| s.error().is_some()).await;
    assert_eq!(
        snapshot.state.error().map(|e| e.category),
        Some(AcquisitionErrorKind::Unknown)
    );

    let stats = h.resource.stats();
    assert_eq!(stats.acquired, 1);
    assert_eq!(stats.released, 1, "failed stream must be released");
    assert!(!h.states().contains(&SessionState::Active));
}

#[tokio::test(start_paused = true)]
async fn test_active_only_after_first_frame() {
    let camera = SimulatedCamera::new().ready_delay(Duration::from_secs(2));
    let h = Harness::start(camera, true).await;

    h.wait_state(|s| *s == SessionState::Acquiring).await;
    advance(1_000).await;
    assert_eq!(h.handle.state(), SessionState::Acquiring);
    assert_eq!(h.resource.stats().held(), 1);
    assert!(h.handle.snapshot().guidance.is_none());

    advance(1_500).await;
    assert_eq!(h.handle.state(), SessionState::Active);
}

#[tokio::test(start_paused = true)]
async fn test_invalid_actions_leave_state_untouched() {
    let h = Harness::start(SimulatedCamera::new(), false).await;
    h.wait_state(|s| *s == SessionState::SafetyPending).await;

    let err = h.handle.retry_acquisition().await.unwrap_err();
    assert!(matches!(
        err,
        WayfinderError::InvalidAction {
            action: "retry_acquisition",
            ..
        }
    ));
    assert_eq!(h.handle.state(), SessionState::SafetyPending);

    h.handle.accept_safety(false).await.unwrap();
    h.wait_state(SessionState::is_active).await;
    assert!(h.handle.accept_safety(true).await.is_err());
    assert!(h.handle.cancel_safety().await.is_err());
    assert!(h.handle.retry_acquisition().await.is_err());
    assert_eq!(h.handle.state(), SessionState::Active);
}

// ============================================================================
// Guidance
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_guidance_walks_route_and_arrives_once() {
    let mut h = Harness::start(SimulatedCamera::new(), true).await;
    h.wait_state(SessionState::is_active).await;

    let snapshot = h.handle.snapshot();
    let initial = snapshot.guidance.unwrap();
    assert_eq!(initial.direction, Direction::Straight);
    assert_eq!(initial.distance_remaining_m, 25);

    advance(21_000).await;

    let path: Vec<(Direction, u32)> = h
        .session_events()
        .into_iter()
        .filter_map(|e| match e {
            SessionEvent::GuidanceUpdated { step, .. } => {
                Some((step.direction, step.distance_remaining_m))
            }
            _ => None,
        })
        .collect();
    assert_eq!(
        path,
        vec![
            (Direction::Straight, 25),
            (Direction::Left, 17),
            (Direction::Right, 9),
            (Direction::Arrived, 0),
        ]
    );

    // Keep going well past arrival: no more guidance, no second arrival
    advance(60_000).await;
    let events = h.session_events();
    let arrivals = events
        .iter()
        .filter(|e| matches!(e, SessionEvent::Arrived { .. }))
        .count();
    assert_eq!(arrivals, 1);
    let updates = events
        .iter()
        .filter(|e| matches!(e, SessionEvent::GuidanceUpdated { .. }))
        .count();
    assert_eq!(updates, 4);

    let snapshot = h.handle.snapshot();
    assert!(snapshot.arrived);
    assert_eq!(snapshot.state, SessionState::Active);
    assert_eq!(
        snapshot.guidance.map(|g| g.estimated_time_label),
        Some("Arrived".to_string())
    );
}

#[tokio::test(start_paused = true)]
async fn test_arrival_carries_audio_preference() {
    let mut h = Harness::start(SimulatedCamera::new(), true).await;
    h.wait_state(SessionState::is_active).await;

    h.handle.set_audio(false).await.unwrap();
    assert!(!h.handle.snapshot().audio_enabled);

    advance(16_000).await;
    let arrival = h
        .session_events()
        .into_iter()
        .find(|e| matches!(e, SessionEvent::Arrived { .. }));
    match arrival {
        Some(SessionEvent::Arrived {
            destination,
            audio_enabled,
        }) => {
            assert_eq!(destination, "Lab 4-B");
            assert!(!audio_enabled);
        }
        other => panic!("expected arrival, got {:?}", other),
    }
}

// ============================================================================
// Hazards
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_low_light_raised_then_cleared() {
    let mut h = Harness::start(SimulatedCamera::new().with_brightness(10), true).await;
    h.wait_state(SessionState::is_active).await;

    advance(1_500).await;
    let hazard = h.handle.snapshot().hazard.expect("low light should be live");
    assert_eq!(hazard.kind, HazardKind::LowLight);

    h.camera.set_brightness(150);
    advance(1_000).await;
    assert!(h.handle.snapshot().hazard.is_none());

    let events = h.session_events();
    assert!(events
        .iter()
        .any(|e| matches!(e, SessionEvent::HazardRaised { .. })));
    assert!(events
        .iter()
        .any(|e| matches!(e, SessionEvent::HazardCleared)));
}

#[tokio::test(start_paused = true)]
async fn test_obstacle_expires_after_dwell() {
    let detector = ScriptedDetector::new(vec![Some(HazardKind::Obstacle)]);
    let h = Harness::start_with(SimulatedCamera::new(), true, Box::new(detector)).await;
    h.wait_state(SessionState::is_active).await;

    // Raised at +1s, dwell 3s
    advance(3_500).await;
    assert_eq!(
        h.handle.snapshot().hazard.map(|s| s.kind),
        Some(HazardKind::Obstacle)
    );

    advance(1_000).await;
    assert!(h.handle.snapshot().hazard.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_renewed_obstacle_stays_live() {
    let detector = ScriptedDetector::new(vec![
        Some(HazardKind::Obstacle),
        Some(HazardKind::Obstacle),
        Some(HazardKind::Obstacle),
    ]);
    let mut h = Harness::start_with(SimulatedCamera::new(), true, Box::new(detector)).await;
    h.wait_state(SessionState::is_active).await;

    // Last renewal at +3s, so live until +6s
    advance(5_500).await;
    assert!(h.handle.snapshot().hazard.is_some());
    advance(1_000).await;
    assert!(h.handle.snapshot().hazard.is_none());

    let raised = h
        .session_events()
        .iter()
        .filter(|e| matches!(e, SessionEvent::HazardRaised { .. }))
        .count();
    assert_eq!(raised, 1, "renewals must not re-raise");
}

#[tokio::test(start_paused = true)]
async fn test_warmup_frames_are_skipped() {
    let camera = SimulatedCamera::new().with_brightness(10).warmup_frames(3);
    let h = Harness::start(camera, true).await;
    h.wait_state(SessionState::is_active).await;

    advance(3_500).await;
    assert!(h.handle.snapshot().hazard.is_none());
    assert_eq!(h.handle.state(), SessionState::Active);

    advance(1_000).await;
    assert_eq!(
        h.handle.snapshot().hazard.map(|s| s.kind),
        Some(HazardKind::LowLight)
    );
}

/// Backend whose driver hands over buffers shorter than the frame size.
struct TruncatedBufferCamera;

struct TruncatedBufferStream;

impl VideoStream for TruncatedBufferStream {
    fn read_frame(&mut self) -> Result<Frame, FrameError> {
        Frame::new(640, 480, vec![128; 30])
    }

    fn stop(&mut self) {}
}

#[async_trait]
impl CameraBackend for TruncatedBufferCamera {
    async fn open(&self, _preferences: &CameraPreferences) -> Result<OpenedStream, DeviceFailure> {
        let (ready_tx, ready) = oneshot::channel();
        let _ = ready_tx.send(());
        Ok(OpenedStream {
            stream: Box::new(TruncatedBufferStream),
            ready,
        })
    }
}

#[tokio::test(start_paused = true)]
async fn test_malformed_frames_are_skipped() {
    let samples = Arc::new(AtomicUsize::new(0));
    let resource = Arc::new(ResourceHandle::new(Arc::new(TruncatedBufferCamera)));
    let (runtime, mut events) = ChannelRuntime::pair();
    let store = Arc::new(MemoryStore::new());
    store.set(ACK_KEY, true).await.unwrap();

    let handle = SessionController::spawn(
        StaticDirectory::campus().find("3").unwrap(),
        SessionDeps {
            safety_gate: SafetyGate::new(store),
            camera: resource.clone(),
            detector: Box::new(CountingDetector {
                samples: samples.clone(),
            }),
            runtime: Arc::new(runtime),
        },
        test_config(),
    );
    handle.wait_for(|s| s.state.is_active()).await.unwrap();

    advance(5_500).await;
    assert_eq!(handle.state(), SessionState::Active);
    assert!(handle.snapshot().hazard.is_none());
    assert_eq!(samples.load(Ordering::SeqCst), 0, "bad frames reached the detector");

    assert_eq!(handle.close().await.unwrap(), SessionState::Closed);
    assert_eq!(resource.stats().released, 1);

    let mut saw_navigate = false;
    while let Ok(event) = events.try_recv() {
        saw_navigate |= matches!(event, RuntimeEvent::Navigate { .. });
    }
    assert!(saw_navigate);
}

// ============================================================================
// Cleanup
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_close_from_active_releases_and_stops_ticks() {
    let samples = Arc::new(AtomicUsize::new(0));
    let detector = CountingDetector {
        samples: samples.clone(),
    };
    let mut h = Harness::start_with(SimulatedCamera::new(), true, Box::new(detector)).await;
    h.wait_state(SessionState::is_active).await;

    advance(6_000).await;
    assert!(samples.load(Ordering::SeqCst) >= 5);

    let state = h.handle.close().await.unwrap();
    assert_eq!(state, SessionState::Closed);

    let stats = h.resource.stats();
    assert_eq!(stats.acquired, 1);
    assert_eq!(stats.released, stats.acquired);
    assert_eq!(h.camera.stop_calls(), 1);

    h.collect();
    let sampled = samples.load(Ordering::SeqCst);
    advance(60_000).await;
    assert_eq!(h.collect(), 0, "no events after close");
    assert_eq!(samples.load(Ordering::SeqCst), sampled, "no hazard ticks after close");

    // Closing again is a no-op
    assert_eq!(h.handle.close().await.unwrap(), SessionState::Closed);
    assert_eq!(h.resource.stats().released, 1);
    assert_eq!(h.navigations(), vec![HOME_ROUTE.to_string()]);
    assert!(h.handle.accept_safety(true).await.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_close_while_request_pending_cancels_it() {
    let h = Harness::start(SimulatedCamera::new().hang(), true).await;
    h.wait_state(|s| *s == SessionState::Acquiring).await;
    advance(100).await;
    assert!(h.resource.is_acquiring());

    h.handle.close().await.unwrap();
    advance(10).await;

    let stats = h.resource.stats();
    assert_eq!(stats.requests, 1);
    assert_eq!(stats.acquired, 0);
    assert_eq!(stats.released, 0);
    assert!(!h.resource.is_acquiring());
}

#[tokio::test(start_paused = true)]
async fn test_close_before_ready_releases_stream() {
    let camera = SimulatedCamera::new().ready_delay(Duration::from_secs(10));
    let mut h = Harness::start(camera, true).await;
    h.wait_state(|s| *s == SessionState::Acquiring).await;
    advance(100).await;
    assert_eq!(h.resource.stats().held(), 1);

    h.handle.close().await.unwrap();
    let stats = h.resource.stats();
    assert_eq!(stats.acquired, 1);
    assert_eq!(stats.released, 1);

    // The ready signal firing later changes nothing
    advance(20_000).await;
    assert_eq!(h.handle.state(), SessionState::Closed);
    assert!(!h.states().contains(&SessionState::Active));
    assert_eq!(h.resource.stats().released, 1);
}

#[tokio::test(start_paused = true)]
async fn test_close_from_error_state() {
    let camera = SimulatedCamera::new().fail_with(permission_denied());
    let h = Harness::start(camera, true).await;
    h.wait_state(|s| s.error().is_some()).await;

    assert_eq!(h.handle.close().await.unwrap(), SessionState::Closed);
    let stats = h.resource.stats();
    assert_eq!(stats.held(), 0);
    assert_eq!(stats.released, 0);
}

#[tokio::test(start_paused = true)]
async fn test_dropping_handles_tears_down() {
    let mut h = Harness::start(SimulatedCamera::new(), true).await;
    h.wait_state(SessionState::is_active).await;

    let extra = h.handle.clone();
    drop(extra);
    advance(10).await;
    assert_eq!(h.resource.stats().held(), 1, "a live handle keeps the session");

    drop(h.handle);
    advance(10).await;

    let stats = h.resource.stats();
    assert_eq!(stats.released, 1);
    assert_eq!(h.camera.stop_calls(), 1);

    let mut saw_closed = false;
    let mut saw_navigate = false;
    while let Ok(event) = h.events.try_recv() {
        match event {
            RuntimeEvent::Session(event) => {
                saw_closed |= matches!(*event, SessionEvent::Closed);
            }
            RuntimeEvent::Navigate { .. } => saw_navigate = true,
        }
    }
    assert!(saw_closed);
    assert!(saw_navigate);
}
