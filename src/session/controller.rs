//! The session actor.
//!
//! One tokio task owns every piece of session state. The handle, the
//! acquisition task, the ready signal and both timers all feed into a single
//! `select!` loop, so there is exactly one thread of control.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::events::SessionEvent;
use super::periodic::PeriodicTask;
use super::state::SessionState;
use crate::camera::{AcquisitionError, CameraPreferences, ResourceHandle, StreamHandle};
use crate::directory::Destination;
use crate::error::{Result, WayfinderError};
use crate::guidance::{GuidanceConfig, GuidanceSimulator, GuidanceStep};
use crate::hazard::{HazardChange, HazardConfig, HazardDetector, HazardMonitor, HazardSignal};
use crate::runtime::{RuntimeEvent, WayfinderRuntime};
use crate::safety::SafetyGate;
use crate::settings::WayfinderSettings;

/// Where the host should go once a session closes.
pub const HOME_ROUTE: &str = "/home";

/// Collaborators a session is built from.
pub struct SessionDeps {
    pub safety_gate: SafetyGate,
    /// Owned by this session alone
    pub camera: Arc<ResourceHandle>,
    pub detector: Box<dyn HazardDetector>,
    pub runtime: Arc<dyn WayfinderRuntime>,
}

/// Tunables for one session.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    pub preferences: CameraPreferences,
    pub guidance: GuidanceConfig,
    pub hazard: HazardConfig,
}

impl From<&WayfinderSettings> for SessionConfig {
    fn from(settings: &WayfinderSettings) -> Self {
        Self {
            preferences: CameraPreferences::from(&settings.camera),
            guidance: GuidanceConfig::from(&settings.guidance),
            hazard: HazardConfig::from(&settings.hazard),
        }
    }
}

/// What the host can render at any moment.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub destination: Destination,
    pub state: SessionState,
    /// Present only while active
    pub guidance: Option<GuidanceStep>,
    /// Present only while active and a warning is live
    pub hazard: Option<HazardSignal>,
    pub audio_enabled: bool,
    pub arrived: bool,
}

#[derive(Debug)]
enum Action {
    AcceptSafety { remember: bool },
    CancelSafety,
    RetryAcquisition,
    Close,
    SetAudio(bool),
}

impl Action {
    fn name(&self) -> &'static str {
        match self {
            Action::AcceptSafety { .. } => "accept_safety",
            Action::CancelSafety => "cancel_safety",
            Action::RetryAcquisition => "retry_acquisition",
            Action::Close => "close",
            Action::SetAudio(_) => "set_audio",
        }
    }
}

struct Command {
    action: Action,
    reply: oneshot::Sender<Result<SessionState>>,
}

struct AcquisitionOutcome {
    attempt: u64,
    result: std::result::Result<StreamHandle, AcquisitionError>,
}

/// Handle to a running session. Cheap to clone.
///
/// Dropping the last handle tears the session down.
#[derive(Clone)]
pub struct SessionHandle {
    id: Uuid,
    command_tx: mpsc::Sender<Command>,
    snapshot_rx: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    pub fn state(&self) -> SessionState {
        self.snapshot_rx.borrow().state.clone()
    }

    /// Receiver that observes every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot_rx.clone()
    }

    /// Wait until a snapshot satisfies `predicate`, checking the current one first.
    pub async fn wait_for<F>(&self, mut predicate: F) -> Result<SessionSnapshot>
    where
        F: FnMut(&SessionSnapshot) -> bool,
    {
        let mut rx = self.subscribe();
        let snapshot = rx
            .wait_for(|snapshot| predicate(snapshot))
            .await
            .map_err(|_| WayfinderError::SessionClosed)?;
        Ok((*snapshot).clone())
    }

    /// Accept the safety notice, optionally remembering it for future sessions.
    pub async fn accept_safety(&self, remember: bool) -> Result<SessionState> {
        self.send(Action::AcceptSafety { remember }).await
    }

    pub async fn cancel_safety(&self) -> Result<SessionState> {
        self.send(Action::CancelSafety).await
    }

    pub async fn retry_acquisition(&self) -> Result<SessionState> {
        self.send(Action::RetryAcquisition).await
    }

    /// Close from any state. Closing a closed session is a no-op.
    pub async fn close(&self) -> Result<SessionState> {
        self.send(Action::Close).await
    }

    pub async fn set_audio(&self, enabled: bool) -> Result<SessionState> {
        self.send(Action::SetAudio(enabled)).await
    }

    async fn send(&self, action: Action) -> Result<SessionState> {
        let (reply, reply_rx) = oneshot::channel();
        self.command_tx
            .send(Command { action, reply })
            .await
            .map_err(|_| WayfinderError::SessionClosed)?;
        reply_rx.await.map_err(|_| WayfinderError::SessionClosed)?
    }
}

/// Composes safety gate, camera, guidance and hazard sampling into one
/// session lifecycle.
pub struct SessionController {
    id: Uuid,
    destination: Destination,
    state: SessionState,
    config: SessionConfig,

    safety_gate: SafetyGate,
    camera: Arc<ResourceHandle>,
    detector: Box<dyn HazardDetector>,
    runtime: Arc<dyn WayfinderRuntime>,

    attempt: u64,
    acquisition: Option<CancellationToken>,
    outcome_tx: mpsc::UnboundedSender<AcquisitionOutcome>,
    outcome_rx: mpsc::UnboundedReceiver<AcquisitionOutcome>,
    stream: Option<StreamHandle>,
    ready_rx: Option<oneshot::Receiver<()>>,

    guidance: GuidanceSimulator,
    guidance_timer: PeriodicTask,
    hazard: HazardMonitor,
    hazard_timer: PeriodicTask,
    audio_enabled: bool,
    arrived: bool,

    command_rx: mpsc::Receiver<Command>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
}

impl SessionController {
    /// Start a session for `destination` and return its handle.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(destination: Destination, deps: SessionDeps, config: SessionConfig) -> SessionHandle {
        let id = Uuid::new_v4();
        let (command_tx, command_rx) = mpsc::channel(32);
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(SessionSnapshot {
            session_id: id,
            destination: destination.clone(),
            state: SessionState::Idle,
            guidance: None,
            hazard: None,
            audio_enabled: true,
            arrived: false,
        });

        let controller = Self {
            id,
            destination,
            state: SessionState::Idle,
            guidance: GuidanceSimulator::new(config.guidance.clone()),
            hazard: HazardMonitor::new(config.hazard.dwell),
            config,
            safety_gate: deps.safety_gate,
            camera: deps.camera,
            detector: deps.detector,
            runtime: deps.runtime,
            attempt: 0,
            acquisition: None,
            outcome_tx,
            outcome_rx,
            stream: None,
            ready_rx: None,
            guidance_timer: PeriodicTask::new("guidance"),
            hazard_timer: PeriodicTask::new("hazard"),
            audio_enabled: true,
            arrived: false,
            command_rx,
            snapshot_tx,
        };

        tokio::spawn(controller.run());

        SessionHandle {
            id,
            command_tx,
            snapshot_rx,
        }
    }

    async fn run(mut self) {
        tracing::info!(
            "[session] {} started for '{}' ({})",
            self.id,
            self.destination.name,
            self.destination.id
        );

        if self.safety_gate.is_acknowledged().await {
            self.transition(SessionState::Acquiring);
            self.begin_acquisition();
        } else {
            self.transition(SessionState::SafetyPending);
        }

        loop {
            let hazard_deadline = self.hazard.expires_at();

            tokio::select! {
                biased;

                command = self.command_rx.recv() => match command {
                    Some(Command { action, reply }) => {
                        let result = self.handle_action(action).await;
                        let _ = reply.send(result);
                    }
                    None => {
                        tracing::debug!("[session] {} all handles dropped, tearing down", self.id);
                        self.close();
                        break;
                    }
                },

                Some(outcome) = self.outcome_rx.recv() => self.on_acquisition(outcome),

                ready = wait_ready(&mut self.ready_rx) => self.on_ready(ready.is_ok()),

                _ = self.guidance_timer.tick() => self.on_guidance_tick(),

                _ = self.hazard_timer.tick() => self.on_hazard_tick(),

                _ = wait_until(hazard_deadline) => {
                    let change = self.hazard.expire(Instant::now());
                    self.apply_hazard_change(change);
                }
            }
        }

        if let Err(e) = self.runtime.shutdown().await {
            tracing::debug!("[session] Runtime shutdown failed: {}", e);
        }
        tracing::debug!("[session] {} task finished", self.id);
    }

    async fn handle_action(&mut self, action: Action) -> Result<SessionState> {
        tracing::debug!("[session] {} action {} in {}", self.id, action.name(), self.state);

        match action {
            Action::AcceptSafety { remember } if self.state == SessionState::SafetyPending => {
                if remember {
                    self.safety_gate.acknowledge().await;
                }
                self.transition(SessionState::Acquiring);
                self.begin_acquisition();
            }
            Action::CancelSafety if self.state == SessionState::SafetyPending => self.close(),
            Action::RetryAcquisition if self.state.error().is_some() => {
                self.transition(SessionState::Acquiring);
                self.begin_acquisition();
            }
            Action::Close => self.close(),
            Action::SetAudio(enabled) if !self.state.is_terminal() => {
                if self.audio_enabled != enabled {
                    self.audio_enabled = enabled;
                    self.emit(SessionEvent::AudioToggled { enabled });
                    self.publish();
                }
            }
            other => {
                tracing::debug!("[session] Rejected {} in {}", other.name(), self.state);
                return Err(WayfinderError::InvalidAction {
                    state: self.state.to_string(),
                    action: other.name(),
                });
            }
        }

        Ok(self.state.clone())
    }

    fn transition(&mut self, next: SessionState) -> bool {
        if !self.state.can_transition_to(&next) {
            tracing::warn!("[session] Ignoring illegal transition {} -> {}", self.state, next);
            return false;
        }

        let from = std::mem::replace(&mut self.state, next.clone());
        tracing::info!("[session] {} {} -> {}", self.id, from, next);
        self.emit(SessionEvent::StateChanged { from, to: next });
        self.publish();
        true
    }

    fn begin_acquisition(&mut self) {
        self.attempt += 1;
        let attempt = self.attempt;
        let token = CancellationToken::new();
        self.acquisition = Some(token.clone());

        let camera = self.camera.clone();
        let preferences = self.config.preferences.clone();
        let outcome_tx = self.outcome_tx.clone();

        tokio::spawn(async move {
            tokio::select! {
                biased;

                _ = token.cancelled() => {
                    tracing::debug!("[session] Acquisition attempt {} cancelled", attempt);
                }
                result = camera.acquire(&preferences) => {
                    // Receiver gone means the session ended; the stream drops and releases
                    let _ = outcome_tx.send(AcquisitionOutcome { attempt, result });
                }
            }
        });
    }

    fn on_acquisition(&mut self, outcome: AcquisitionOutcome) {
        let current = outcome.attempt == self.attempt
            && self.state == SessionState::Acquiring
            && self.stream.is_none();

        if !current {
            tracing::debug!(
                "[session] Ignoring stale acquisition attempt {} in {}",
                outcome.attempt,
                self.state
            );
            if let Ok(mut stream) = outcome.result {
                self.camera.release(&mut stream);
            }
            return;
        }

        self.acquisition = None;
        match outcome.result {
            Ok(mut stream) => {
                self.ready_rx = stream.take_ready();
                self.stream = Some(stream);
                if self.ready_rx.is_none() {
                    self.fail(AcquisitionError::never_ready());
                }
            }
            Err(error) => self.fail(error),
        }
    }

    fn on_ready(&mut self, fired: bool) {
        self.ready_rx = None;
        if self.state != SessionState::Acquiring {
            return;
        }
        if !fired {
            tracing::warn!("[session] {} stream ended before its first frame", self.id);
            self.fail(AcquisitionError::never_ready());
            return;
        }

        if self.transition(SessionState::Active) {
            self.guidance_timer.start(self.config.guidance.tick_interval);
            self.hazard_timer.start(self.config.hazard.sample_interval);
            self.emit(SessionEvent::GuidanceUpdated {
                step: self.guidance.current().clone(),
                progress: self
                    .guidance
                    .current()
                    .progress(self.config.guidance.initial_distance_m),
            });
        }
    }

    fn fail(&mut self, error: AcquisitionError) {
        self.ready_rx = None;
        self.release_stream();
        tracing::warn!("[session] {} acquisition failed: {}", self.id, error);

        if self.transition(SessionState::Error(error.clone())) {
            self.emit(SessionEvent::AcquisitionFailed {
                error,
                retryable: true,
            });
        }
    }

    fn on_guidance_tick(&mut self) {
        let Some(update) = self.guidance.advance() else {
            self.guidance_timer.stop();
            return;
        };

        let progress = update
            .step
            .progress(self.config.guidance.initial_distance_m);
        self.emit(SessionEvent::GuidanceUpdated {
            step: update.step,
            progress,
        });

        if update.arrived {
            self.guidance_timer.stop();
            self.arrived = true;
            tracing::info!("[session] {} arrived at '{}'", self.id, self.destination.name);
            self.emit(SessionEvent::Arrived {
                destination: self.destination.name.clone(),
                audio_enabled: self.audio_enabled,
            });
        }
        self.publish();
    }

    fn on_hazard_tick(&mut self) {
        let now = Instant::now();
        let change = match self.stream.as_mut().map(|stream| stream.read_frame()) {
            Some(Ok(frame)) => {
                let sample = self.detector.sample(&frame);
                self.hazard.observe(sample, now)
            }
            Some(Err(e)) => {
                tracing::debug!("[hazard] Skipping sample: {}", e);
                self.hazard.expire(now)
            }
            None => return,
        };
        self.apply_hazard_change(change);
    }

    fn apply_hazard_change(&mut self, change: HazardChange) {
        match change {
            HazardChange::Raised(signal) => {
                tracing::info!("[hazard] {}: {}", signal.kind, signal.message);
                self.emit(SessionEvent::HazardRaised { signal });
            }
            HazardChange::Cleared => {
                tracing::debug!("[hazard] Cleared");
                self.emit(SessionEvent::HazardCleared);
            }
            HazardChange::Renewed | HazardChange::Unchanged => return,
        }
        self.publish();
    }

    /// The single cleanup path. Safe to call repeatedly.
    fn close(&mut self) {
        if self.state.is_terminal() {
            return;
        }

        self.guidance_timer.stop();
        self.hazard_timer.stop();
        if let Some(token) = self.acquisition.take() {
            token.cancel();
        }
        self.ready_rx = None;
        self.release_stream();
        self.hazard.clear();

        if self.transition(SessionState::Closed) {
            self.emit(SessionEvent::Closed);
            if let Err(e) = self.runtime.emit(RuntimeEvent::Navigate {
                to: HOME_ROUTE.to_string(),
            }) {
                tracing::debug!("[session] Navigate not delivered: {}", e);
            }
        }
    }

    fn release_stream(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            self.camera.release(&mut stream);
        }
    }

    fn emit(&self, event: SessionEvent) {
        let name = event.name();
        if let Err(e) = self.runtime.emit(RuntimeEvent::Session(Box::new(event))) {
            tracing::debug!("[session] Event {} not delivered: {}", name, e);
        }
    }

    fn publish(&self) {
        let active = self.state.is_active();
        self.snapshot_tx.send_replace(SessionSnapshot {
            session_id: self.id,
            destination: self.destination.clone(),
            state: self.state.clone(),
            guidance: active.then(|| self.guidance.current().clone()),
            hazard: if active {
                self.hazard.current().cloned()
            } else {
                None
            },
            audio_enabled: self.audio_enabled,
            arrived: self.arrived,
        });
    }
}

async fn wait_ready(
    ready: &mut Option<oneshot::Receiver<()>>,
) -> std::result::Result<(), oneshot::error::RecvError> {
    match ready.as_mut() {
        Some(rx) => rx.await,
        None => std::future::pending().await,
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}
