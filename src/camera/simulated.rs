//! In-process camera used by the CLI and tests.

use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::oneshot;

use super::backend::{CameraBackend, OpenedStream, VideoStream};
use super::error::DeviceFailure;
use super::frame::{Frame, FrameError};
use super::CameraPreferences;

const ALWAYS: usize = usize::MAX;

/// Scriptable camera backend.
///
/// Produces uniform grey frames whose level can be changed while a stream
/// is live, and can be told to fail, hang, or never become ready.
pub struct SimulatedCamera {
    brightness: Arc<AtomicU8>,
    failure: Option<DeviceFailure>,
    failures_remaining: AtomicUsize,
    open_delay: Duration,
    hang: bool,
    ready_delay: Duration,
    never_ready: bool,
    warmup_frames: u32,
    open_calls: AtomicUsize,
    stop_calls: Arc<AtomicUsize>,
}

impl Default for SimulatedCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedCamera {
    pub fn new() -> Self {
        Self {
            brightness: Arc::new(AtomicU8::new(128)),
            failure: None,
            failures_remaining: AtomicUsize::new(0),
            open_delay: Duration::ZERO,
            hang: false,
            ready_delay: Duration::ZERO,
            never_ready: false,
            warmup_frames: 0,
            open_calls: AtomicUsize::new(0),
            stop_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_brightness(self, level: u8) -> Self {
        self.brightness.store(level, Ordering::Release);
        self
    }

    /// Fail every open with this platform error.
    pub fn fail_with(mut self, failure: DeviceFailure) -> Self {
        self.failure = Some(failure);
        self.failures_remaining = AtomicUsize::new(ALWAYS);
        self
    }

    /// Fail the next `times` opens, then succeed.
    pub fn fail_times(mut self, times: usize, failure: DeviceFailure) -> Self {
        self.failure = Some(failure);
        self.failures_remaining = AtomicUsize::new(times);
        self
    }

    pub fn open_delay(mut self, delay: Duration) -> Self {
        self.open_delay = delay;
        self
    }

    /// Never resolve the open request.
    pub fn hang(mut self) -> Self {
        self.hang = true;
        self
    }

    pub fn ready_delay(mut self, delay: Duration) -> Self {
        self.ready_delay = delay;
        self
    }

    /// Open succeeds but the first frame never decodes.
    pub fn never_ready(mut self) -> Self {
        self.never_ready = true;
        self
    }

    /// Number of reads per stream that report `NotReady` before frames flow.
    pub fn warmup_frames(mut self, frames: u32) -> Self {
        self.warmup_frames = frames;
        self
    }

    /// Change the scene brightness, including for live streams.
    pub fn set_brightness(&self, level: u8) {
        self.brightness.store(level, Ordering::Release);
    }

    pub fn brightness(&self) -> u8 {
        self.brightness.load(Ordering::Acquire)
    }

    /// Open requests received.
    pub fn open_calls(&self) -> usize {
        self.open_calls.load(Ordering::Acquire)
    }

    /// Streams stopped.
    pub fn stop_calls(&self) -> usize {
        self.stop_calls.load(Ordering::Acquire)
    }

    fn take_failure(&self) -> Option<DeviceFailure> {
        let failure = self.failure.as_ref()?;
        let claimed = self
            .failures_remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |left| match left {
                0 => None,
                ALWAYS => Some(ALWAYS),
                n => Some(n - 1),
            })
            .is_ok();
        claimed.then(|| failure.clone())
    }
}

#[async_trait]
impl CameraBackend for SimulatedCamera {
    async fn open(&self, preferences: &CameraPreferences) -> Result<OpenedStream, DeviceFailure> {
        self.open_calls.fetch_add(1, Ordering::AcqRel);

        if !self.open_delay.is_zero() {
            tokio::time::sleep(self.open_delay).await;
        }
        if self.hang {
            std::future::pending::<()>().await;
        }
        if let Some(failure) = self.take_failure() {
            tracing::debug!("[camera] Simulated open failure: {}", failure);
            return Err(failure);
        }

        let (ready_tx, ready_rx) = oneshot::channel();
        if self.never_ready {
            drop(ready_tx);
        } else if self.ready_delay.is_zero() {
            let _ = ready_tx.send(());
        } else {
            let delay = self.ready_delay;
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                let _ = ready_tx.send(());
            });
        }

        let stream = SimulatedStream {
            width: preferences.width,
            height: preferences.height,
            brightness: self.brightness.clone(),
            warmup_remaining: self.warmup_frames,
            stopped: false,
            stop_calls: self.stop_calls.clone(),
        };

        Ok(OpenedStream {
            stream: Box::new(stream),
            ready: ready_rx,
        })
    }
}

struct SimulatedStream {
    width: u32,
    height: u32,
    brightness: Arc<AtomicU8>,
    warmup_remaining: u32,
    stopped: bool,
    stop_calls: Arc<AtomicUsize>,
}

impl VideoStream for SimulatedStream {
    fn read_frame(&mut self) -> Result<Frame, FrameError> {
        if self.stopped {
            return Err(FrameError::Released);
        }
        if self.warmup_remaining > 0 {
            self.warmup_remaining -= 1;
            return Err(FrameError::NotReady);
        }
        Ok(Frame::solid(
            self.width,
            self.height,
            self.brightness.load(Ordering::Acquire),
        ))
    }

    fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.stop_calls.fetch_add(1, Ordering::AcqRel);
        }
    }
}
