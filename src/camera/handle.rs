//! Single-flight camera acquisition and exactly-once release.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::oneshot;
use uuid::Uuid;

use super::backend::{CameraBackend, OpenedStream, VideoStream};
use super::error::AcquisitionError;
use super::frame::{Frame, FrameError};
use super::CameraPreferences;

#[derive(Debug, Default)]
struct Counters {
    requests: AtomicUsize,
    acquired: AtomicUsize,
    released: AtomicUsize,
}

/// Snapshot of acquisition bookkeeping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResourceStats {
    /// Requests actually issued to the backend
    pub requests: usize,
    /// Requests that produced a stream
    pub acquired: usize,
    /// Streams released
    pub released: usize,
}

impl ResourceStats {
    /// Streams currently held.
    pub fn held(&self) -> usize {
        self.acquired.saturating_sub(self.released)
    }
}

/// Owns access to the camera for one session.
///
/// At most one acquisition is in flight: a second `acquire` while one is
/// pending is rejected without touching the backend, so the platform never
/// prompts twice.
pub struct ResourceHandle {
    backend: Arc<dyn CameraBackend>,
    in_flight: AtomicBool,
    counters: Arc<Counters>,
}

/// Clears the in-flight flag even if the acquire future is dropped mid-await.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl ResourceHandle {
    pub fn new(backend: Arc<dyn CameraBackend>) -> Self {
        Self {
            backend,
            in_flight: AtomicBool::new(false),
            counters: Arc::new(Counters::default()),
        }
    }

    /// Whether a request is currently pending.
    pub fn is_acquiring(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> ResourceStats {
        ResourceStats {
            requests: self.counters.requests.load(Ordering::Acquire),
            acquired: self.counters.acquired.load(Ordering::Acquire),
            released: self.counters.released.load(Ordering::Acquire),
        }
    }

    /// Request a stream. Never retries; retry is the caller's decision.
    pub async fn acquire(
        &self,
        preferences: &CameraPreferences,
    ) -> Result<StreamHandle, AcquisitionError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::warn!("[camera] Rejected duplicate acquisition request");
            return Err(AcquisitionError::already_in_flight());
        }
        let _guard = InFlightGuard(&self.in_flight);

        self.counters.requests.fetch_add(1, Ordering::AcqRel);
        tracing::info!(
            "[camera] Requesting stream (facing={:?}, {}x{} @ {}-{} fps)",
            preferences.facing_mode,
            preferences.width,
            preferences.height,
            preferences.min_frame_rate,
            preferences.max_frame_rate
        );

        match self.backend.open(preferences).await {
            Ok(opened) => {
                self.counters.acquired.fetch_add(1, Ordering::AcqRel);
                let handle = StreamHandle::new(opened, self.counters.clone());
                tracing::info!("[camera] Stream {} acquired", handle.id());
                Ok(handle)
            }
            Err(failure) => {
                tracing::warn!("[camera] Acquisition failed: {}", failure);
                Err(AcquisitionError::from(failure))
            }
        }
    }

    /// Release a held stream. Safe on an already-released handle.
    ///
    /// Returns whether this call did the release.
    pub fn release(&self, handle: &mut StreamHandle) -> bool {
        handle.release()
    }
}

/// One acquired stream.
///
/// Dropping a handle that was never released releases it.
pub struct StreamHandle {
    id: Uuid,
    stream: Option<Box<dyn VideoStream>>,
    ready: Option<oneshot::Receiver<()>>,
    counters: Arc<Counters>,
}

impl StreamHandle {
    fn new(opened: OpenedStream, counters: Arc<Counters>) -> Self {
        Self {
            id: Uuid::new_v4(),
            stream: Some(opened.stream),
            ready: Some(opened.ready),
            counters,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn is_released(&self) -> bool {
        self.stream.is_none()
    }

    /// Take the first-frame signal. Only the first call gets it.
    pub fn take_ready(&mut self) -> Option<oneshot::Receiver<()>> {
        self.ready.take()
    }

    pub fn read_frame(&mut self) -> Result<Frame, FrameError> {
        match self.stream.as_mut() {
            Some(stream) => stream.read_frame(),
            None => Err(FrameError::Released),
        }
    }

    fn release(&mut self) -> bool {
        match self.stream.take() {
            Some(mut stream) => {
                stream.stop();
                self.ready = None;
                self.counters.released.fetch_add(1, Ordering::AcqRel);
                tracing::info!("[camera] Stream {} released", self.id);
                true
            }
            None => {
                tracing::debug!("[camera] Stream {} already released", self.id);
                false
            }
        }
    }
}

impl Drop for StreamHandle {
    fn drop(&mut self) {
        if self.stream.is_some() {
            tracing::warn!("[camera] Stream {} dropped while held, releasing", self.id);
            self.release();
        }
    }
}

impl fmt::Debug for StreamHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamHandle")
            .field("id", &self.id)
            .field("released", &self.is_released())
            .finish_non_exhaustive()
    }
}
