use async_trait::async_trait;
use tokio::sync::oneshot;

use super::error::DeviceFailure;
use super::frame::{Frame, FrameError};
use super::CameraPreferences;

/// A live video stream held by the session.
pub trait VideoStream: Send {
    /// Grab the most recent frame. Fails while warming up or after stop.
    fn read_frame(&mut self) -> Result<Frame, FrameError>;

    /// Stop every track. Must tolerate repeated calls.
    fn stop(&mut self);
}

/// A stream returned by a backend together with its readiness signal.
///
/// `ready` fires once the first frame has decoded. If the sender is dropped
/// without firing, the stream never became usable.
pub struct OpenedStream {
    pub stream: Box<dyn VideoStream>,
    pub ready: oneshot::Receiver<()>,
}

/// Platform seam for opening cameras.
///
/// Implementations must not retry on their own; every call is one request
/// to the underlying permission system.
#[async_trait]
pub trait CameraBackend: Send + Sync + 'static {
    async fn open(&self, preferences: &CameraPreferences) -> Result<OpenedStream, DeviceFailure>;
}
