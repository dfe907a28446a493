use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{ConsentResult, RuntimeError, RuntimeEvent, WayfinderRuntime};

/// Headless runtime that forwards events into a channel.
///
/// Consent is answered from a fixed decision, or refused as non-interactive
/// when none is configured. Suitable for embedding and for tests.
pub struct ChannelRuntime {
    event_tx: mpsc::UnboundedSender<RuntimeEvent>,
    consent: Option<ConsentResult>,
}

impl ChannelRuntime {
    pub fn new(event_tx: mpsc::UnboundedSender<RuntimeEvent>) -> Self {
        Self {
            event_tx,
            consent: None,
        }
    }

    /// Channel runtime plus its receiving end.
    pub fn pair() -> (Self, mpsc::UnboundedReceiver<RuntimeEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    /// Answer every consent request with `consent`.
    pub fn with_consent(mut self, consent: ConsentResult) -> Self {
        self.consent = Some(consent);
        self
    }
}

#[async_trait]
impl WayfinderRuntime for ChannelRuntime {
    fn emit(&self, event: RuntimeEvent) -> Result<(), RuntimeError> {
        self.event_tx
            .send(event)
            .map_err(|_| RuntimeError::ReceiverClosed)
    }

    async fn request_safety_consent(
        &self,
        _tips: Vec<String>,
    ) -> Result<ConsentResult, RuntimeError> {
        self.consent.ok_or(RuntimeError::NotInteractive)
    }

    fn is_interactive(&self) -> bool {
        self.consent.is_some()
    }

    async fn shutdown(&self) -> Result<(), RuntimeError> {
        Ok(())
    }
}
