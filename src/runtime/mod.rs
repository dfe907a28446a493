// Presentation seam between a navigation session and whatever hosts it.
//
// The session never prints, prompts, or navigates on its own. It hands events
// to a `WayfinderRuntime`, and the host decides how to present them.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::session::SessionEvent;

/// Runtime-specific errors
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Failed to emit event: {0}")]
    EmitFailed(String),

    #[error("Event receiver closed")]
    ReceiverClosed,

    #[error("Not running in interactive mode (no TTY)")]
    NotInteractive,

    #[error("Prompt failed: {0}")]
    PromptFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Events delivered to the host
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuntimeEvent {
    /// Something happened inside a navigation session
    Session(Box<SessionEvent>),

    /// The session ended; the host should leave the AR screen
    Navigate { to: String },
}

/// User's answer to the safety notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsentResult {
    Accepted { remember: bool },
    Declined,
}

/// Host abstraction for presenting a session.
///
/// Object-safe; used as `Arc<dyn WayfinderRuntime>`.
#[async_trait]
pub trait WayfinderRuntime: Send + Sync + 'static {
    /// Deliver an event to the host.
    ///
    /// # Errors
    /// `RuntimeError::ReceiverClosed` when nobody is listening any more.
    fn emit(&self, event: RuntimeEvent) -> Result<(), RuntimeError>;

    /// Show the safety tips and wait for the user's decision.
    ///
    /// Takes owned strings to keep the boxed future `'static`-friendly.
    async fn request_safety_consent(
        &self,
        tips: Vec<String>,
    ) -> Result<ConsentResult, RuntimeError>;

    /// Whether a user is present to answer prompts
    fn is_interactive(&self) -> bool;

    /// Flush whatever is still buffered.
    async fn shutdown(&self) -> Result<(), RuntimeError>;
}

mod channel;
#[cfg(feature = "cli")]
pub mod cli;

pub use channel::ChannelRuntime;
#[cfg(feature = "cli")]
pub use cli::CliRuntime;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_prompt_failure_is_not_an_emit_failure() {
        let join_error = tokio::spawn(async { panic!("stdin reader crashed") })
            .await
            .unwrap_err();
        let err = RuntimeError::PromptFailed(join_error.to_string());

        assert!(!matches!(err, RuntimeError::EmitFailed(_)));
        assert!(err.to_string().starts_with("Prompt failed: "));
    }
}
