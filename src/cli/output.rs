//! CLI output handling - Event receiver loop.
//!
//! Receives session events from the runtime channel and renders them based on
//! output mode (terminal, JSON, or quiet). The loop also decides when the CLI
//! is done: on arrival, on close, or on an acquisition failure when nobody is
//! around to type `/retry`.

use std::io::{self, Write};

use anyhow::Result;
use tokio::sync::mpsc;

use crate::runtime::RuntimeEvent;
use crate::session::SessionEvent;

/// Why the event loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    Arrived,
    Closed,
    Failed,
    /// The runtime channel closed
    Disconnected,
}

/// Run the event loop until the session arrives, closes, or (when
/// `exit_on_failure` is set) fails to acquire the camera.
pub async fn run_event_loop(
    event_rx: &mut mpsc::UnboundedReceiver<RuntimeEvent>,
    json_mode: bool,
    quiet_mode: bool,
    exit_on_failure: bool,
) -> Result<LoopExit> {
    while let Some(event) = event_rx.recv().await {
        if json_mode {
            // JSON mode: output each event as a JSON line
            println!("{}", serde_json::to_string(&event)?);
            io::stdout().flush()?;
        }

        match event {
            RuntimeEvent::Session(session_event) => {
                if !json_mode {
                    if let Some(line) = format_event(&session_event, quiet_mode, exit_on_failure) {
                        println!("{}", line);
                    }
                }

                match *session_event {
                    SessionEvent::Arrived { .. } => return Ok(LoopExit::Arrived),
                    SessionEvent::AcquisitionFailed { .. } if exit_on_failure => {
                        return Ok(LoopExit::Failed)
                    }
                    _ => {}
                }
            }
            RuntimeEvent::Navigate { to } => {
                tracing::debug!("[cli] Session asked to navigate to {}", to);
                return Ok(LoopExit::Closed);
            }
        }
    }

    Ok(LoopExit::Disconnected)
}

/// Render one event for the terminal. `None` means nothing to show.
fn format_event(event: &SessionEvent, quiet_mode: bool, exit_on_failure: bool) -> Option<String> {
    let line = match event {
        SessionEvent::Arrived {
            destination,
            audio_enabled,
        } => {
            let speaker = if *audio_enabled { " [audio]" } else { "" };
            format!("You've arrived! {}{}", destination, speaker)
        }
        SessionEvent::HazardRaised { signal } => format!("[hazard] {}", signal.message),
        SessionEvent::AcquisitionFailed { error, retryable } => {
            if *retryable && !exit_on_failure {
                format!("[camera] {} Type /retry to try again.", error.message)
            } else {
                format!("[camera] {}", error.message)
            }
        }
        // Everything below is progress chatter
        _ if quiet_mode => return None,
        SessionEvent::StateChanged { to, .. } => format!("[session] {}", to),
        SessionEvent::GuidanceUpdated { step, progress } => format!(
            "[guide] {} - {} m ({}) {:.0}%",
            step.direction.label(),
            step.distance_remaining_m,
            step.estimated_time_label,
            progress * 100.0
        ),
        SessionEvent::HazardCleared => "[hazard] clear".to_string(),
        SessionEvent::AudioToggled { enabled } => {
            format!("[audio] {}", if *enabled { "on" } else { "off" })
        }
        SessionEvent::Closed => "[session] closed".to_string(),
    };
    Some(line)
}
