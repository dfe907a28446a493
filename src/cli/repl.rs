//! Lightweight command REPL for a running session.
//!
//! Supports:
//! - `/retry` - Request the camera again after a failure
//! - `/close` - Close the session
//! - `/status` - Print the current snapshot
//! - `/audio on|off` - Toggle spoken guidance
//! - `/quit`, `/exit`, `/q` - Close and exit

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::session::{SessionHandle, SessionSnapshot};

/// REPL command variants.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    Retry,
    Close,
    Status,
    Audio(bool),
    /// Exit the REPL
    Quit,
    /// Unknown command (will show help)
    Unknown(String),
    /// Empty input (skip)
    Empty,
}

impl ReplCommand {
    /// Parse user input into a REPL command.
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();

        if trimmed.is_empty() {
            return ReplCommand::Empty;
        }

        let lowered = trimmed.to_lowercase();
        let mut words = lowered.split_whitespace();
        let command = words.next().unwrap_or_default();
        let argument = words.next();

        match (command, argument) {
            ("/retry", None) => ReplCommand::Retry,
            ("/close", None) => ReplCommand::Close,
            ("/status", None) => ReplCommand::Status,
            ("/audio", Some("on")) => ReplCommand::Audio(true),
            ("/audio", Some("off")) => ReplCommand::Audio(false),
            ("/quit" | "/exit" | "/q", None) => ReplCommand::Quit,
            _ => ReplCommand::Unknown(trimmed.to_string()),
        }
    }
}

/// One-line summary of a snapshot for `/status`.
pub fn describe(snapshot: &SessionSnapshot) -> String {
    let mut parts = vec![
        format!("{} -> {}", snapshot.state, snapshot.destination.summary()),
    ];
    if let Some(ref step) = snapshot.guidance {
        parts.push(format!(
            "{} {} m ({})",
            step.direction.label(),
            step.distance_remaining_m,
            step.estimated_time_label
        ));
    }
    if let Some(ref hazard) = snapshot.hazard {
        parts.push(format!("hazard: {}", hazard.kind));
    }
    parts.push(format!(
        "audio {}",
        if snapshot.audio_enabled { "on" } else { "off" }
    ));
    parts.join(" | ")
}

/// Read commands from stdin and apply them to the session.
///
/// Returns on `/quit`, `/close`, or EOF (Ctrl+D).
pub async fn run_repl(handle: &SessionHandle) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    eprintln!("Commands: /retry, /close, /status, /audio on|off, /quit");

    while let Some(input) = lines.next_line().await? {
        let result = match ReplCommand::parse(&input) {
            ReplCommand::Empty => continue,
            ReplCommand::Quit | ReplCommand::Close => {
                handle.close().await?;
                break;
            }
            ReplCommand::Retry => handle.retry_acquisition().await.map(|_| ()),
            ReplCommand::Audio(enabled) => handle.set_audio(enabled).await.map(|_| ()),
            ReplCommand::Status => {
                eprintln!("{}", describe(&handle.snapshot()));
                Ok(())
            }
            ReplCommand::Unknown(cmd) => {
                eprintln!("Unknown command: {}", cmd);
                eprintln!("Available: /retry, /close, /status, /audio on|off, /quit");
                Ok(())
            }
        };

        if let Err(e) = result {
            eprintln!("Error: {}", e);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    mod parse_tests {
        use super::*;

        #[test]
        fn parses_session_commands() {
            assert_eq!(ReplCommand::parse("/retry"), ReplCommand::Retry);
            assert_eq!(ReplCommand::parse("/close"), ReplCommand::Close);
            assert_eq!(ReplCommand::parse("/status"), ReplCommand::Status);
        }

        #[test]
        fn parses_audio_toggle() {
            assert_eq!(ReplCommand::parse("/audio on"), ReplCommand::Audio(true));
            assert_eq!(ReplCommand::parse("/AUDIO Off"), ReplCommand::Audio(false));
            assert_eq!(
                ReplCommand::parse("/audio"),
                ReplCommand::Unknown("/audio".to_string())
            );
            assert_eq!(
                ReplCommand::parse("/audio loud"),
                ReplCommand::Unknown("/audio loud".to_string())
            );
        }

        #[test]
        fn parses_quit_aliases_case_insensitive() {
            assert_eq!(ReplCommand::parse("/quit"), ReplCommand::Quit);
            assert_eq!(ReplCommand::parse("/EXIT"), ReplCommand::Quit);
            assert_eq!(ReplCommand::parse("/q"), ReplCommand::Quit);
        }

        #[test]
        fn parses_unknown_input() {
            assert_eq!(
                ReplCommand::parse("/help"),
                ReplCommand::Unknown("/help".to_string())
            );
            assert_eq!(
                ReplCommand::parse("take me home"),
                ReplCommand::Unknown("take me home".to_string())
            );
        }

        #[test]
        fn parses_empty_input() {
            assert_eq!(ReplCommand::parse(""), ReplCommand::Empty);
            assert_eq!(ReplCommand::parse("  \t\n"), ReplCommand::Empty);
        }

        #[test]
        fn trims_whitespace_and_newlines() {
            assert_eq!(ReplCommand::parse("  /retry \n"), ReplCommand::Retry);
            assert_eq!(ReplCommand::parse("/audio   on\n"), ReplCommand::Audio(true));
        }
    }

    #[test]
    fn test_describe_snapshot() {
        use crate::directory::{DestinationDirectory, StaticDirectory};
        use crate::guidance::{Direction, GuidanceStep};
        use crate::session::SessionState;

        let snapshot = SessionSnapshot {
            session_id: uuid::Uuid::new_v4(),
            destination: StaticDirectory::campus().find("10").unwrap(),
            state: SessionState::Active,
            guidance: Some(GuidanceStep::new(Direction::Right, 9, 1.2)),
            hazard: None,
            audio_enabled: false,
            arrived: false,
        };
        assert_eq!(
            describe(&snapshot),
            "active -> Starbucks, Main Building (G) | Turn Right 9 m (<1 min) | audio off"
        );
    }
}
