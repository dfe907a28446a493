use super::{ConsentResult, RuntimeError, RuntimeEvent, WayfinderRuntime};
use async_trait::async_trait;
use std::io::{self, Write};
use tokio::sync::mpsc;

pub struct CliRuntime {
    event_tx: mpsc::UnboundedSender<RuntimeEvent>,
    auto_accept: Option<bool>,
    json_mode: bool,
}

impl CliRuntime {
    /// `auto_accept` answers consent without prompting; the inner flag is
    /// whether to remember the choice.
    pub fn new(
        event_tx: mpsc::UnboundedSender<RuntimeEvent>,
        auto_accept: Option<bool>,
        json_mode: bool,
    ) -> Self {
        Self {
            event_tx,
            auto_accept,
            json_mode,
        }
    }
}

fn prompt(question: &str) -> Result<String, RuntimeError> {
    eprint!("{}", question);
    io::stderr().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_lowercase())
}

#[async_trait]
impl WayfinderRuntime for CliRuntime {
    fn emit(&self, event: RuntimeEvent) -> Result<(), RuntimeError> {
        // Output loop in cli::output renders it
        self.event_tx
            .send(event)
            .map_err(|_| RuntimeError::ReceiverClosed)?;
        Ok(())
    }

    async fn request_safety_consent(
        &self,
        tips: Vec<String>,
    ) -> Result<ConsentResult, RuntimeError> {
        if let Some(remember) = self.auto_accept {
            if !self.json_mode {
                eprintln!("[auto-accepted] AR safety notice");
            }
            return Ok(ConsentResult::Accepted { remember });
        }

        if !atty::is(atty::Stream::Stdin) {
            return Err(RuntimeError::NotInteractive);
        }

        // Blocking stdin read off the async workers
        tokio::task::spawn_blocking(move || {
            eprintln!("\nAR Safety Notice");
            for tip in &tips {
                eprintln!("  - {}", tip);
            }

            match prompt("Start AR navigation? (y)es / (n)o: ")?.as_str() {
                "y" | "yes" => {
                    let remember = matches!(
                        prompt("Don't show this again? (y/N): ")?.as_str(),
                        "y" | "yes"
                    );
                    Ok(ConsentResult::Accepted { remember })
                }
                // Anything else is a decline
                _ => Ok(ConsentResult::Declined),
            }
        })
        .await
        .map_err(|e| RuntimeError::PromptFailed(e.to_string()))?
    }

    fn is_interactive(&self) -> bool {
        atty::is(atty::Stream::Stdin)
    }

    async fn shutdown(&self) -> Result<(), RuntimeError> {
        // No cleanup needed - channel drop handles it
        Ok(())
    }
}
