//! CLI argument parsing using clap.
//!
//! Defines the command-line interface for wayfinder-cli.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::camera::DeviceFailure;
use crate::directory::Category;

/// Camera failure the simulated device reports on its first request.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Permission,
    NotFound,
    Busy,
    Unknown,
}

impl FailureKind {
    pub fn device_failure(&self) -> DeviceFailure {
        match self {
            FailureKind::Permission => {
                DeviceFailure::new("NotAllowedError", "Permission denied by user")
            }
            FailureKind::NotFound => {
                DeviceFailure::new("NotFoundError", "Requested device not found")
            }
            FailureKind::Busy => DeviceFailure::new("NotReadableError", "Could not start video source"),
            FailureKind::Unknown => DeviceFailure::new("TypeError", "Unexpected failure"),
        }
    }
}

/// Wayfinder CLI - AR campus navigation against a simulated camera
#[derive(Parser, Debug, Clone)]
#[command(name = "wayfinder-cli")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Destination id, or a search query (name or building)
    pub destination: Option<String>,

    /// List matching destinations and exit
    #[arg(short = 'l', long)]
    pub list: bool,

    /// Restrict matches to one category: class, lab, office, cafe, other
    #[arg(short = 'c', long)]
    pub category: Option<Category>,

    /// Accept the AR safety notice without prompting
    #[arg(long)]
    pub accept_safety: bool,

    /// Remember the safety acknowledgment for future sessions
    #[arg(long, requires = "accept_safety")]
    pub remember: bool,

    /// Forget a previously remembered acknowledgment before starting
    #[arg(long)]
    pub reset_safety: bool,

    /// Make the first camera request fail with this error
    #[arg(long, value_enum, value_name = "KIND")]
    pub simulate_failure: Option<FailureKind>,

    /// Scene brightness for the simulated camera (0-255)
    #[arg(long, value_name = "N")]
    pub brightness: Option<u8>,

    /// Override the data directory (acknowledgment storage)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Output events as JSON lines (for scripting/parsing)
    #[arg(long)]
    pub json: bool,

    /// Only print arrival, errors and hazards
    #[arg(long, short = 'q')]
    pub quiet: bool,

    /// Show verbose output (debug information)
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

impl Args {
    /// The search text, empty when no destination was given.
    pub fn query(&self) -> &str {
        self.destination.as_deref().unwrap_or("")
    }

    /// Consent decision to apply without prompting, if any.
    pub fn auto_accept(&self) -> Option<bool> {
        self.accept_safety.then_some(self.remember)
    }
}
