//! Wayfinder CLI - Headless host for AR navigation sessions
//!
//! Runs one navigation session against the simulated camera so the session
//! lifecycle (safety notice, camera acquisition, guidance, hazards, close)
//! can be driven from a terminal or a script.
//!
//! # Usage
//!
//! ```bash
//! # List destinations
//! ./target/debug/wayfinder-cli --list
//! ./target/debug/wayfinder-cli --list -c cafe
//!
//! # Navigate, accepting the safety notice up front
//! ./target/debug/wayfinder-cli starbucks --accept-safety
//!
//! # JSON event stream for scripting
//! ./target/debug/wayfinder-cli 3 --accept-safety --json | jq .
//!
//! # Exercise the failure path; type /retry to request the camera again
//! ./target/debug/wayfinder-cli "lab 4-b" --simulate-failure permission
//! ```

use anyhow::Result;
use clap::Parser;

use wayfinder_lib::cli::{initialize, list_destinations, run_session, Args};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut ctx = initialize(&args).await?;

    let result = if args.list {
        list_destinations(&ctx)
    } else {
        run_session(&mut ctx).await
    };

    // Graceful shutdown
    ctx.shutdown().await?;

    result
}
