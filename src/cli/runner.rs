//! CLI execution runner.
//!
//! Resolves the destination, spawns one session, settles the safety notice and
//! then follows the session until it arrives or closes.

use anyhow::{Context, Result};

use crate::directory::{Category, Destination, DestinationDirectory};
use crate::error::WayfinderError;
use crate::hazard::{HazardConfig, HeuristicDetector};
use crate::runtime::{ConsentResult, RuntimeError};
use crate::safety::SAFETY_TIPS;
use crate::session::{SessionConfig, SessionController, SessionDeps, SessionHandle, SessionState};

use super::bootstrap::CliContext;
use super::output::{run_event_loop, LoopExit};
use super::repl::run_repl;

/// Pick a destination: exact id first, then the first search match.
pub fn resolve_destination(
    directory: &dyn DestinationDirectory,
    query: &str,
    category: Option<Category>,
) -> std::result::Result<Destination, WayfinderError> {
    if query.trim().is_empty() {
        return Err(WayfinderError::DestinationNotFound(
            "no destination given".to_string(),
        ));
    }

    directory
        .find(query.trim())
        .filter(|d| category.map_or(true, |c| d.category == c))
        .or_else(|| directory.search(query, category).into_iter().next())
        .ok_or_else(|| WayfinderError::DestinationNotFound(query.to_string()))
}

/// Print destinations matching the query and category.
pub fn list_destinations(ctx: &CliContext) -> Result<()> {
    let matches = ctx.directory.search(ctx.args.query(), ctx.args.category);

    if ctx.args.json {
        println!("{}", serde_json::to_string(&matches)?);
        return Ok(());
    }

    if matches.is_empty() {
        eprintln!("No destinations match '{}'", ctx.args.query());
    }
    for destination in &matches {
        println!(
            "{:>3}  {:<8} {}",
            destination.id,
            destination.category.as_str(),
            destination.summary()
        );
    }
    Ok(())
}

/// Settle the safety notice through the runtime.
async fn settle_safety(ctx: &CliContext, handle: &SessionHandle) -> Result<()> {
    let tips = SAFETY_TIPS.iter().map(|tip| tip.to_string()).collect();

    match ctx.runtime.request_safety_consent(tips).await {
        Ok(ConsentResult::Accepted { remember }) => {
            handle.accept_safety(remember).await?;
        }
        Ok(ConsentResult::Declined) => {
            handle.cancel_safety().await?;
        }
        Err(RuntimeError::NotInteractive) => {
            eprintln!("[cli] Safety notice needs a response; rerun with --accept-safety");
            handle.cancel_safety().await?;
        }
        Err(e) => {
            handle.cancel_safety().await?;
            return Err(e).context("Safety prompt failed");
        }
    }
    Ok(())
}

/// Run one navigation session to completion.
pub async fn run_session(ctx: &mut CliContext) -> Result<()> {
    let destination =
        resolve_destination(&ctx.directory, ctx.args.query(), ctx.args.category)?;
    if !ctx.args.json {
        eprintln!("[cli] Navigating to {}", destination.summary());
    }

    let detector = HeuristicDetector::new(HazardConfig::from(&ctx.settings.hazard));
    let handle = SessionController::spawn(
        destination,
        SessionDeps {
            safety_gate: ctx.safety_gate.clone(),
            camera: ctx.resource.clone(),
            detector: Box::new(detector),
            runtime: ctx.runtime.clone(),
        },
        SessionConfig::from(&ctx.settings),
    );

    let first = handle.wait_for(|s| s.state != SessionState::Idle).await?;
    if first.state == SessionState::SafetyPending {
        settle_safety(ctx, &handle).await?;
    }

    let interactive = ctx.runtime.is_interactive() && !ctx.args.json;
    let exit = {
        let output = run_event_loop(
            &mut ctx.event_rx,
            ctx.args.json,
            ctx.args.quiet,
            !interactive,
        );

        if interactive {
            tokio::select! {
                exit = output => exit?,
                repl = run_repl(&handle) => {
                    repl?;
                    LoopExit::Closed
                }
            }
        } else {
            output.await?
        }
    };

    tracing::debug!("[cli] Event loop finished: {:?}", exit);
    handle.close().await?;

    if exit == LoopExit::Failed {
        anyhow::bail!("Camera unavailable");
    }
    Ok(())
}
