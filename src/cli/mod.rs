//! CLI module for Wayfinder headless operation.
//!
//! Hosts a single AR navigation session against the simulated camera so the
//! session lifecycle can be exercised from a terminal or a script.
//!
//! # Architecture
//!
//! The session never prints. It emits through the `WayfinderRuntime`
//! abstraction; the CLI runtime sends events through a channel that is
//! consumed by the output handler.
//!
//! ```text
//! +-------------------+     +-------------+     +---------------+
//! | SessionController | --> | CliRuntime  | --> | output.rs     |
//! | (actor task)      |     | (emit())    |     | (print/JSON)  |
//! +-------------------+     +-------------+     +---------------+
//!          ^
//!          |  /retry /close /audio
//!     +---------+
//!     | repl.rs |
//!     +---------+
//! ```

mod args;
mod bootstrap;
mod output;
mod repl;
mod runner;

pub use args::{Args, FailureKind};
pub use bootstrap::{init_logging, initialize, CliContext};
pub use output::{run_event_loop, LoopExit};
pub use repl::{run_repl, ReplCommand};
pub use runner::{list_destinations, resolve_destination, run_session};
