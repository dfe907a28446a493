//! CLI bootstrap - wire settings, storage, camera and runtime for one session.
//!
//! `CliContext` owns everything a session needs except the session itself,
//! which `runner` spawns once a destination has been resolved.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing_subscriber::filter::Directive;

use crate::camera::{ResourceHandle, SimulatedCamera};
use crate::directory::StaticDirectory;
use crate::runtime::{CliRuntime, RuntimeEvent, WayfinderRuntime};
use crate::safety::{JsonFileStore, SafetyGate};
use crate::settings::{get_with_env_fallback, wayfinder_home, SettingsManager, WayfinderSettings};

use super::args::Args;

/// Context for CLI execution containing all initialized services.
pub struct CliContext {
    /// Runtime abstraction for event emission
    pub runtime: Arc<dyn WayfinderRuntime>,

    /// Event receiver for output handling
    pub event_rx: mpsc::UnboundedReceiver<RuntimeEvent>,

    /// Settings snapshot taken at startup
    pub settings: WayfinderSettings,

    /// Settings manager
    pub settings_manager: Arc<SettingsManager>,

    /// Where the acknowledgment flag lives
    pub data_dir: PathBuf,

    pub safety_gate: SafetyGate,

    pub directory: StaticDirectory,

    /// The simulated device, kept for brightness control
    pub camera: Arc<SimulatedCamera>,

    /// Camera resource for the session
    pub resource: Arc<ResourceHandle>,

    /// Command-line arguments
    pub args: Args,
}

impl CliContext {
    /// Graceful shutdown - flush the runtime.
    pub async fn shutdown(self) -> Result<()> {
        if let Err(e) = self.runtime.shutdown().await {
            tracing::warn!("Runtime shutdown error: {}", e);
        }
        Ok(())
    }
}

/// Install the tracing subscriber. Safe to call more than once.
pub fn init_logging(level: &str) {
    let directive: Result<Directive, _> = format!("wayfinder={}", level)
        .parse()
        .or_else(|_| "wayfinder=info".parse());

    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    if let Ok(directive) = directive {
        filter = filter.add_directive(directive);
    }

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Resolve the data directory: CLI arg > settings/env > `~/.wayfinder`.
fn resolve_data_dir(args: &Args, settings: &WayfinderSettings) -> PathBuf {
    if let Some(ref dir) = args.data_dir {
        return dir.clone();
    }
    get_with_env_fallback(&settings.storage.data_dir, &["WAYFINDER_DATA_DIR"], None)
        .map(PathBuf::from)
        .unwrap_or_else(wayfinder_home)
}

/// Initialize the CLI context with all services.
pub async fn initialize(args: &Args) -> Result<CliContext> {
    // Load settings
    let settings_manager = Arc::new(
        SettingsManager::new()
            .await
            .context("Failed to initialize settings manager")?,
    );

    let settings = settings_manager.get().await;

    // Initialize logging based on verbosity
    let log_level = if args.verbose {
        "debug"
    } else {
        settings.advanced.log_level.as_str()
    };
    init_logging(log_level);

    // Ensure settings file exists (creates template on first run)
    if let Err(e) = settings_manager.ensure_settings_file().await {
        tracing::warn!("Failed to create settings template: {}", e);
    }

    if args.verbose {
        eprintln!(
            "[cli] Settings loaded from {}",
            settings_manager.path().display()
        );
    }

    let data_dir = resolve_data_dir(args, &settings);
    tokio::fs::create_dir_all(&data_dir)
        .await
        .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;

    let store = Arc::new(JsonFileStore::new(&data_dir));
    if args.verbose {
        eprintln!("[cli] Acknowledgment store: {}", store.path().display());
    }
    let safety_gate = SafetyGate::new(store);

    if args.reset_safety {
        safety_gate.reset().await;
        if !args.json {
            eprintln!("[cli] Safety acknowledgment cleared");
        }
    }

    // Simulated device
    let mut camera = SimulatedCamera::new();
    if let Some(level) = args.brightness {
        camera = camera.with_brightness(level);
    }
    if let Some(kind) = args.simulate_failure {
        camera = camera.fail_times(1, kind.device_failure());
    }
    let camera = Arc::new(camera);
    let resource = Arc::new(ResourceHandle::new(camera.clone()));

    // Create event channel
    let (event_tx, event_rx) = mpsc::unbounded_channel::<RuntimeEvent>();

    // Create CLI runtime
    let runtime: Arc<dyn WayfinderRuntime> =
        Arc::new(CliRuntime::new(event_tx, args.auto_accept(), args.json));

    Ok(CliContext {
        runtime,
        event_rx,
        settings,
        settings_manager,
        data_dir,
        safety_gate,
        directory: StaticDirectory::campus(),
        camera,
        resource,
        args: args.clone(),
    })
}
