//! Centralized TOML-based settings for Wayfinder.
//!
//! Settings are loaded from `~/.wayfinder/settings.toml` (or
//! `$WAYFINDER_HOME/settings.toml`). Every section is optional; missing
//! values fall back to the defaults in [`schema`].
//!
//! # Usage
//!
//! ```rust,ignore
//! use wayfinder_lib::settings::SettingsManager;
//!
//! let manager = SettingsManager::new().await?;
//! let settings = manager.get().await;
//! let guidance = GuidanceConfig::from(&settings.guidance);
//! ```

pub mod loader;
pub mod schema;

pub use loader::{get_with_env_fallback, settings_path, wayfinder_home, SettingsManager};
pub use schema::{
    AdvancedSettings, CameraSettings, GuidanceSettings, HazardSettings, StorageSettings,
    WayfinderSettings,
};
