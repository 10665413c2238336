//! Configuration management for the stitcher.
//!
//! This module provides:
//! - TOML-based configuration with logical sections
//! - Atomic file writes (write to temp, then rename)
//! - Section-level updates (only the changed section is rewritten)
//! - Conversions from settings to naming, discovery and output rules
//!
//! # Example
//!
//! ```no_run
//! use eqs_core::config::{ConfigManager, ConfigSection};
//!
//! let mut config = ConfigManager::new(".config/stitch.toml");
//! config.load_or_create().unwrap();
//!
//! println!("Sources: {}", config.settings().paths.sources_dir);
//!
//! config.settings_mut().engine.program = "/opt/stitcher/bin/stitch".to_string();
//! config.update_section(ConfigSection::Engine).unwrap();
//! ```

mod manager;
mod settings;

pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{
    ConfigSection, EngineSettings, LoggingSettings, NamingSettings, PathSettings, Settings,
};
