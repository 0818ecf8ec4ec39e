//! Configuration management for Clip Sync.
//!
//! This module provides:
//! - TOML-based configuration with logical sections
//! - Atomic file writes (write to temp, then rename)
//! - Section-level updates (only changed section is modified)
//! - Serde defaults for every missing key
//!
//! # Example
//!
//! ```no_run
//! use clipsync_core::alignment::AlignmentConfig;
//! use clipsync_core::config::{ConfigManager, ConfigSection};
//!
//! // Create manager and load (or create default) config
//! let mut config = ConfigManager::new(".config/clipsync.toml");
//! config.load_or_create().unwrap();
//!
//! // Build the runtime alignment config
//! let alignment = AlignmentConfig::from(&config.settings().alignment);
//!
//! // Tighten the threshold and save just that section atomically
//! config.settings_mut().alignment.confidence_threshold = 4.0;
//! config.update_section(ConfigSection::Alignment).unwrap();
//! ```

mod manager;
mod settings;

pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{AlignmentSettings, ConfigSection, LoggingSettings, Settings};
