//! Configuration loader and validator
//!
//! Loads runner configuration from TOML files in the configs/ directory.
//! The encoder session itself only ever sees the [`Timing`] derived here.

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::encoder::constants::{IDLE_TIMEOUT_MS, SPECIAL_KEY_TIMEOUT_MS};
use crate::encoder::types::Timing;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Serial device settings
    #[serde(default)]
    pub device: DeviceSettings,

    /// Fail-safe timer windows
    #[serde(default)]
    pub timing: TimingSettings,

    /// Event delivery settings
    #[serde(default)]
    pub events: EventSettings,
}

/// Serial device settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceSettings {
    /// Device file the encoder bytes are read from
    #[serde(default = "default_device_path")]
    pub path: PathBuf,

    /// Physical path prefix reported for both controllers
    #[serde(default = "default_phys")]
    pub phys: String,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            path: default_device_path(),
            phys: default_phys(),
        }
    }
}

/// Fail-safe timer windows in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingSettings {
    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,

    #[serde(default = "default_special_key_timeout_ms")]
    pub special_key_timeout_ms: u64,
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            idle_timeout_ms: default_idle_timeout_ms(),
            special_key_timeout_ms: default_special_key_timeout_ms(),
        }
    }
}

/// Event delivery settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSettings {
    /// Capacity of the controller event channel
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for EventSettings {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

fn default_device_path() -> PathBuf { PathBuf::from("/dev/ttyS1") }
fn default_phys() -> String { "ttyS1".to_string() }
fn default_idle_timeout_ms() -> u64 { IDLE_TIMEOUT_MS }
fn default_special_key_timeout_ms() -> u64 { SPECIAL_KEY_TIMEOUT_MS }
fn default_channel_capacity() -> usize { 256 }

impl Config {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();
        info!("Loading configuration from: {}", path_ref.display());

        let content = std::fs::read_to_string(path_ref)?;
        let config = Self::from_toml(&content)?;

        info!("✓ Config loaded");
        Ok(config)
    }

    /// Load default configuration from configs/default.toml
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load("configs/default.toml")
    }

    /// Parse and validate configuration text
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;

        debug!("  - Device: {} ({})", config.device.path.display(), config.device.phys);
        debug!(
            "  - Idle timeout: {}ms, special key timeout: {}ms",
            config.timing.idle_timeout_ms, config.timing.special_key_timeout_ms
        );

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timing.idle_timeout_ms == 0 {
            return Err(ConfigError::Invalid("idle_timeout_ms must be positive".into()));
        }

        if self.timing.special_key_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "special_key_timeout_ms must be positive".into()
            ));
        }

        if self.timing.special_key_timeout_ms >= self.timing.idle_timeout_ms {
            return Err(ConfigError::Invalid(format!(
                "special_key_timeout_ms ({}) must be shorter than idle_timeout_ms ({})",
                self.timing.special_key_timeout_ms, self.timing.idle_timeout_ms
            )));
        }

        if self.events.channel_capacity == 0 {
            return Err(ConfigError::Invalid("channel_capacity must be positive".into()));
        }

        if self.device.phys.is_empty() {
            return Err(ConfigError::Invalid("device phys must not be empty".into()));
        }

        Ok(())
    }

    /// Timer windows for the encoder session
    pub fn timing(&self) -> Timing {
        Timing {
            idle_timeout: Duration::from_millis(self.timing.idle_timeout_ms),
            special_key_timeout: Duration::from_millis(self.timing.special_key_timeout_ms),
        }
    }
}
