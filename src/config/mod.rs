// Configuration management for tunebot
// Handles loading/saving settings, with sensible defaults when config is missing

use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::store::DEFAULT_MAX_NAME_LEN;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub sessions: SessionConfig,
    pub playlists: PlaylistConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub directory: PathBuf,
    /// EnvFilter directives, used when RUST_LOG isn't set
    pub filter: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub idle_timeout_secs: u64,
    pub sweep_interval_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaylistConfig {
    pub max_name_len: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: Config::config_dir().join("logs"),
            filter: "info,tunebot=debug".to_string(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: 24 * 60 * 60, // a day of silence
            sweep_interval_secs: 10 * 60,
        }
    }
}

impl Default for PlaylistConfig {
    fn default() -> Self {
        Self {
            max_name_len: DEFAULT_MAX_NAME_LEN,
        }
    }
}

const MAX_IDLE_TIMEOUT_SECS: u64 = 366 * 24 * 60 * 60;
const MAX_SWEEP_INTERVAL_SECS: u64 = 24 * 60 * 60;

impl SessionConfig {
    /// Capped at a year; anything longer would overflow the timestamp math
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs.min(MAX_IDLE_TIMEOUT_SECS))
    }

    pub fn sweep_interval(&self) -> Duration {
        // zero makes tokio's interval panic, huge values overflow its deadline
        Duration::from_secs(self.sweep_interval_secs.clamp(1, MAX_SWEEP_INTERVAL_SECS))
    }
}

impl Config {
    /// Load from the default location, writing defaults there on first run
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = fs::read_to_string(config_path)
                .with_context(|| format!("Failed to read config {}", config_path.display()))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("Failed to parse config {}", config_path.display()))?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(config_path)?;
            Ok(config)
        }
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(config_path, content)?;

        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?
            .join("tunebot");

        Ok(config_dir.join("config.toml"))
    }

    fn config_dir() -> PathBuf {
        config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tunebot")
    }
}
