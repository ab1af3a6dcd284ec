//! TOML-based application configuration.
//!
//! Stores:
//! - Session timing (round/rest length, number of rounds, tick period)
//! - Fight-generation service settings
//!
//! Configuration is stored at `~/.config/shadowbox/config.toml`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{data_dir, display_json_value, get_json_value_by_path, set_json_value_by_path};
use crate::error::ConfigError;
use crate::timer::ClockSettings;

/// Round/rest timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_round_duration_secs")]
    pub round_duration_secs: u64,
    #[serde(default = "default_rest_duration_secs")]
    pub rest_duration_secs: u64,
    #[serde(default = "default_total_rounds")]
    pub total_rounds: u32,
    /// Session clock tick period.
    #[serde(default = "default_clock_tick_ms")]
    pub clock_tick_ms: u64,
    /// Hold the move cadence while resting.
    #[serde(default)]
    pub pause_moves_during_rest: bool,
}

/// Remote fight generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_category")]
    pub default_category: String,
    #[serde(default = "default_difficulty")]
    pub default_difficulty: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/shadowbox/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub service: ServiceConfig,
}

// Default functions
fn default_round_duration_secs() -> u64 {
    180
}
fn default_rest_duration_secs() -> u64 {
    60
}
fn default_total_rounds() -> u32 {
    3
}
fn default_clock_tick_ms() -> u64 {
    100
}
fn default_base_url() -> String {
    "http://localhost:8787".into()
}
fn default_timeout_secs() -> u64 {
    15
}
fn default_category() -> String {
    "boxing".into()
}
fn default_difficulty() -> String {
    "beginner".into()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            round_duration_secs: default_round_duration_secs(),
            rest_duration_secs: default_rest_duration_secs(),
            total_rounds: default_total_rounds(),
            clock_tick_ms: default_clock_tick_ms(),
            pause_moves_during_rest: false,
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            default_category: default_category(),
            default_difficulty: default_difficulty(),
        }
    }
}

impl SessionConfig {
    pub fn clock_settings(&self) -> ClockSettings {
        ClockSettings {
            round_duration_ms: self.round_duration_secs.saturating_mul(1_000),
            rest_duration_ms: self.rest_duration_secs.saturating_mul(1_000),
            total_rounds: self.total_rounds,
        }
    }

    /// Tick period, never below 1 ms.
    pub fn clock_tick(&self) -> Duration {
        Duration::from_millis(self.clock_tick_ms.max(1))
    }
}

impl ServiceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk, writing the defaults first when no file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        get_json_value_by_path(&json, key).map(display_json_value)
    }

    /// Set a config value by key, in memory only. Call `save` to persist.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        updated
            .session
            .clock_settings()
            .validate()
            .map_err(|e| invalid(e.to_string()))?;
        *self = updated;
        Ok(())
    }

    /// Every leaf as `(dotted key, value)`, sorted by key.
    pub fn entries(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        if let Ok(json) = serde_json::to_value(self) {
            collect_leaves("", &json, &mut out);
        }
        out
    }

    pub fn clock_settings(&self) -> ClockSettings {
        self.session.clock_settings()
    }
}

fn collect_leaves(prefix: &str, value: &serde_json::Value, out: &mut Vec<(String, String)>) {
    match value {
        serde_json::Value::Object(map) => {
            for (k, v) in map {
                let key = if prefix.is_empty() {
                    k.clone()
                } else {
                    format!("{prefix}.{k}")
                };
                collect_leaves(&key, v, out);
            }
        }
        other => out.push((prefix.to_string(), display_json_value(other))),
    }
}
