//! User preferences persisted as a single JSON blob.
//!
//! A blob that fails to parse is treated as "never saved": the caller falls
//! back to defaults and the user is never shown a parse error.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{display_json_value, get_json_value_by_path, set_json_value_by_path, Database};
use crate::error::{ConfigError, Result};
use crate::moves::{effective_speed, Stance};

const PREFERENCES_KEY: &str = "preferences";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimationMode {
    None,
    Old,
    #[default]
    New,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub is_muted: bool,
    pub animation_mode: AnimationMode,
    pub stance: Stance,
    pub show_combo_carousel: bool,
    pub speed_multiplier: f64,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            is_muted: false,
            animation_mode: AnimationMode::New,
            stance: Stance::Orthodox,
            show_combo_carousel: true,
            speed_multiplier: 1.0,
        }
    }
}

impl Preferences {
    /// Speed multiplier safe to divide by.
    pub fn effective_speed(&self) -> f64 {
        effective_speed(self.speed_multiplier)
    }

    /// Get a value by its camelCase key (e.g. "speedMultiplier").
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        get_json_value_by_path(&json, key).map(display_json_value)
    }

    /// Set a value by key. Enum fields take their lowercase names.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }
}

/// Where preferences live between sessions.
pub trait PreferencesStore {
    /// `None` when nothing was saved yet or the saved blob is unreadable.
    fn load(&self) -> Option<Preferences>;

    fn save(&self, prefs: &Preferences) -> Result<()>;
}

/// Stored preferences, or the defaults.
pub fn load_or_default(store: &impl PreferencesStore) -> Preferences {
    store.load().unwrap_or_default()
}

fn decode(raw: &str) -> Option<Preferences> {
    match serde_json::from_str(raw) {
        Ok(prefs) => Some(prefs),
        Err(e) => {
            warn!(error = %e, "malformed preferences, using defaults");
            None
        }
    }
}

impl PreferencesStore for Database {
    fn load(&self) -> Option<Preferences> {
        match self.kv_get(PREFERENCES_KEY) {
            Ok(Some(raw)) => decode(&raw),
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "could not read preferences");
                None
            }
        }
    }

    fn save(&self, prefs: &Preferences) -> Result<()> {
        let json = serde_json::to_string(prefs)?;
        self.kv_set(PREFERENCES_KEY, &json)?;
        Ok(())
    }
}

/// In-process store. Keeps the serialized blob so it behaves like disk.
#[derive(Debug, Default)]
pub struct MemoryPreferencesStore {
    blob: Mutex<Option<String>>,
}

impl MemoryPreferencesStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an arbitrary (possibly corrupt) blob.
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            blob: Mutex::new(Some(raw.into())),
        }
    }
}

impl PreferencesStore for MemoryPreferencesStore {
    fn load(&self) -> Option<Preferences> {
        let blob = self.blob.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        blob.as_deref().and_then(decode)
    }

    fn save(&self, prefs: &Preferences) -> Result<()> {
        let json = serde_json::to_string(prefs)?;
        *self.blob.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(json);
        Ok(())
    }
}
