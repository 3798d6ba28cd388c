mod config;
pub mod database;

pub use config::{Config, GoalsConfig, SoundConfig, TimerSection, UiConfig};
pub use database::Database;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{ConfigError, Result};

/// Keys under which application state is kept in a [`KeyValueStore`].
pub mod keys {
    pub const SUBJECTS: &str = "subjects";
    pub const CURRENT_SUBJECT: &str = "current_subject";
    /// Weekly goal in seconds.
    pub const WEEKLY_GOAL: &str = "weekly_goal";
    pub const ACHIEVEMENTS: &str = "achievements";
    pub const EVENTS: &str = "events";
    pub const TIMER_ENGINE: &str = "timer_engine";
}

/// Returns `~/.config/denso[-dev]/` based on DENSO_ENV.
///
/// Set DENSO_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if the config directory cannot be created.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("DENSO_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("denso-dev")
    } else {
        base_dir.join("denso")
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}

/// String-keyed persistence for JSON-encoded application state.
pub trait KeyValueStore {
    fn get_raw(&self, key: &str) -> Result<Option<String>>;

    fn set_raw(&self, key: &str, value: &str) -> Result<()>;

    /// Decode the value under `key`, or `default` when it is missing or
    /// cannot be parsed. Corrupt values are logged and left in place.
    fn load<T: DeserializeOwned>(&self, key: &str, default: T) -> Result<T> {
        let Some(raw) = self.get_raw(key)? else {
            return Ok(default);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::warn!(key, error = %e, "ignoring unparsable stored value");
                Ok(default)
            }
        }
    }

    fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.set_raw(key, &raw)
    }
}

/// In-memory [`KeyValueStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_raw(&self, key: &str) -> Result<Option<String>> {
        let values = self.values.lock().unwrap_or_else(|p| p.into_inner());
        Ok(values.get(key).cloned())
    }

    fn set_raw(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.lock().unwrap_or_else(|p| p.into_inner());
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
