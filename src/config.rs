//! Hub engine configuration
//!
//! Every field defaults to the value in [`crate::constants`], so a config file
//! only needs to name what it overrides.

use crate::constants::{hub, roles, timing};
use crate::error::ConfigError;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Class type that identifies a hub node
    pub hub_class: String,
    /// Title given to newly created hubs
    pub hub_title: String,
    /// Upper bound on the number of pairs per hub
    pub max_pairs: usize,
    /// Class types treated as pass-through regardless of their shape
    pub pass_through_classes: Vec<String>,
    /// Widget name fragments that mark a Set/Get key widget (case-insensitive)
    pub key_widget_hints: Vec<String>,
    pub cold_start_attempts: u32,
    pub cold_start_interval_ms: u64,
    pub boot_delay_ms: u64,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            hub_class: hub::CLASS_TYPE.to_string(),
            hub_title: hub::TITLE.to_string(),
            max_pairs: hub::MAX_PAIRS,
            pass_through_classes: roles::PASS_THROUGH_CLASSES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            key_widget_hints: roles::KEY_WIDGET_HINTS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            cold_start_attempts: timing::COLD_START_ATTEMPTS,
            cold_start_interval_ms: timing::COLD_START_INTERVAL_MS,
            boot_delay_ms: timing::BOOT_DELAY_MS,
        }
    }
}

impl HubConfig {
    /// Reads and validates a JSON config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&content)?;
        debug!("Loaded hub config from {:?}", path);
        Ok(config)
    }

    /// Parses and validates a JSON config document
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: HubConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the user config if one exists, otherwise the defaults
    pub fn load_or_default() -> Self {
        let Some(path) = Self::default_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!("Ignoring hub config {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    /// `<config dir>/pipehub/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("pipehub").join("config.json"))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hub_class.trim().is_empty() {
            return Err(ConfigError::Invalid {
                message: "hub_class must not be empty".to_string(),
            });
        }
        if self.max_pairs < hub::MIN_PAIRS {
            return Err(ConfigError::Invalid {
                message: format!(
                    "max_pairs must be at least {}, got {}",
                    hub::MIN_PAIRS,
                    self.max_pairs
                ),
            });
        }
        Ok(())
    }

    pub fn cold_start_interval(&self) -> Duration {
        Duration::from_millis(self.cold_start_interval_ms)
    }

    pub fn boot_delay(&self) -> Duration {
        Duration::from_millis(self.boot_delay_ms)
    }
}
