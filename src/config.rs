use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ChromockError, ChromockResult};

pub const DEFAULT_EXTENSION_ID: &str = "chromock-id";
pub const DEFAULT_ORIGIN: &str = "http://localhost";
pub const DEFAULT_ALARM_NAME: &str = "chromock-alarm";
pub const DEFAULT_MENU_ITEM_ID: &str = "menu-item";
pub const DEFAULT_LOG_PREFIX: &str = "[chromock]";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub diagnostics: DiagnosticsConfig,
    pub runtime: RuntimeConfig,
    pub alarms: AlarmsConfig,
    pub context_menus: ContextMenusConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Emit one diagnostic line per mutating or notable call.
    pub enabled: bool,
    pub prefix: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Reported as `runtime.id` and as the sender id of every message.
    pub extension_id: String,
    /// Used by `get_url` when the environment has no location.
    pub default_origin: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlarmsConfig {
    pub default_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextMenusConfig {
    pub default_item_id: String,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            prefix: DEFAULT_LOG_PREFIX.to_string(),
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            extension_id: DEFAULT_EXTENSION_ID.to_string(),
            default_origin: DEFAULT_ORIGIN.to_string(),
        }
    }
}

impl Default for AlarmsConfig {
    fn default() -> Self {
        Self {
            default_name: DEFAULT_ALARM_NAME.to_string(),
        }
    }
}

impl Default for ContextMenusConfig {
    fn default() -> Self {
        Self {
            default_item_id: DEFAULT_MENU_ITEM_ID.to_string(),
        }
    }
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .map(|h| h.join(".config"))
                    .unwrap_or_else(|| PathBuf::from("/tmp"))
            })
            .join("chromock")
            .join("config.toml")
    }

    /// Load config from the default path, or return defaults if it is missing or broken
    pub fn load() -> Self {
        let path = Self::config_path();

        if !path.exists() {
            return Self::default();
        }

        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(
                    target: "chromock",
                    path = %path.display(),
                    "Failed to load config: {}",
                    e
                );
                Self::default()
            }
        }
    }

    /// Load config from an explicit file.
    pub fn load_from(path: &Path) -> ChromockResult<Self> {
        if !path.exists() {
            return Err(ChromockError::ConfigNotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate config from TOML text.
    pub fn from_toml_str(content: &str) -> ChromockResult<Self> {
        let mut config: Self = toml::from_str(content)?;
        config.validate();
        Ok(config)
    }

    /// Normalize values so every field is usable
    fn validate(&mut self) {
        if self.diagnostics.prefix.trim().is_empty() {
            self.diagnostics.prefix = DEFAULT_LOG_PREFIX.to_string();
        }

        if self.runtime.extension_id.trim().is_empty() {
            self.runtime.extension_id = DEFAULT_EXTENSION_ID.to_string();
        }

        let origin = self.runtime.default_origin.trim().trim_end_matches('/');
        self.runtime.default_origin = if origin.is_empty() {
            DEFAULT_ORIGIN.to_string()
        } else {
            origin.to_string()
        };

        if self.alarms.default_name.is_empty() {
            self.alarms.default_name = DEFAULT_ALARM_NAME.to_string();
        }

        if self.context_menus.default_item_id.is_empty() {
            self.context_menus.default_item_id = DEFAULT_MENU_ITEM_ID.to_string();
        }
    }

    /// Render config as TOML
    pub fn to_toml_string(&self) -> ChromockResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Save config to a file, creating parent directories
    pub fn save_to(&self, path: &Path) -> ChromockResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }
}
