//! Configuration management for itvtrack.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "itvtrack";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "inspections.db";

/// Key the local flavour stores its whole collection under.
pub const DEFAULT_STORAGE_KEY: &str = "vehicleInspections";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `ITVTRACK_`)
/// 2. TOML config file at `~/.config/itvtrack/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Local storage configuration.
    pub storage: StorageConfig,
    /// Calendar export configuration.
    pub calendar: CalendarConfig,
    /// Placeholder image configuration.
    pub images: ImageConfig,
    /// Remote document sync configuration.
    pub sync: SyncConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/itvtrack/inspections.db`
    pub database_path: Option<PathBuf>,
    /// Key the serialized collection is stored under.
    pub storage_key: String,
}

/// Calendar export configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    /// Event template endpoint.
    pub base_url: String,
    /// Location attached to every exported event.
    pub event_location: String,
}

/// Placeholder image configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Image service root.
    pub base_url: String,
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Background colour as hex without `#`.
    pub background: String,
    /// Text colour as hex without `#`.
    pub foreground: String,
    /// Text shown when the vehicle model is empty.
    pub fallback_text: String,
}

/// Remote document sync configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Application id used as the top-level document namespace.
    pub app_id: String,
    /// Token for token-based sign-in; anonymous sign-in when unset.
    pub auth_token: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: None, // Resolved at runtime
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.google.com/calendar/render".to_string(),
            event_location: "Trusted workshop".to_string(),
        }
    }
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            base_url: "https://placehold.co".to_string(),
            width: 200,
            height: 120,
            background: "4a5568".to_string(),
            foreground: "a0aec0".to_string(),
            fallback_text: "Car".to_string(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            app_id: "default-app-id".to_string(),
            auth_token: None,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("ITVTRACK_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.storage.storage_key.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "storage_key must not be empty".to_string(),
            });
        }

        for (name, value) in [
            ("calendar.base_url", &self.calendar.base_url),
            ("images.base_url", &self.images.base_url),
        ] {
            if Url::parse(value).is_err() {
                return Err(Error::ConfigValidation {
                    message: format!("{name} is not a valid URL: {value}"),
                });
            }
        }

        if self.images.width == 0 || self.images.height == 0 {
            return Err(Error::ConfigValidation {
                message: format!(
                    "image size must be non-zero, got {}x{}",
                    self.images.width, self.images.height
                ),
            });
        }

        for (name, value) in [
            ("images.background", &self.images.background),
            ("images.foreground", &self.images.foreground),
        ] {
            if !is_hex_colour(value) {
                return Err(Error::ConfigValidation {
                    message: format!("{name} must be a 3 or 6 digit hex colour, got '{value}'"),
                });
            }
        }

        if self.sync.app_id.trim().is_empty() || self.sync.app_id.contains('/') {
            return Err(Error::ConfigValidation {
                message: format!("invalid sync.app_id '{}'", self.sync.app_id),
            });
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }
}

fn is_hex_colour(value: &str) -> bool {
    matches!(value.len(), 3 | 6) && value.chars().all(|c| c.is_ascii_hexdigit())
}
