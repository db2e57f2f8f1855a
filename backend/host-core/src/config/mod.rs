pub mod persist;

use crate::APP_NAME;
use crate::error::config::ConfigError;

use common::ErrorLocation;

use std::panic::Location;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::{Deserialize, Serialize};
use url::Url;

const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_VERSION: u32 = 1;
const MIN_POLL_INTERVAL_SECS: u64 = 1;
const MAX_POLL_INTERVAL_SECS: u64 = 3600;

pub const ENV_IPC_PORT: &str = "NETGATE_IPC_PORT";
pub const ENV_PROBE_URL: &str = "NETGATE_PROBE_URL";
pub const ENV_UPDATE_FEED_URL: &str = "NETGATE_UPDATE_FEED_URL";

// ============================================
// ENUMS WITH DEFAULTS
// ============================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

// ============================================
// CONFIG STRUCTS
// ============================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IpcConfig {
    #[serde(default = "default_ipc_port")]
    pub port: u16,
}

impl Default for IpcConfig {
    fn default() -> Self {
        Self {
            port: default_ipc_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NetworkConfig {
    #[serde(default = "default_probe_url")]
    pub probe_url: String,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            probe_url: default_probe_url(),
            poll_interval_secs: default_poll_interval_secs(),
            probe_timeout_secs: default_probe_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateConfig {
    pub feed_url: Option<String>,
    #[serde(default = "default_true")]
    pub check_on_startup: bool,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            feed_url: None,
            check_on_startup: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AuthConfig {
    pub portal_url: Option<String>,
}

/// UI-facing settings, exchanged through `settings:get` / `settings:update`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    #[serde(default)]
    pub theme: Theme,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub auto_login: bool,
    #[serde(default)]
    pub auto_launch: bool,
    #[serde(default = "default_true")]
    pub notifications_enabled: bool,
    #[serde(default)]
    pub minimize_to_tray: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            language: default_language(),
            auto_login: false,
            auto_launch: false,
            notifications_enabled: true,
            minimize_to_tray: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub ipc: IpcConfig,

    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub update: UpdateConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub settings: AppSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            ipc: IpcConfig::default(),
            network: NetworkConfig::default(),
            update: UpdateConfig::default(),
            auth: AuthConfig::default(),
            settings: AppSettings::default(),
        }
    }
}

// ============================================
// DEFAULT FUNCTIONS
// ============================================

fn default_version() -> u32 {
    CONFIG_VERSION
}
fn default_true() -> bool {
    true
}
fn default_ipc_port() -> u16 {
    19876
}
fn default_probe_url() -> String {
    "http://connectivitycheck.gstatic.com/generate_204".to_string()
}
fn default_poll_interval_secs() -> u64 {
    5
}
fn default_probe_timeout_secs() -> u64 {
    3
}
fn default_language() -> String {
    "en".to_string()
}

// ============================================
// IMPLEMENTATION
// ============================================

/// Default config directory: `{platform config dir}/netgate`.
#[track_caller]
pub fn default_config_dir() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_NAME))
        .ok_or_else(|| ConfigError::DirectoryNotFound {
            location: ErrorLocation::from(Location::caller()),
        })
}

/// Default data directory for accounts, WiFi profiles and update downloads.
#[track_caller]
pub fn default_data_dir() -> Result<PathBuf, ConfigError> {
    dirs::data_local_dir()
        .map(|dir| dir.join(APP_NAME))
        .ok_or_else(|| ConfigError::DirectoryNotFound {
            location: ErrorLocation::from(Location::caller()),
        })
}

impl AppConfig {
    /// Load config from {config_dir}/config.json.
    ///
    /// # Returns
    ///
    /// Returns defaults if the file is missing.
    /// Returns `Err(ConfigError)` if the file exists but is corrupted/invalid.
    pub fn load(config_dir: &Path) -> Result<Self, ConfigError> {
        let config: AppConfig = match persist::read_json(config_dir, CONFIG_FILE_NAME) {
            Ok(Some(config)) => config,
            Ok(None) => {
                info!(
                    "Config file not found in {}, using defaults",
                    config_dir.display()
                );
                return Ok(Self::default());
            }
            Err(e) => {
                warn!("Failed to load config: {e}");
                return Err(e);
            }
        };

        config.validate()?;

        info!("Config loaded from {}", config_dir.display());
        Ok(config)
    }

    /// Save config to {config_dir}/config.json using atomic write.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        self.validate()?;
        persist::write_json_atomic(config_dir, CONFIG_FILE_NAME, self)?;
        info!("Config saved to {}", config_dir.display());
        Ok(())
    }

    /// Apply `NETGATE_*` overrides, after loading `.env` if one is present.
    ///
    /// Unparseable values are logged and ignored.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(path) = dotenvy::dotenv() {
            info!("Loaded .env from: {}", path.display());
        }

        if let Ok(port) = std::env::var(ENV_IPC_PORT) {
            match port.parse::<u16>() {
                Ok(port) => self.ipc.port = port,
                Err(e) => warn!("Ignoring {ENV_IPC_PORT}={port}: {e}"),
            }
        }
        if let Ok(url) = std::env::var(ENV_PROBE_URL) {
            self.network.probe_url = url;
        }
        if let Ok(url) = std::env::var(ENV_UPDATE_FEED_URL) {
            self.update.feed_url = Some(url);
        }
    }

    /// Validate config values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version == 0 || self.version > CONFIG_VERSION {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: format!(
                    "Invalid version: {} (expected 1-{})",
                    self.version, CONFIG_VERSION
                ),
            });
        }

        if self.ipc.port == 0 {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: "ipc.port must be non-zero".to_string(),
            });
        }

        let interval = self.network.poll_interval_secs;
        if !(MIN_POLL_INTERVAL_SECS..=MAX_POLL_INTERVAL_SECS).contains(&interval) {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: format!(
                    "Invalid poll interval: {interval}s (must be {MIN_POLL_INTERVAL_SECS}-{MAX_POLL_INTERVAL_SECS})"
                ),
            });
        }

        if self.network.probe_timeout_secs == 0 {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: "network.probeTimeoutSecs must be non-zero".to_string(),
            });
        }

        validate_http_url("network.probeUrl", &self.network.probe_url)?;
        if let Some(ref url) = self.update.feed_url {
            validate_http_url("update.feedUrl", url)?;
        }
        if let Some(ref url) = self.auth.portal_url {
            validate_http_url("auth.portalUrl", url)?;
        }

        self.settings.validate()
    }
}

impl AppSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.language.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: "settings.language cannot be empty".to_string(),
            });
        }
        Ok(())
    }
}

#[track_caller]
fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value).map_err(|e| ConfigError::ValidationError {
        location: ErrorLocation::from(Location::caller()),
        reason: format!("Invalid URL for {field}: {value} ({e})"),
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::ValidationError {
            location: ErrorLocation::from(Location::caller()),
            reason: format!("{field} must be http or https: {value}"),
        });
    }

    Ok(())
}
