//! Config state management using the actor pattern.
//!
//! - Commands are sent over an mpsc channel, each with a oneshot reply
//! - A dedicated task applies them one at a time
//! - Reads go through `Arc<RwLock<AppConfig>>` and never wait on the actor
//!
//! Every command validates the candidate config before anything changes, so
//! a rejected command leaves memory and disk untouched.

use crate::config::{AppConfig, AppSettings};
use crate::error::config::ConfigError;

use common::ErrorLocation;

use std::panic::Location;
use std::path::PathBuf;
use std::sync::Arc;

use log::{error, info, warn};
use serde_json::{Map, Value};
use tokio::sync::{Mutex, RwLock, mpsc, oneshot};

const COMMAND_CHANNEL_SIZE: usize = 100;

type Reply<T> = oneshot::Sender<Result<T, ConfigError>>;

/// Commands that mutate config state.
#[derive(Debug)]
pub enum ConfigCommand {
    /// Validate and replace the whole config.
    Replace {
        config: Box<AppConfig>,
        reply: Reply<AppConfig>,
    },
    /// Restore defaults.
    Reset { reply: Reply<AppConfig> },
    /// Merge a partial settings object into the current settings.
    UpdateSettings {
        patch: Map<String, Value>,
        reply: Reply<AppSettings>,
    },
    SetNotificationsEnabled {
        enabled: bool,
        reply: Reply<AppSettings>,
    },
    SetAutoLaunch {
        enabled: bool,
        reply: Reply<AppSettings>,
    },
}

/// Thread-safe app config.
///
/// `Clone` and shareable across tasks. Persists to `{config_dir}/config.json`
/// when a directory was given.
#[derive(Clone)]
pub struct ConfigState {
    /// Channel to send config mutation commands
    command_tx: Arc<Mutex<Option<mpsc::Sender<ConfigCommand>>>>,

    /// Shared read-only access to app config
    app_config: Arc<RwLock<AppConfig>>,

    config_dir: Option<Arc<PathBuf>>,

    actor_init: Arc<Mutex<bool>>,
}

impl ConfigState {
    pub fn new(config_dir: Option<PathBuf>, app_config: AppConfig) -> Self {
        Self {
            command_tx: Arc::new(Mutex::new(None)),
            app_config: Arc::new(RwLock::new(app_config)),
            config_dir: config_dir.map(Arc::new),
            actor_init: Arc::new(Mutex::new(false)),
        }
    }

    /// Current app config (read-only).
    pub async fn get(&self) -> AppConfig {
        self.app_config.read().await.clone()
    }

    pub async fn settings(&self) -> AppSettings {
        self.app_config.read().await.settings.clone()
    }

    pub async fn replace(&self, config: AppConfig) -> Result<AppConfig, ConfigError> {
        self.request(|reply| ConfigCommand::Replace {
            config: Box::new(config),
            reply,
        })
        .await
    }

    pub async fn reset(&self) -> Result<AppConfig, ConfigError> {
        self.request(|reply| ConfigCommand::Reset { reply }).await
    }

    pub async fn update_settings(&self, patch: Map<String, Value>) -> Result<AppSettings, ConfigError> {
        self.request(|reply| ConfigCommand::UpdateSettings { patch, reply })
            .await
    }

    pub async fn set_notifications_enabled(&self, enabled: bool) -> Result<AppSettings, ConfigError> {
        self.request(|reply| ConfigCommand::SetNotificationsEnabled { enabled, reply })
            .await
    }

    pub async fn set_auto_launch(&self, enabled: bool) -> Result<AppSettings, ConfigError> {
        self.request(|reply| ConfigCommand::SetAutoLaunch { enabled, reply })
            .await
    }

    /// Send a command and wait for the actor's reply.
    ///
    /// Spawns the actor on first call (lazy initialization).
    #[track_caller]
    fn request<'a, T: 'a>(
        &'a self,
        make: impl FnOnce(Reply<T>) -> ConfigCommand,
    ) -> impl Future<Output = Result<T, ConfigError>> + 'a {
        let location = ErrorLocation::from(Location::caller());
        let (reply_tx, reply_rx) = oneshot::channel();
        let cmd = make(reply_tx);

        async move {
            self.ensure_actor().await;

            let tx = self
                .command_tx
                .lock()
                .await
                .clone()
                .ok_or_else(|| ConfigError::ActorUnavailable {
                    message: "Config actor not initialized".to_string(),
                    location,
                })?;

            tx.send(cmd)
                .await
                .map_err(|e| ConfigError::ActorUnavailable {
                    message: format!("Config actor died: {e}"),
                    location,
                })?;

            reply_rx.await.map_err(|e| ConfigError::ActorUnavailable {
                message: format!("Config actor dropped reply: {e}"),
                location,
            })?
        }
    }

    async fn ensure_actor(&self) {
        let mut init_guard = self.actor_init.lock().await;
        if !*init_guard {
            let (tx, rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);

            // Store tx BEFORE spawning
            *self.command_tx.lock().await = Some(tx);

            tokio::spawn(config_actor(
                rx,
                Arc::clone(&self.app_config),
                self.config_dir.clone(),
            ));

            *init_guard = true;
            info!("Config state actor spawned");
        }
    }
}

/// Config actor task. Applies commands sequentially.
async fn config_actor(
    mut command_rx: mpsc::Receiver<ConfigCommand>,
    app_config: Arc<RwLock<AppConfig>>,
    config_dir: Option<Arc<PathBuf>>,
) {
    info!("Config state actor started");

    while let Some(cmd) = command_rx.recv().await {
        let current = app_config.read().await.clone();

        match cmd {
            ConfigCommand::Replace { config, reply } => {
                let result = commit(&app_config, config_dir.as_deref(), *config).await;
                let _ = reply.send(result);
            }
            ConfigCommand::Reset { reply } => {
                let result = commit(&app_config, config_dir.as_deref(), AppConfig::default()).await;
                let _ = reply.send(result);
            }
            ConfigCommand::UpdateSettings { patch, reply } => {
                let result = match merge_settings(&current.settings, patch) {
                    Ok(settings) => commit_settings(&app_config, config_dir.as_deref(), current, settings).await,
                    Err(e) => Err(e),
                };
                let _ = reply.send(result);
            }
            ConfigCommand::SetNotificationsEnabled { enabled, reply } => {
                let settings = AppSettings {
                    notifications_enabled: enabled,
                    ..current.settings.clone()
                };
                let result = commit_settings(&app_config, config_dir.as_deref(), current, settings).await;
                let _ = reply.send(result);
            }
            ConfigCommand::SetAutoLaunch { enabled, reply } => {
                let settings = AppSettings {
                    auto_launch: enabled,
                    ..current.settings.clone()
                };
                let result = commit_settings(&app_config, config_dir.as_deref(), current, settings).await;
                let _ = reply.send(result);
            }
        }
    }

    warn!("Config state actor stopped");
}

async fn commit_settings(
    app_config: &RwLock<AppConfig>,
    config_dir: Option<&PathBuf>,
    current: AppConfig,
    settings: AppSettings,
) -> Result<AppSettings, ConfigError> {
    let next = AppConfig { settings, ..current };
    commit(app_config, config_dir, next).await.map(|c| c.settings)
}

async fn commit(
    app_config: &RwLock<AppConfig>,
    config_dir: Option<&PathBuf>,
    next: AppConfig,
) -> Result<AppConfig, ConfigError> {
    // Validate first (before any changes)
    if let Err(e) = next.validate() {
        warn!("Config update rejected: {e}");
        return Err(e);
    }

    *app_config.write().await = next.clone();
    info!("App config updated in memory");

    // Then persist (if this fails, memory still updated)
    if let Some(dir) = config_dir {
        match next.save(dir) {
            Ok(()) => info!("App config saved to disk"),
            Err(e) => error!("App config saved to memory but disk write failed: {e}"),
        }
    }

    Ok(next)
}

/// Apply a partial settings object. Unknown keys and wrongly typed values
/// are rejected.
#[track_caller]
fn merge_settings(
    current: &AppSettings,
    patch: Map<String, Value>,
) -> Result<AppSettings, ConfigError> {
    let location = ErrorLocation::from(Location::caller());

    let Ok(Value::Object(mut merged)) = serde_json::to_value(current) else {
        return Err(ConfigError::SerializeError {
            location,
            reason: "Settings did not serialize to an object".to_string(),
        });
    };

    for (key, value) in patch {
        if !merged.contains_key(&key) {
            return Err(ConfigError::ValidationError {
                location,
                reason: format!("Unknown setting: {key}"),
            });
        }
        merged.insert(key, value);
    }

    serde_json::from_value(Value::Object(merged)).map_err(|e| ConfigError::ValidationError {
        location,
        reason: format!("Invalid settings: {e}"),
    })
}
