use netgate::error::NetgateError;
use netgate::ipc_config::IpcConfig;
use netgate::logger::initialize as LoggerInitialize;

use host_core::config::{AppConfig, default_config_dir, default_data_dir};
use host_core::events::EventBus;
use host_core::host::Host;
use host_core::log_store::LogStore;
use host_core::{APP_NAME, APP_VERSION};

use common::ErrorLocation;

use std::fs::create_dir_all;
use std::panic::Location;
use std::path::Path;
use std::process::ExitCode;

use log::{error, info, warn};
use tokio::spawn as TokioSpawn;
use uuid::Uuid;

const LOG_DIR_NAME: &str = "logs";

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("{APP_NAME}: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), NetgateError> {
    let config_dir = default_config_dir().map_err(host_error)?;
    let data_dir = default_data_dir().map_err(host_error)?;
    let log_dir = data_dir.join(LOG_DIR_NAME);

    ensure_dir(&config_dir)?;
    ensure_dir(&log_dir)?;

    // Logger first, so config loading is already captured by the log store.
    let events = EventBus::new();
    let logs = LogStore::new(events.clone());
    LoggerInitialize(&log_dir, Some(logs.clone()))?;

    info!("{APP_NAME} v{APP_VERSION} starting");
    info!("Log directory: {}", log_dir.display());

    let mut config = AppConfig::load(&config_dir).map_err(host_error)?;
    config.apply_env_overrides();
    config.validate().map_err(host_error)?;
    let ipc_port = config.ipc.port;

    let host = Host::builder()
        .config(config)
        .config_dir(&config_dir)
        .data_dir(&data_dir)
        .events(events)
        .logs(logs)
        .build()
        .map_err(host_error)?;

    info!("Starting IPC server on port {ipc_port}");
    let auth_token = Uuid::new_v4().to_string();
    let ipc = host
        .start_ipc(ipc_port, Some(auth_token))
        .await
        .map_err(host_error)?;

    IpcConfig::new(ipc.port(), ipc.auth_token().to_string()).write(&config_dir)?;
    info!("IPC server started successfully");

    let shutdown = host.shutdown_token();
    let monitor_cancel = shutdown.child_token();
    let monitor = host.start_monitor(monitor_cancel.clone());

    if host.check_on_startup() {
        let update = host.update().clone();
        TokioSpawn(async move {
            match update.check().await {
                Ok(state) => info!("Startup update check finished: {state:?}"),
                Err(e) => warn!("Startup update check failed: {e}"),
            }
        });
    }

    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("Interrupt received, shutting down"),
        _ = shutdown.cancelled() => info!("Quit requested, shutting down"),
    }

    monitor_cancel.cancel();
    ipc.shutdown().await;
    let _ = monitor.await;
    IpcConfig::remove(&config_dir);

    info!("{APP_NAME} stopped");
    Ok(())
}

#[track_caller]
fn ensure_dir(dir: &Path) -> Result<(), NetgateError> {
    create_dir_all(dir).map_err(|e| NetgateError::Netgate {
        message: format!("Failed to create directory {}: {e}", dir.display()),
        location: ErrorLocation::from(Location::caller()),
    })
}

#[track_caller]
fn host_error(e: impl std::fmt::Display) -> NetgateError {
    NetgateError::Host {
        message: e.to_string(),
        location: ErrorLocation::from(Location::caller()),
    }
}
