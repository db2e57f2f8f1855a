//! Connection file for the UI process.
//!
//! The host binds the IPC server, then publishes `{config_dir}/ipc.json`
//! so the UI knows where to connect and which token to present.

use crate::error::NetgateError;

use host_core::config::persist::{read_json, write_json_atomic};

use common::ErrorLocation;

use std::panic::Location;
use std::path::Path;

use serde::{Deserialize, Serialize};

pub const IPC_CONFIG_FILE_NAME: &str = "ipc.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpcConfig {
    port: u16,
    auth_token: String,
}

impl IpcConfig {
    pub fn new(port: u16, auth_token: String) -> Self {
        Self { port, auth_token }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn auth_token(&self) -> &str {
        &self.auth_token
    }

    /// Atomically replace `{dir}/ipc.json`.
    #[track_caller]
    pub fn write(&self, dir: &Path) -> Result<(), NetgateError> {
        write_json_atomic(dir, IPC_CONFIG_FILE_NAME, self).map_err(|e| NetgateError::Netgate {
            message: format!("Failed to write {IPC_CONFIG_FILE_NAME}: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })
    }

    /// Read `{dir}/ipc.json`; `None` when no host has published one.
    #[track_caller]
    pub fn read(dir: &Path) -> Result<Option<Self>, NetgateError> {
        read_json(dir, IPC_CONFIG_FILE_NAME).map_err(|e| NetgateError::Netgate {
            message: format!("Failed to read {IPC_CONFIG_FILE_NAME}: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })
    }

    /// Delete the connection file on shutdown so a stale token is never reused.
    pub fn remove(dir: &Path) {
        let _ = std::fs::remove_file(dir.join(IPC_CONFIG_FILE_NAME));
    }
}
