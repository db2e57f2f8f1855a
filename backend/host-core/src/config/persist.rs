//! JSON files written with temp file + rename.
//!
//! Shared by the config file and the account / WiFi stores.

use crate::error::config::ConfigError;

use common::ErrorLocation;

use std::panic::Location;
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Read `{dir}/{file_name}`, returning `Ok(None)` when it does not exist.
#[track_caller]
pub fn read_json<T: DeserializeOwned>(dir: &Path, file_name: &str) -> Result<Option<T>, ConfigError> {
    let path = dir.join(file_name);

    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
        location: ErrorLocation::from(Location::caller()),
        path: path.clone(),
        source: e,
    })?;

    serde_json::from_str(&contents)
        .map(Some)
        .map_err(|e| ConfigError::ParseError {
            location: ErrorLocation::from(Location::caller()),
            path,
            reason: e.to_string(),
        })
}

/// Write `value` as pretty JSON to `{dir}/{file_name}` atomically.
#[track_caller]
pub fn write_json_atomic<T: Serialize>(
    dir: &Path,
    file_name: &str,
    value: &T,
) -> Result<(), ConfigError> {
    std::fs::create_dir_all(dir).map_err(|e| ConfigError::WriteError {
        location: ErrorLocation::from(Location::caller()),
        path: dir.to_path_buf(),
        source: e,
    })?;

    let path = dir.join(file_name);
    let temp_path = dir.join(format!("{file_name}.tmp"));

    let json = serde_json::to_string_pretty(value).map_err(|e| ConfigError::SerializeError {
        location: ErrorLocation::from(Location::caller()),
        reason: e.to_string(),
    })?;

    std::fs::write(&temp_path, json).map_err(|e| ConfigError::WriteError {
        location: ErrorLocation::from(Location::caller()),
        path: temp_path.clone(),
        source: e,
    })?;

    std::fs::rename(&temp_path, &path).map_err(|e| ConfigError::WriteError {
        location: ErrorLocation::from(Location::caller()),
        path: path.clone(),
        source: e,
    })
}
