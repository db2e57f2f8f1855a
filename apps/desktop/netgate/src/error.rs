use common::ErrorLocation;

use serde::Serialize;
use thiserror::Error;

/// Errors that stop the host process from starting.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum NetgateError {
    /// Error from this binary (directories, logger, connection file)
    #[error("Netgate Error: {message} {location}")]
    Netgate {
        message: String,
        location: ErrorLocation,
    },

    /// Error from host-core while loading config or assembling the host
    #[error("Host Error: {message} {location}")]
    Host {
        message: String,
        location: ErrorLocation,
    },
}
