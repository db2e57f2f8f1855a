use common::ErrorLocation;

use thiserror::Error as ThisError;

/// Errors establishing a Bridge transport.
///
/// Once a transport is up, individual calls report [`Failure`] values
/// instead.
///
/// [`Failure`]: crate::protocol::Failure
#[derive(Debug, ThisError)]
pub enum BridgeError {
    #[error("Connect Error: {message} {location}")]
    Connect {
        message: String,
        location: ErrorLocation,
    },

    #[error("Auth Error: {message} {location}")]
    Auth {
        message: String,
        location: ErrorLocation,
    },

    #[error(transparent)]
    Ipc(#[from] super::ipc::IpcError),
}
