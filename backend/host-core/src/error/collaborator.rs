use common::{ErrorLocation, HttpStatusCode};

use std::panic::Location;

use thiserror::Error as ThisError;

/// Failure of an external collaborator: OS probe, credential store, remote
/// service or installer.
///
/// The message may contain internal detail; it is logged host-side and never
/// forwarded to the UI verbatim.
#[derive(Debug, ThisError)]
pub enum CollaboratorError {
    #[error("Network Error: {message} {location}")]
    Network {
        message: String,
        location: ErrorLocation,
    },

    #[error("Server Error: {status}: {message} {location}")]
    Server {
        status: HttpStatusCode,
        message: String,
        location: ErrorLocation,
    },

    #[error("Credential Store Error: {message} {location}")]
    Credentials {
        message: String,
        location: ErrorLocation,
    },

    #[error("Platform Error: {message} {location}")]
    Platform {
        message: String,
        location: ErrorLocation,
    },

    #[error("Invalid Response Error: {message} {location}")]
    InvalidResponse {
        message: String,
        location: ErrorLocation,
    },

    #[error("IO Error: {message} {location}")]
    Io {
        message: String,
        location: ErrorLocation,
    },
}

impl CollaboratorError {
    #[track_caller]
    pub fn credentials(message: impl Into<String>) -> Self {
        CollaboratorError::Credentials {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn platform(message: impl Into<String>) -> Self {
        CollaboratorError::Platform {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn invalid_response(message: impl Into<String>) -> Self {
        CollaboratorError::InvalidResponse {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Transient failures worth retrying: connection problems and
    /// retryable HTTP statuses. Decided by category, never by message text.
    pub fn is_retryable(&self) -> bool {
        match self {
            CollaboratorError::Network { .. } => true,
            CollaboratorError::Server { status, .. } => status.is_retryable(),
            CollaboratorError::Credentials { .. }
            | CollaboratorError::Platform { .. }
            | CollaboratorError::InvalidResponse { .. }
            | CollaboratorError::Io { .. } => false,
        }
    }

    pub fn status(&self) -> Option<HttpStatusCode> {
        match self {
            CollaboratorError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for CollaboratorError {
    #[track_caller]
    fn from(error: reqwest::Error) -> Self {
        match error.status() {
            Some(status) => CollaboratorError::Server {
                status: HttpStatusCode(status.as_u16()),
                message: error.to_string(),
                location: ErrorLocation::from(Location::caller()),
            },
            None => CollaboratorError::Network {
                message: error.to_string(),
                location: ErrorLocation::from(Location::caller()),
            },
        }
    }
}

impl From<url::ParseError> for CollaboratorError {
    #[track_caller]
    fn from(error: url::ParseError) -> Self {
        CollaboratorError::Network {
            message: format!("Invalid URL: {error}"),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<std::io::Error> for CollaboratorError {
    #[track_caller]
    fn from(error: std::io::Error) -> Self {
        CollaboratorError::Io {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
