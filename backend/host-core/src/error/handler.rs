use crate::error::{CollaboratorError, ConfigError};
use crate::protocol::{Failure, FailureKind};

use common::ErrorLocation;

use std::panic::Location;

use log::error;
use thiserror::Error as ThisError;

/// Per-request handler errors.
///
/// Converted into a boundary [`Failure`] by [`HandlerError::into_failure`];
/// variants that wrap internal errors are logged and replaced by a generic
/// message at that point.
#[derive(Debug, ThisError)]
pub enum HandlerError {
    #[error("Invalid Payload Error: {message} {location}")]
    InvalidPayload {
        message: String,
        location: ErrorLocation,
    },

    #[error("Not Found Error: {message} {location}")]
    NotFound {
        message: String,
        location: ErrorLocation,
    },

    #[error("Busy Error: {message} {location}")]
    Busy {
        message: String,
        location: ErrorLocation,
    },

    #[error("Illegal Transition Error: {message} {location}")]
    IllegalTransition {
        message: String,
        location: ErrorLocation,
    },

    #[error("Rejected Error: {message} {location}")]
    Rejected {
        message: String,
        location: ErrorLocation,
    },

    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Internal Error: {message} {location}")]
    Internal {
        message: String,
        location: ErrorLocation,
    },
}

impl HandlerError {
    #[track_caller]
    pub fn invalid_payload(message: impl Into<String>) -> Self {
        HandlerError::InvalidPayload {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn not_found(message: impl Into<String>) -> Self {
        HandlerError::NotFound {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn busy(message: impl Into<String>) -> Self {
        HandlerError::Busy {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn illegal_transition(message: impl Into<String>) -> Self {
        HandlerError::IllegalTransition {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// A validation failure whose reason is safe to show the user.
    #[track_caller]
    pub fn rejected(message: impl Into<String>) -> Self {
        HandlerError::Rejected {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn internal(message: impl Into<String>) -> Self {
        HandlerError::Internal {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Shape the error for the UI.
    ///
    /// Payload and validation problems keep their message; collaborator and
    /// internal errors are logged in full and reported with a generic one.
    pub fn into_failure(self, channel: &str) -> Failure {
        match self {
            HandlerError::InvalidPayload { message, .. } => Failure::new(
                FailureKind::HandlerFault,
                format!("Invalid payload for {channel}: {message}"),
            ),
            HandlerError::NotFound { message, .. } => Failure::new(FailureKind::NotFound, message),
            HandlerError::Busy { message, .. } => Failure::new(FailureKind::Busy, message),
            HandlerError::IllegalTransition { message, .. } => {
                Failure::new(FailureKind::IllegalTransition, message)
            }
            HandlerError::Rejected { message, .. } => {
                Failure::new(FailureKind::HandlerFault, message)
            }
            HandlerError::Config(ConfigError::ValidationError { reason, .. }) => {
                Failure::new(FailureKind::HandlerFault, reason)
            }
            other => {
                error!("Handler for {channel} failed: {other}");
                Failure::new(
                    FailureKind::HandlerFault,
                    format!("{channel} failed, see host log for details"),
                )
            }
        }
    }
}

impl From<serde_json::Error> for HandlerError {
    #[track_caller]
    fn from(error: serde_json::Error) -> Self {
        HandlerError::InvalidPayload {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
