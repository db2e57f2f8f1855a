use crate::protocol::IpcFailureKind;

use std::fmt::{Display, Formatter, Result as FormatResult};

use serde::{Deserialize, Serialize};

/// Failure kinds that may cross the trust boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureKind {
    UnknownChannel,
    Busy,
    IllegalTransition,
    NotFound,
    HandlerFault,
    Timeout,
}

/// The only error shape the UI ever sees.
///
/// Host-side errors are converted into a `Failure` at the dispatcher
/// boundary; anything internal stays in the host log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
}

impl Failure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn unknown_channel(id: &str) -> Self {
        Self::new(FailureKind::UnknownChannel, format!("Unknown channel: {id}"))
    }

    pub fn busy(resource: impl Display) -> Self {
        Self::new(
            FailureKind::Busy,
            format!("{resource} is busy with another operation"),
        )
    }

    pub fn timeout(channel: &str) -> Self {
        Self::new(
            FailureKind::Timeout,
            format!("No response for {channel} before the deadline"),
        )
    }

    pub fn handler_fault(message: impl Into<String>) -> Self {
        Self::new(FailureKind::HandlerFault, message)
    }

    pub fn is(&self, kind: FailureKind) -> bool {
        self.kind == kind
    }
}

impl Display for Failure {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        write!(formatter, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for Failure {}

impl From<FailureKind> for IpcFailureKind {
    fn from(kind: FailureKind) -> Self {
        match kind {
            FailureKind::UnknownChannel => IpcFailureKind::UnknownChannel,
            FailureKind::Busy => IpcFailureKind::Busy,
            FailureKind::IllegalTransition => IpcFailureKind::IllegalTransition,
            FailureKind::NotFound => IpcFailureKind::NotFound,
            FailureKind::HandlerFault => IpcFailureKind::HandlerFault,
            FailureKind::Timeout => IpcFailureKind::Timeout,
        }
    }
}

impl From<IpcFailureKind> for FailureKind {
    fn from(kind: IpcFailureKind) -> Self {
        match kind {
            IpcFailureKind::UnknownChannel => FailureKind::UnknownChannel,
            IpcFailureKind::Busy => FailureKind::Busy,
            IpcFailureKind::IllegalTransition => FailureKind::IllegalTransition,
            IpcFailureKind::NotFound => FailureKind::NotFound,
            IpcFailureKind::Timeout => FailureKind::Timeout,
            IpcFailureKind::Unspecified | IpcFailureKind::HandlerFault => {
                FailureKind::HandlerFault
            }
        }
    }
}
