use std::fmt::{Display, Formatter, Result as FormatResult};

use serde::{Deserialize, Serialize};

/// The update lifecycle as seen by the UI.
///
/// Serialized with a `status` tag, e.g. `{"status":"downloading","progress":0.4}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum UpdateState {
    #[default]
    Idle,
    Checking,
    Available {
        version: String,
    },
    Downloading {
        progress: f32,
    },
    ReadyToInstall,
    Installing,
    Failed {
        reason: String,
    },
    UpToDate,
}

impl UpdateState {
    /// States that only exist while an operation is running.
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            UpdateState::Checking | UpdateState::Downloading { .. } | UpdateState::Installing
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            UpdateState::Idle => "Idle",
            UpdateState::Checking => "Checking",
            UpdateState::Available { .. } => "Available",
            UpdateState::Downloading { .. } => "Downloading",
            UpdateState::ReadyToInstall => "ReadyToInstall",
            UpdateState::Installing => "Installing",
            UpdateState::Failed { .. } => "Failed",
            UpdateState::UpToDate => "UpToDate",
        }
    }
}

impl Display for UpdateState {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        match self {
            UpdateState::Available { version } => write!(formatter, "Available({version})"),
            UpdateState::Downloading { progress } => {
                write!(formatter, "Downloading({:.0}%)", progress * 100.0)
            }
            UpdateState::Failed { reason } => write!(formatter, "Failed({reason})"),
            other => formatter.write_str(other.name()),
        }
    }
}

/// A release advertised by the update feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInfo {
    pub version: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}
