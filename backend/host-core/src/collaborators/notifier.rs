use crate::error::CollaboratorError;

use log::info;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum NotificationType {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

/// Payload of `notification:show`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub title: String,
    pub body: String,
    #[serde(default, rename = "type")]
    pub kind: NotificationType,
    #[serde(default)]
    pub silent: bool,
}

/// Desktop notification backend.
pub trait Notifier: Send + Sync {
    fn show(&self, notification: &Notification) -> Result<(), CollaboratorError>;
}

/// Writes notifications to the host log.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn show(&self, notification: &Notification) -> Result<(), CollaboratorError> {
        info!(
            "Notification [{:?}{}] {}: {}",
            notification.kind,
            if notification.silent { ", silent" } else { "" },
            notification.title,
            notification.body
        );
        Ok(())
    }
}
