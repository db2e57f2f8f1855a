use crate::error::CollaboratorError;

use log::info;

/// OS login-item registration.
pub trait AutoLaunchRegistrar: Send + Sync {
    fn set_enabled(&self, enabled: bool) -> Result<(), CollaboratorError>;
}

/// Records the request in the host log only; the persisted setting is the
/// source of truth.
#[derive(Debug, Default)]
pub struct LoggingAutoLaunch;

impl AutoLaunchRegistrar for LoggingAutoLaunch {
    fn set_enabled(&self, enabled: bool) -> Result<(), CollaboratorError> {
        info!("Auto-launch registration set to {enabled}");
        Ok(())
    }
}
