pub mod bridge;
pub mod collaborator;
pub mod config;
pub mod dispatch;
pub mod handler;
pub mod ipc;

pub use bridge::BridgeError;
pub use collaborator::CollaboratorError;
pub use config::ConfigError;
pub use dispatch::DispatchError;
pub use handler::HandlerError;
pub use ipc::IpcError;

use thiserror::Error;

/// Startup errors from assembling or launching the host.
#[derive(Debug, Error)]
pub enum HostError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Dispatch(#[from] dispatch::DispatchError),

    #[error(transparent)]
    Ipc(#[from] ipc::IpcError),

    #[error(transparent)]
    Collaborator(#[from] collaborator::CollaboratorError),
}
