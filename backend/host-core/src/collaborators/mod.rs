//! Contracts the host consumes from external collaborators.
//!
//! Credential storage, the remote auth portal, desktop notifications and OS
//! auto-launch registration all live outside the coordination layer. Each is
//! a trait object on [`HostServices`](crate::host::HostServices); the
//! implementations here are the defaults the desktop binary ships with.

mod auth;
mod auto_launch;
mod credentials;
mod notifier;

pub use auth::{AuthService, DisabledAuthService, HttpAuthService};
pub use auto_launch::{AutoLaunchRegistrar, LoggingAutoLaunch};
pub use credentials::{CredentialStore, InMemoryCredentialStore};
pub use notifier::{LogNotifier, Notification, NotificationType, Notifier};
