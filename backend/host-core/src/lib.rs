pub mod bridge;
pub mod channel;
pub mod collaborators;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod handlers;
pub mod host;
pub mod ipc;
pub mod log_store;
pub mod model;
pub mod monitor;
pub mod protocol;
pub mod state;
pub mod update;

#[cfg(test)]
mod tests;

pub const APP_NAME: &str = "netgate";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const USER_AGENT: &str = const_format::concatcp!(APP_NAME, "/", APP_VERSION);
pub const IPC_HOSTNAME: &str = "127.0.0.1";
