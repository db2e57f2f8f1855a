//! Values exchanged over the protocol.
//!
//! Everything here is plain data with camelCase serde names. Host state
//! holds these behind copy-on-write snapshots; nothing in this module
//! mutates shared state.

pub mod account;
pub mod log_entry;
pub mod network;
pub mod session;
pub mod update;
pub mod wifi;

pub use account::{Account, CredentialRef};
pub use log_entry::{LogEntry, LogLevel};
pub use network::{Connectivity, NetworkInfo, NetworkStatus, WifiInfo};
pub use session::{SessionStatus, SessionToken};
pub use update::{UpdateInfo, UpdateState};
pub use wifi::WifiProfile;

use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch, saturating on clock errors.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}
