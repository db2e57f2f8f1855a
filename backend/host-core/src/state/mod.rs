//! Host-owned state.
//!
//! Each store keeps its value behind `Arc<RwLock<Arc<T>>>`: readers clone the
//! inner `Arc` and never block on a writer for longer than a pointer swap;
//! writers build a complete new value and replace the old one in a single
//! assignment, so no reader can observe a half-applied mutation.
//!
//! Callers serialize mutations per resource through the dispatcher; the
//! write lock additionally keeps a direct caller from losing updates.

mod accounts;
mod config_state;
mod session;
mod wifi;

pub use accounts::{AccountPatch, AccountStore};
pub use config_state::{ConfigCommand, ConfigState};
pub use session::SessionState;
pub use wifi::{WifiPatch, WifiStore};
