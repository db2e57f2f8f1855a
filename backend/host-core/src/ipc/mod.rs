//! IPC layer between the UI process and the host.
//!
//! - WebSocket server bound to `127.0.0.1`, non-loopback peers dropped
//! - Binary protobuf envelopes (see [`crate::protocol`]) carrying JSON payloads
//! - Authentication handshake as the first frame of every connection
//! - Every `Invoke` is routed through the [`Dispatcher`](crate::dispatch::Dispatcher)
//! - Every event on the host [`EventBus`](crate::events::EventBus) is forwarded
//!   to every authenticated connection

mod connection_state;
mod handle;
mod server;

pub use handle::IpcServerHandle;
pub use server::start_ipc_server;
