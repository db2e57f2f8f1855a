//! Handle to a running IPC server.

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Returned by [`start_ipc_server`](crate::ipc::start_ipc_server).
///
/// Dropping the handle does not stop the server; call
/// [`shutdown`](Self::shutdown). Shutdown stops accepting and closes every
/// open connection.
pub struct IpcServerHandle {
    pub(crate) port: u16,
    pub(crate) auth_token: String,
    pub(crate) shutdown: CancellationToken,
    pub(crate) task: JoinHandle<()>,
}

impl IpcServerHandle {
    /// The bound port (useful when started on port 0).
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Token clients must present in their handshake.
    pub fn auth_token(&self) -> &str {
        &self.auth_token
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stop the server and wait for the accept loop to exit.
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        let _ = self.task.await;
    }
}
