//! Bridge transport over the host's IPC WebSocket.

use super::transport::Transport;
use crate::channel;
use crate::error::BridgeError;
use crate::events::{EventBus, EventFrame, EventReceiver};
use crate::protocol::{
    self, AUTH_REQUEST_ID, Failure, IpcAuthHandshake, IpcClientMessage, IpcInvoke, IpcServerMessage,
    UNSOLICITED_REQUEST_ID, ipc_client_message, ipc_server_message,
};
use crate::IPC_HOSTNAME;

use common::ErrorLocation;

use std::collections::HashMap;
use std::future::Future;
use std::panic::Location;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use backoff::{ExponentialBackoff, backoff::Backoff};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use log::{debug, trace, warn};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::time::sleep as TokioSleep;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_util::sync::CancellationToken;

const CONNECT_MAX_ELAPSED: Duration = Duration::from_secs(10);
const OUTBOUND_QUEUE_SIZE: usize = 256;
/// Ids below this are reserved (0 unsolicited, 1 handshake).
const FIRST_REQUEST_ID: u64 = 2;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type Reply = oneshot::Sender<Result<Value, Failure>>;
type PendingMap = Arc<Mutex<HashMap<u64, Reply>>>;

/// Authenticated connection to a running IPC server.
///
/// Responses are matched to requests by id; events are fanned out to every
/// receiver from [`Transport::events`]. Dropping the transport closes the
/// connection.
pub struct WsTransport {
    outbound: mpsc::Sender<IpcClientMessage>,
    pending: PendingMap,
    next_id: AtomicU64,
    events: EventBus,
    closed: CancellationToken,
}

impl WsTransport {
    /// Connect to `127.0.0.1:{port}` and authenticate.
    ///
    /// Connection attempts are retried with exponential backoff while the
    /// server is still coming up.
    pub async fn connect(port: u16, auth_token: &str) -> Result<Self, BridgeError> {
        let url = format!("ws://{IPC_HOSTNAME}:{port}");
        let mut ws = connect_with_backoff(&url).await?;

        authenticate(&mut ws, auth_token).await?;
        debug!("Bridge connected to {url}");

        let (write, read) = ws.split();
        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_QUEUE_SIZE);
        let events = EventBus::new();
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let closed = CancellationToken::new();

        tokio::spawn(write_loop(write, outbound_rx, closed.clone()));
        tokio::spawn(read_loop(
            read,
            Arc::clone(&pending),
            events.clone(),
            closed.clone(),
        ));

        Ok(Self {
            outbound: outbound_tx,
            pending,
            next_id: AtomicU64::new(FIRST_REQUEST_ID),
            events,
            closed,
        })
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    async fn send_invoke(&self, channel: &str, payload: Value) -> Result<Value, Failure> {
        if self.is_closed() {
            return Err(connection_closed());
        }

        let request_id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (reply_tx, reply_rx) = oneshot::channel();
        if let Ok(mut pending) = self.pending.lock() {
            pending.insert(request_id, reply_tx);
        }
        let _guard = PendingGuard {
            pending: &self.pending,
            request_id,
        };

        let msg = IpcClientMessage {
            request_id,
            payload: Some(ipc_client_message::Payload::Invoke(IpcInvoke {
                channel: channel.to_string(),
                payload_json: payload.to_string(),
            })),
        };

        self.outbound
            .send(msg)
            .await
            .map_err(|_| connection_closed())?;

        reply_rx.await.unwrap_or_else(|_| Err(connection_closed()))
    }
}

impl Transport for WsTransport {
    fn invoke(
        &self,
        channel: &str,
        payload: Value,
    ) -> impl Future<Output = Result<Value, Failure>> + Send {
        self.send_invoke(channel, payload)
    }

    fn events(&self) -> EventReceiver {
        self.events.subscribe()
    }
}

impl Drop for WsTransport {
    fn drop(&mut self) {
        self.closed.cancel();
    }
}

/// Removes a pending entry whose caller went away (e.g. timed out).
struct PendingGuard<'a> {
    pending: &'a PendingMap,
    request_id: u64,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.remove(&self.request_id);
        }
    }
}

fn connection_closed() -> Failure {
    Failure::handler_fault("IPC connection closed")
}

async fn connect_with_backoff(url: &str) -> Result<WsStream, BridgeError> {
    let mut backoff = ExponentialBackoff {
        max_elapsed_time: Some(CONNECT_MAX_ELAPSED),
        ..Default::default()
    };

    loop {
        match connect_async(url).await {
            Ok((ws, _)) => return Ok(ws),
            Err(e) => match backoff.next_backoff() {
                Some(duration) => {
                    trace!("IPC server not reachable ({e}), retrying after {duration:?}");
                    TokioSleep(duration).await;
                }
                None => {
                    return Err(BridgeError::Connect {
                        message: format!("Could not connect to {url}: {e}"),
                        location: ErrorLocation::from(Location::caller()),
                    });
                }
            },
        }
    }
}

async fn authenticate(ws: &mut WsStream, auth_token: &str) -> Result<(), BridgeError> {
    let handshake = IpcClientMessage {
        request_id: AUTH_REQUEST_ID,
        payload: Some(ipc_client_message::Payload::AuthHandshake(IpcAuthHandshake {
            token: auth_token.to_string(),
        })),
    };

    ws.send(Message::Binary(protocol::encode(&handshake)?.into()))
        .await
        .map_err(|e| BridgeError::Connect {
            message: format!("Failed to send handshake: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })?;

    let response = loop {
        match ws.next().await {
            Some(Ok(Message::Binary(data))) => break protocol::decode::<IpcServerMessage>(&data)?,
            Some(Ok(Message::Close(_))) | None => {
                return Err(BridgeError::Auth {
                    message: "Connection closed during handshake".to_string(),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
            Some(Ok(_)) => continue,
            Some(Err(e)) => {
                return Err(BridgeError::Connect {
                    message: format!("Failed to read handshake response: {e}"),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        }
    };

    match response.payload {
        Some(ipc_server_message::Payload::AuthHandshakeResponse(auth)) if auth.success => Ok(()),
        Some(ipc_server_message::Payload::AuthHandshakeResponse(auth)) => Err(BridgeError::Auth {
            message: auth.error.unwrap_or_else(|| "Authentication rejected".to_string()),
            location: ErrorLocation::from(Location::caller()),
        }),
        _ => Err(BridgeError::Auth {
            message: "Unexpected handshake response".to_string(),
            location: ErrorLocation::from(Location::caller()),
        }),
    }
}

async fn write_loop(
    mut write: SplitSink<WsStream, Message>,
    mut outbound: mpsc::Receiver<IpcClientMessage>,
    closed: CancellationToken,
) {
    loop {
        let msg = tokio::select! {
            biased;
            () = closed.cancelled() => break,
            msg = outbound.recv() => match msg {
                Some(msg) => msg,
                None => break,
            },
        };

        let frame = match protocol::encode(&msg) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Failed to encode IPC request: {e}");
                continue;
            }
        };
        if let Err(e) = write.send(Message::Binary(frame.into())).await {
            warn!("IPC write failed: {e}");
            break;
        }
    }

    closed.cancel();
    let _ = write.close().await;
}

async fn read_loop(
    mut read: SplitStream<WsStream>,
    pending: PendingMap,
    events: EventBus,
    closed: CancellationToken,
) {
    loop {
        let msg = tokio::select! {
            biased;
            () = closed.cancelled() => break,
            msg = read.next() => msg,
        };

        match msg {
            Some(Ok(Message::Binary(data))) => match protocol::decode::<IpcServerMessage>(&data) {
                Ok(server_msg) => route_message(server_msg, &pending, &events),
                Err(e) => warn!("Failed to decode IPC frame: {e}"),
            },
            Some(Ok(Message::Close(_))) | None => break,
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                warn!("IPC read failed: {e}");
                break;
            }
        }
    }

    closed.cancel();

    // Fail everything still waiting.
    if let Ok(mut pending) = pending.lock() {
        for (_, reply) in pending.drain() {
            let _ = reply.send(Err(connection_closed()));
        }
    }
}

fn route_message(msg: IpcServerMessage, pending: &PendingMap, events: &EventBus) {
    let request_id = msg.request_id;

    let reply = match msg.payload {
        Some(ipc_server_message::Payload::Event(event)) => {
            let Some(channel) = channel::event_channel(&event.channel) else {
                warn!("Dropping event on unregistered channel {:?}", event.channel);
                return;
            };
            match serde_json::from_str(&event.payload_json) {
                Ok(payload) => {
                    events.publish(EventFrame { channel, payload });
                }
                Err(e) => warn!("Dropping malformed {channel} event: {e}"),
            }
            return;
        }
        Some(ipc_server_message::Payload::Response(response)) => {
            serde_json::from_str(&response.payload_json)
                .map_err(|e| Failure::handler_fault(format!("Malformed response: {e}")))
        }
        Some(ipc_server_message::Payload::Failure(failure)) => Err(failure.to_failure()),
        Some(ipc_server_message::Payload::AuthHandshakeResponse(_)) | None => return,
    };

    if request_id == UNSOLICITED_REQUEST_ID {
        if let Err(failure) = reply {
            warn!("Host reported an unsolicited failure: {failure}");
        }
        return;
    }

    let waiter = pending.lock().ok().and_then(|mut p| p.remove(&request_id));
    match waiter {
        Some(waiter) => {
            let _ = waiter.send(reply);
        }
        None => debug!("Response for unknown or abandoned request {request_id}"),
    }
}
