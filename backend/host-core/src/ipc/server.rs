//! IPC WebSocket server.
//!
//! One task accepts connections; each connection gets:
//!
//! - a reader loop that decodes frames and spawns one task per `Invoke`
//! - a writer task that owns the socket's write half and drains an mpsc queue
//! - an event forwarder that copies host events into the same queue
//!
//! Responses therefore never block the reader, and events reach the socket
//! in the order the bus emitted them.

use crate::dispatch::Dispatcher;
use crate::error::ipc::IpcError;
use crate::events::{EventBus, EventReceiver};
use crate::ipc::connection_state::ConnectionState;
use crate::ipc::handle::IpcServerHandle;
use crate::protocol::{
    self, Failure, IpcClientMessage, IpcInvoke, IpcServerMessage, UNSOLICITED_REQUEST_ID,
    ipc_client_message,
};
use crate::IPC_HOSTNAME;

use common::ErrorLocation;

use std::net::SocketAddr;
use std::panic::Location;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::spawn as TokioSpawn;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{WebSocketStream, accept_async};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

const OUTBOUND_QUEUE_SIZE: usize = 256;

type WsSink = SplitSink<WebSocketStream<TcpStream>, Message>;

/// Start the IPC server on `127.0.0.1:{ipc_port}` (0 picks a free port).
///
/// A random token is generated when `auth_token` is `None`; either way it is
/// available from [`IpcServerHandle::auth_token`].
///
/// # Errors
///
/// Returns [`IpcError::Io`] if the port cannot be bound.
pub async fn start_ipc_server(
    ipc_port: u16,
    auth_token: Option<String>,
    dispatcher: Dispatcher,
    events: EventBus,
) -> Result<IpcServerHandle, IpcError> {
    let auth_token = auth_token.unwrap_or_else(|| {
        info!("Generated IPC auth token");
        Uuid::new_v4().to_string()
    });

    let listener = TcpListener::bind((IPC_HOSTNAME, ipc_port)).await?;
    let port = listener.local_addr()?.port();
    info!("IPC server listening on {IPC_HOSTNAME}:{port}");

    let shutdown = CancellationToken::new();
    let accept_shutdown = shutdown.clone();
    let token = auth_token.clone();

    let task = TokioSpawn(async move {
        loop {
            tokio::select! {
                biased;
                () = accept_shutdown.cancelled() => break,
                accepted = listener.accept() => match accepted {
                    Ok((stream, addr)) => {
                        debug!("Client connecting from {addr}");
                        let connection = handle_connection(
                            stream,
                            addr,
                            token.clone(),
                            dispatcher.clone(),
                            events.clone(),
                            accept_shutdown.child_token(),
                        );
                        TokioSpawn(async move {
                            if let Err(e) = connection.await {
                                warn!("IPC connection from {addr} ended with error: {e}");
                            }
                        });
                    }
                    Err(e) => {
                        error!("IPC accept failed: {e}");
                    }
                },
            }
        }
        info!("IPC server stopped");
    });

    Ok(IpcServerHandle {
        port,
        auth_token,
        shutdown,
        task,
    })
}

/// Serve one connection.
///
/// 1. Drop non-loopback peers silently
/// 2. Require `AuthHandshake` as the first frame (wrong token: failure
///    response then close; anything else: close without response)
/// 3. Dispatch `Invoke` frames concurrently and forward bus events until
///    the peer disconnects or the server shuts down
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    auth_token: String,
    dispatcher: Dispatcher,
    events: EventBus,
    shutdown: CancellationToken,
) -> Result<(), IpcError> {
    // SECURITY: Reject non-loopback connections
    if !addr.ip().is_loopback() {
        warn!("Rejected non-loopback connection from {addr}");
        return Ok(());
    }

    let ws_stream = accept_async(stream).await.map_err(|e| IpcError::Handshake {
        message: format!("WebSocket handshake failed: {e}"),
        location: ErrorLocation::from(Location::caller()),
    })?;

    let (mut write, mut read) = ws_stream.split();
    let mut state = ConnectionState::new(addr, auth_token);

    // SECURITY: First message MUST be auth handshake
    let first = match read.next().await {
        Some(Ok(Message::Binary(data))) => protocol::decode::<IpcClientMessage>(&data)?,
        Some(Ok(_)) => {
            warn!("Client {addr} sent non-binary first message");
            return Ok(());
        }
        Some(Err(e)) => {
            return Err(IpcError::Read {
                message: format!("Error reading first message: {e}"),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        None => {
            debug!("Client {addr} disconnected before sending auth");
            return Ok(());
        }
    };

    let Some(ipc_client_message::Payload::AuthHandshake(auth)) = first.payload else {
        warn!("Client {addr} auth failed: first message was not auth handshake");
        return Ok(());
    };

    if !state.validate_token(&auth.token) {
        warn!("Client {addr} auth failed: invalid token");
        send_message(
            &mut write,
            &IpcServerMessage::auth_response(false, Some("Invalid authentication token")),
        )
        .await?;
        return Ok(());
    }

    // Subscribe before confirming so no event emitted after the client sees
    // the confirmation can be missed.
    let event_rx = events.subscribe();
    send_message(&mut write, &IpcServerMessage::auth_response(true, None)).await?;
    info!("Client {} authenticated", state.peer());

    let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_QUEUE_SIZE);
    let writer = TokioSpawn(write_loop(write, outbound_rx));
    let forwarder = TokioSpawn(forward_events(event_rx, outbound_tx.clone()));

    let result = read_loop(&mut read, &state, &dispatcher, &outbound_tx, &shutdown).await;

    forwarder.abort();
    drop(outbound_tx);
    let _ = writer.await;

    info!("Client {addr} disconnected");
    result
}

async fn read_loop(
    read: &mut futures_util::stream::SplitStream<WebSocketStream<TcpStream>>,
    state: &ConnectionState,
    dispatcher: &Dispatcher,
    outbound: &mpsc::Sender<IpcServerMessage>,
    shutdown: &CancellationToken,
) -> Result<(), IpcError> {
    let addr = state.peer();

    loop {
        let msg = tokio::select! {
            biased;
            () = shutdown.cancelled() => return Ok(()),
            msg = read.next() => msg,
        };

        match msg {
            Some(Ok(Message::Binary(data))) => {
                let client_msg = match protocol::decode::<IpcClientMessage>(&data) {
                    Ok(msg) => msg,
                    Err(e) => {
                        error!("Failed to decode protobuf from {addr}: {e}");
                        let failure = Failure::handler_fault("Invalid protobuf message");
                        let _ = outbound
                            .send(IpcServerMessage::failure(UNSOLICITED_REQUEST_ID, &failure))
                            .await;
                        continue;
                    }
                };

                handle_message(client_msg, state, dispatcher, outbound).await;
            }
            Some(Ok(Message::Close(_))) | None => return Ok(()),
            Some(Ok(_)) => {
                debug!("Client {addr} sent non-binary message after auth, ignoring");
            }
            Some(Err(e)) => {
                return Err(IpcError::Read {
                    message: format!("Error reading message: {e}"),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        }
    }
}

async fn handle_message(
    client_msg: IpcClientMessage,
    state: &ConnectionState,
    dispatcher: &Dispatcher,
    outbound: &mpsc::Sender<IpcServerMessage>,
) {
    let request_id = client_msg.request_id;

    match client_msg.payload {
        Some(ipc_client_message::Payload::Invoke(invoke)) if state.is_authenticated() => {
            let dispatcher = dispatcher.clone();
            let outbound = outbound.clone();
            TokioSpawn(async move {
                let reply = invoke_channel(&dispatcher, request_id, invoke).await;
                let _ = outbound.send(reply).await;
            });
        }
        Some(ipc_client_message::Payload::Invoke(_)) => {
            let failure = Failure::handler_fault("Connection is not authenticated");
            let _ = outbound
                .send(IpcServerMessage::failure(request_id, &failure))
                .await;
        }
        Some(ipc_client_message::Payload::AuthHandshake(_)) => {
            let failure = Failure::handler_fault("Auth handshake already completed");
            let _ = outbound
                .send(IpcServerMessage::failure(request_id, &failure))
                .await;
        }
        None => {
            warn!("Client {} sent message with no payload", state.peer());
            let failure = Failure::handler_fault("No payload in message");
            let _ = outbound
                .send(IpcServerMessage::failure(request_id, &failure))
                .await;
        }
    }
}

async fn invoke_channel(dispatcher: &Dispatcher, request_id: u64, invoke: IpcInvoke) -> IpcServerMessage {
    let payload = if invoke.payload_json.trim().is_empty() {
        Value::Null
    } else {
        match serde_json::from_str(&invoke.payload_json) {
            Ok(payload) => payload,
            Err(e) => {
                let failure = Failure::handler_fault(format!("Invalid JSON payload: {e}"));
                return IpcServerMessage::failure(request_id, &failure);
            }
        }
    };

    match dispatcher.dispatch(&invoke.channel, payload).await {
        Ok(value) => IpcServerMessage::response(request_id, value.to_string()),
        Err(failure) => IpcServerMessage::failure(request_id, &failure),
    }
}

/// Copy host events into the connection's outbound queue.
async fn forward_events(
    mut events: EventReceiver,
    outbound: mpsc::Sender<IpcServerMessage>,
) {
    while let Some(frame) = events.recv().await {
        let msg = IpcServerMessage::event(frame.channel.as_str(), frame.payload.to_string());
        if outbound.send(msg).await.is_err() {
            break;
        }
    }
}

async fn write_loop(mut write: WsSink, mut outbound: mpsc::Receiver<IpcServerMessage>) {
    while let Some(msg) = outbound.recv().await {
        if let Err(e) = send_message(&mut write, &msg).await {
            warn!("Dropping IPC writer: {e}");
            break;
        }
    }
    let _ = write.close().await;
}

async fn send_message(write: &mut WsSink, msg: &IpcServerMessage) -> Result<(), IpcError> {
    let buf = protocol::encode(msg)?;

    write
        .send(Message::Binary(buf.into()))
        .await
        .map_err(|e| IpcError::Send {
            message: format!("Failed to send message: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })
}
