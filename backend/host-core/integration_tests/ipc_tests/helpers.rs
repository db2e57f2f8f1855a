//! Test helpers for IPC integration tests.
//!
//! - Starting a host-backed IPC server on a free port
//! - Sending/receiving protobuf frames
//! - Authentication and invoke shortcuts

use host_core::host::{Host, HostServices};
use host_core::ipc::IpcServerHandle;
use host_core::protocol::{
    IpcAuthHandshake, IpcAuthHandshakeResponse, IpcClientMessage, IpcInvoke, IpcServerMessage,
    ipc_client_message, ipc_server_message,
};

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use prost::Message as ProstMessage;
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

pub type TestSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub const TEST_AUTH_TOKEN: &str = "test-token-12345";

const RECEIVE_TIMEOUT: Duration = Duration::from_secs(5);

/// A local host served over IPC on an OS-assigned port.
pub async fn start_test_host() -> (Host, IpcServerHandle) {
    let host = Host::builder()
        .services(HostServices::local())
        .build()
        .expect("Failed to build host");
    let handle = host
        .start_ipc(0, Some(TEST_AUTH_TOKEN.to_string()))
        .await
        .expect("Failed to start IPC server");
    (host, handle)
}

pub async fn connect_to_server(ipc_port: u16) -> TestSocket {
    let url = format!("ws://127.0.0.1:{ipc_port}");
    let (ws_stream, _) = connect_async(&url)
        .await
        .expect("Failed to connect to WebSocket server");
    ws_stream
}

pub async fn send_protobuf<T: ProstMessage>(ws: &mut TestSocket, message: &T) {
    let mut buf = Vec::new();
    message.encode(&mut buf).expect("Failed to encode protobuf");
    ws.send(Message::Binary(buf.into()))
        .await
        .expect("Failed to send message");
}

/// Next binary frame, decoded. Panics on close or timeout.
pub async fn receive_protobuf<T: ProstMessage + Default>(ws: &mut TestSocket) -> T {
    loop {
        let msg = tokio::time::timeout(RECEIVE_TIMEOUT, ws.next())
            .await
            .expect("Timed out waiting for a frame")
            .expect("No message received")
            .expect("Error receiving message");

        if let Message::Binary(bytes) = msg {
            return T::decode(&bytes[..]).expect("Failed to decode protobuf");
        }
    }
}

pub async fn authenticate(ws: &mut TestSocket, token: &str) -> IpcAuthHandshakeResponse {
    let auth_msg = IpcClientMessage {
        request_id: 1,
        payload: Some(ipc_client_message::Payload::AuthHandshake(IpcAuthHandshake {
            token: token.to_string(),
        })),
    };

    send_protobuf(ws, &auth_msg).await;

    let response: IpcServerMessage = receive_protobuf(ws).await;
    match response.payload {
        Some(ipc_server_message::Payload::AuthHandshakeResponse(resp)) => resp,
        _ => panic!("Expected AuthHandshakeResponse, got something else"),
    }
}

pub async fn send_invoke(ws: &mut TestSocket, request_id: u64, channel: &str, payload_json: &str) {
    let msg = IpcClientMessage {
        request_id,
        payload: Some(ipc_client_message::Payload::Invoke(IpcInvoke {
            channel: channel.to_string(),
            payload_json: payload_json.to_string(),
        })),
    };
    send_protobuf(ws, &msg).await;
}

/// Next non-event frame.
pub async fn receive_reply(ws: &mut TestSocket) -> IpcServerMessage {
    loop {
        let msg: IpcServerMessage = receive_protobuf(ws).await;
        if !matches!(msg.payload, Some(ipc_server_message::Payload::Event(_))) {
            return msg;
        }
    }
}

/// Whether the server closed the socket within the receive timeout.
pub async fn is_connection_closed(ws: &mut TestSocket) -> bool {
    loop {
        match tokio::time::timeout(RECEIVE_TIMEOUT, ws.next()).await {
            Err(_) => return false,
            Ok(None) | Ok(Some(Err(_))) | Ok(Some(Ok(Message::Close(_)))) => return true,
            Ok(Some(Ok(_))) => continue,
        }
    }
}
