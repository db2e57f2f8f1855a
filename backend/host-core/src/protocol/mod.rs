//! Wire protocol between the UI process and the host.
//!
//! Frames are binary protobuf messages. The message types are declared here
//! with `prost` derives instead of generated from `.proto` files, since the
//! envelope is small and the payloads themselves are JSON documents keyed by
//! channel id.
//!
//! ```text
//! UI                                   host
//!  │ IpcClientMessage{AuthHandshake}    │
//!  │ ─────────────────────────────────► │
//!  │ IpcServerMessage{AuthResponse}     │
//!  │ ◄───────────────────────────────── │
//!  │ IpcClientMessage{Invoke} (id = n)  │
//!  │ ─────────────────────────────────► │ dispatch
//!  │ IpcServerMessage{Response|Failure} │
//!  │ ◄───────────────────────────────── │ (id = n)
//!  │ IpcServerMessage{Event} (id = 0)   │
//!  │ ◄───────────────────────────────── │ event bus
//! ```

mod failure;

pub use failure::{Failure, FailureKind};

use crate::error::ipc::IpcError;

use prost::Message as ProstMessage;

/// Request id reserved for the authentication handshake.
pub const AUTH_REQUEST_ID: u64 = 1;

/// Request id carried by unsolicited frames (events, decode failures).
pub const UNSOLICITED_REQUEST_ID: u64 = 0;

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct IpcAuthHandshake {
    #[prost(string, tag = "1")]
    pub token: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct IpcAuthHandshakeResponse {
    #[prost(bool, tag = "1")]
    pub success: bool,
    #[prost(string, optional, tag = "2")]
    pub error: Option<String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct IpcInvoke {
    #[prost(string, tag = "1")]
    pub channel: String,
    #[prost(string, tag = "2")]
    pub payload_json: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct IpcResponse {
    #[prost(string, tag = "1")]
    pub payload_json: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct IpcFailure {
    #[prost(enumeration = "IpcFailureKind", tag = "1")]
    pub kind: i32,
    #[prost(string, tag = "2")]
    pub message: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct IpcEvent {
    #[prost(string, tag = "1")]
    pub channel: String,
    #[prost(string, tag = "2")]
    pub payload_json: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum IpcFailureKind {
    Unspecified = 0,
    UnknownChannel = 1,
    Busy = 2,
    IllegalTransition = 3,
    NotFound = 4,
    HandlerFault = 5,
    Timeout = 6,
}

/// Client → host.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct IpcClientMessage {
    #[prost(uint64, tag = "1")]
    pub request_id: u64,
    #[prost(oneof = "ipc_client_message::Payload", tags = "2, 3")]
    pub payload: Option<ipc_client_message::Payload>,
}

pub mod ipc_client_message {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Payload {
        #[prost(message, tag = "2")]
        AuthHandshake(super::IpcAuthHandshake),
        #[prost(message, tag = "3")]
        Invoke(super::IpcInvoke),
    }
}

/// Host → client.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct IpcServerMessage {
    #[prost(uint64, tag = "1")]
    pub request_id: u64,
    #[prost(oneof = "ipc_server_message::Payload", tags = "2, 3, 4, 5")]
    pub payload: Option<ipc_server_message::Payload>,
}

pub mod ipc_server_message {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Payload {
        #[prost(message, tag = "2")]
        AuthHandshakeResponse(super::IpcAuthHandshakeResponse),
        #[prost(message, tag = "3")]
        Response(super::IpcResponse),
        #[prost(message, tag = "4")]
        Failure(super::IpcFailure),
        #[prost(message, tag = "5")]
        Event(super::IpcEvent),
    }
}

impl IpcServerMessage {
    pub fn response(request_id: u64, payload_json: String) -> Self {
        Self {
            request_id,
            payload: Some(ipc_server_message::Payload::Response(IpcResponse {
                payload_json,
            })),
        }
    }

    pub fn failure(request_id: u64, failure: &Failure) -> Self {
        Self {
            request_id,
            payload: Some(ipc_server_message::Payload::Failure(IpcFailure {
                kind: IpcFailureKind::from(failure.kind) as i32,
                message: failure.message.clone(),
            })),
        }
    }

    pub fn event(channel: &str, payload_json: String) -> Self {
        Self {
            request_id: UNSOLICITED_REQUEST_ID,
            payload: Some(ipc_server_message::Payload::Event(IpcEvent {
                channel: channel.to_string(),
                payload_json,
            })),
        }
    }

    pub fn auth_response(success: bool, error: Option<&str>) -> Self {
        Self {
            request_id: AUTH_REQUEST_ID,
            payload: Some(ipc_server_message::Payload::AuthHandshakeResponse(
                IpcAuthHandshakeResponse {
                    success,
                    error: error.map(str::to_string),
                },
            )),
        }
    }
}

impl IpcFailure {
    /// Convert back into the boundary failure type, treating unknown codes
    /// from a newer host as handler faults.
    pub fn to_failure(&self) -> Failure {
        let kind = IpcFailureKind::try_from(self.kind).unwrap_or(IpcFailureKind::Unspecified);
        Failure::new(FailureKind::from(kind), self.message.clone())
    }
}

/// Encode any protocol message into a frame buffer.
#[track_caller]
pub fn encode<M: ProstMessage>(message: &M) -> Result<Vec<u8>, IpcError> {
    let mut buf = Vec::with_capacity(message.encoded_len());
    message.encode(&mut buf)?;
    Ok(buf)
}

#[track_caller]
pub fn decode<M: ProstMessage + Default>(bytes: &[u8]) -> Result<M, IpcError> {
    Ok(M::decode(bytes)?)
}
