use crate::ipc_tests::helpers::{
    TEST_AUTH_TOKEN, authenticate, connect_to_server, is_connection_closed, receive_protobuf,
    receive_reply, send_invoke, start_test_host,
};

use host_core::channel::EventChannel;
use host_core::model::{Connectivity, NetworkStatus, now_millis};
use host_core::protocol::{IpcFailureKind, IpcServerMessage, ipc_server_message};

use serde_json::{Value, json};

/// **VALUE**: Verifies the handshake gate in both directions.
///
/// **WHY THIS MATTERS**: Any local process can open a loopback socket. The
/// token is the only thing stopping it from driving the host.
///
/// **BUG THIS CATCHES**: Would catch a wrong token being accepted, or the
/// server leaving a rejected connection open.
#[tokio::test]
async fn given_wrong_token_when_authenticating_then_rejected_and_closed() {
    // GIVEN: A running server
    let (_host, handle) = start_test_host().await;
    let mut ws = connect_to_server(handle.port()).await;

    // WHEN: Authenticating with the wrong token
    let response = authenticate(&mut ws, "not-the-token").await;

    // THEN: Rejected and disconnected
    assert!(!response.success);
    assert!(response.error.is_some());
    assert!(is_connection_closed(&mut ws).await);
}

#[tokio::test]
async fn given_correct_token_when_authenticating_then_accepted() {
    let (_host, handle) = start_test_host().await;
    let mut ws = connect_to_server(handle.port()).await;

    let response = authenticate(&mut ws, TEST_AUTH_TOKEN).await;

    assert!(response.success);
    assert_eq!(handle.auth_token(), TEST_AUTH_TOKEN);
}

/// **VALUE**: An invoke before the handshake is not dispatched.
#[tokio::test]
async fn given_unauthenticated_when_invoking_then_connection_closed() {
    let (host, handle) = start_test_host().await;
    let mut ws = connect_to_server(handle.port()).await;

    send_invoke(&mut ws, 2, "app:quit", "").await;

    assert!(is_connection_closed(&mut ws).await);
    assert!(!host.shutdown_token().is_cancelled());
}

/// **VALUE**: Request/response correlation by request id.
///
/// **BUG THIS CATCHES**: Would catch replies carrying the wrong id, which
/// would resolve the wrong pending promise on the UI side.
#[tokio::test]
async fn given_authenticated_when_invoking_then_response_matches_request_id() {
    // GIVEN: An authenticated client
    let (_host, handle) = start_test_host().await;
    let mut ws = connect_to_server(handle.port()).await;
    assert!(authenticate(&mut ws, TEST_AUTH_TOKEN).await.success);

    // WHEN: Invoking app:version
    send_invoke(&mut ws, 7, "app:version", "").await;

    // THEN: A JSON response with the same id
    let reply = receive_reply(&mut ws).await;
    assert_eq!(reply.request_id, 7);
    let Some(ipc_server_message::Payload::Response(response)) = reply.payload else {
        panic!("expected a response");
    };
    let value: Value = serde_json::from_str(&response.payload_json).unwrap();
    assert_eq!(value, json!({ "version": host_core::APP_VERSION }));
}

#[tokio::test]
async fn given_unknown_channel_when_invoking_then_unknown_channel_failure() {
    let (_host, handle) = start_test_host().await;
    let mut ws = connect_to_server(handle.port()).await;
    assert!(authenticate(&mut ws, TEST_AUTH_TOKEN).await.success);

    send_invoke(&mut ws, 3, "system:reboot", "{}").await;

    let reply = receive_reply(&mut ws).await;
    assert_eq!(reply.request_id, 3);
    let Some(ipc_server_message::Payload::Failure(failure)) = reply.payload else {
        panic!("expected a failure");
    };
    assert_eq!(failure.kind, IpcFailureKind::UnknownChannel as i32);
}

#[tokio::test]
async fn given_malformed_json_payload_when_invoking_then_handler_fault() {
    let (_host, handle) = start_test_host().await;
    let mut ws = connect_to_server(handle.port()).await;
    assert!(authenticate(&mut ws, TEST_AUTH_TOKEN).await.success);

    send_invoke(&mut ws, 4, "account:switch", "{not json").await;

    let reply = receive_reply(&mut ws).await;
    let Some(ipc_server_message::Payload::Failure(failure)) = reply.payload else {
        panic!("expected a failure");
    };
    assert_eq!(failure.kind, IpcFailureKind::HandlerFault as i32);
}

/// **VALUE**: Host events are pushed to authenticated clients.
///
/// **BUG THIS CATCHES**: Would catch the event forwarder subscribing after
/// the handshake reply, losing events emitted in between.
#[tokio::test]
async fn given_authenticated_when_host_emits_then_event_frame_received() {
    // GIVEN: An authenticated client
    let (host, handle) = start_test_host().await;
    let mut ws = connect_to_server(handle.port()).await;
    assert!(authenticate(&mut ws, TEST_AUTH_TOKEN).await.success);

    // WHEN: The monitor reports a change
    host.monitor().observe(NetworkStatus {
        connectivity: Connectivity::Online,
        ssid: Some("home".into()),
        signal_quality: None,
        timestamp: now_millis(),
    });

    // THEN: The client receives it as an unsolicited event frame
    let frame: IpcServerMessage = receive_protobuf(&mut ws).await;
    assert_eq!(frame.request_id, 0);
    let Some(ipc_server_message::Payload::Event(event)) = frame.payload else {
        panic!("expected an event");
    };
    assert_eq!(event.channel, EventChannel::NetworkStatusChanged.as_str());
    let payload: Value = serde_json::from_str(&event.payload_json).unwrap();
    assert_eq!(payload["ssid"], "home");
}

#[tokio::test]
async fn given_running_server_when_shut_down_then_clients_disconnected() {
    let (_host, handle) = start_test_host().await;
    let mut ws = connect_to_server(handle.port()).await;
    assert!(authenticate(&mut ws, TEST_AUTH_TOKEN).await.success);

    handle.shutdown().await;

    assert!(is_connection_closed(&mut ws).await);
}
