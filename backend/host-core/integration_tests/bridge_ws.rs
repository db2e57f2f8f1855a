use crate::ipc_tests::helpers::{TEST_AUTH_TOKEN, start_test_host};

use host_core::bridge::{Bridge, WsTransport};
use host_core::channel::EventChannel;
use host_core::error::BridgeError;
use host_core::model::{Connectivity, NetworkStatus, now_millis};
use host_core::protocol::FailureKind;

use common::RedactedSecret;

use std::time::Duration;

use tokio::sync::mpsc;

/// **VALUE**: The Bridge over WebSocket behaves like the in-process one.
///
/// **WHY THIS MATTERS**: The UI is written once against the Bridge; if the
/// IPC transport shapes results or failures differently, UI code breaks only
/// in the packaged build.
///
/// **BUG THIS CATCHES**: Would catch request-id mixups in the pending table,
/// or failures arriving as transport errors instead of typed Failures.
#[tokio::test]
async fn given_ws_bridge_when_calling_host_then_results_and_failures_typed() {
    // GIVEN: A host served over IPC and a connected Bridge
    let (_host, handle) = start_test_host().await;
    let transport = WsTransport::connect(handle.port(), TEST_AUTH_TOKEN)
        .await
        .expect("Bridge should connect");
    let bridge = Bridge::new(transport);

    // WHEN: Making a successful call and two failing ones concurrently
    let password = RedactedSecret::new("pw");
    let (account_a, account_b) = (bridge.account(), bridge.account());
    let (added, missing, unknown) = tokio::join!(
        account_a.add("Home", "alice", &password),
        account_b.switch("no-such-account"),
        bridge.invoke("account:purge", serde_json::Value::Null),
    );

    // THEN: Each call got its own answer
    let added = added.unwrap();
    assert!(added.is_current);
    assert_eq!(missing.unwrap_err().kind, FailureKind::NotFound);
    assert_eq!(unknown.unwrap_err().kind, FailureKind::UnknownChannel);
    assert_eq!(bridge.account().list().await.unwrap(), vec![added]);
}

#[tokio::test]
async fn given_ws_bridge_when_host_emits_then_listener_receives_payload() {
    let (host, handle) = start_test_host().await;
    let bridge = Bridge::new(WsTransport::connect(handle.port(), TEST_AUTH_TOKEN).await.unwrap());
    let (tx, mut rx) = mpsc::unbounded_channel();
    bridge.on(EventChannel::NetworkStatusChanged, move |status: NetworkStatus| {
        let _ = tx.send(status);
    });

    host.monitor().observe(NetworkStatus {
        connectivity: Connectivity::Offline,
        ssid: None,
        signal_quality: None,
        timestamp: now_millis(),
    });

    let status = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(status.connectivity, Connectivity::Offline);
}

#[tokio::test]
async fn given_wrong_token_when_connecting_then_auth_error() {
    let (_host, handle) = start_test_host().await;

    let result = WsTransport::connect(handle.port(), "wrong").await;

    assert!(matches!(result, Err(BridgeError::Auth { .. })));
}

/// **VALUE**: Pending calls fail cleanly when the host goes away.
///
/// **BUG THIS CATCHES**: Would catch callers hanging forever on a reply that
/// can no longer arrive.
#[tokio::test]
async fn given_server_shut_down_when_calling_then_failure_not_hang() {
    // GIVEN: A connected Bridge
    let (_host, handle) = start_test_host().await;
    let bridge = Bridge::new(WsTransport::connect(handle.port(), TEST_AUTH_TOKEN).await.unwrap())
        .with_timeout(Duration::from_secs(5));

    // WHEN: The server stops
    handle.shutdown().await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    // THEN: Calls fail with a Failure
    let failure = bridge.app().version().await.unwrap_err();
    assert!(matches!(failure.kind, FailureKind::HandlerFault | FailureKind::Timeout));
}
