// Bridge tests over the in-process transport.

use super::support::{FakeUpdateSource, host_with, local_host};
use crate::bridge::{AccountChanges, NewWifiProfile, WifiProfileChanges};
use crate::channel::EventChannel;
use crate::host::HostServices;
use crate::model::{Connectivity, LogLevel, NetworkStatus, now_millis};
use crate::protocol::FailureKind;

use common::RedactedSecret;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::{Notify, mpsc};

/// **VALUE**: Ids that are not registered request channels fail before transport.
///
/// **BUG THIS CATCHES**: Would catch the bridge forwarding arbitrary strings
/// (including event ids) to the host.
#[tokio::test]
async fn given_unregistered_id_when_invoked_then_unknown_channel() {
    let host = local_host();
    let bridge = host.local_bridge();

    let unknown = bridge.invoke("shell:exec", Value::Null).await.unwrap_err();
    let event = bridge.invoke("event:log:added", Value::Null).await.unwrap_err();

    assert_eq!(unknown.kind, FailureKind::UnknownChannel);
    assert_eq!(event.kind, FailureKind::UnknownChannel);
}

#[tokio::test]
async fn given_typed_namespaces_when_used_then_round_trip_through_host() {
    // GIVEN: A local bridge
    let host = local_host();
    let bridge = host.local_bridge();

    // WHEN: Adding two accounts, renaming one and switching to it
    let password = RedactedSecret::new("pw");
    let home = bridge.account().add("Home", "alice", &password).await.unwrap();
    let work = bridge.account().add("Work", "bob", &password).await.unwrap();
    let renamed = bridge
        .account()
        .update(&AccountChanges {
            id: &work.id,
            label: Some("Office"),
            ..AccountChanges::default()
        })
        .await
        .unwrap();
    let switched = bridge.account().switch(&work.id).await.unwrap();

    // THEN: The typed results reflect the host state
    assert!(home.is_current);
    assert_eq!(renamed.label, "Office");
    assert!(switched.is_current);
    assert_eq!(bridge.account().get_current().await.unwrap().unwrap().id, work.id);
    assert_eq!(bridge.account().list().await.unwrap().len(), 2);
    assert_eq!(bridge.app().version().await.unwrap(), crate::APP_VERSION);
}

#[tokio::test]
async fn given_wifi_profile_when_priority_cleared_through_bridge_then_absent() {
    let host = local_host();
    let bridge = host.local_bridge();

    let profile = bridge
        .wifi()
        .add(&NewWifiProfile {
            ssid: "home",
            password: "wpa",
            priority: Some(2),
        })
        .await
        .unwrap();
    let cleared = bridge
        .wifi()
        .update(&WifiProfileChanges {
            id: &profile.id,
            priority: Some(None),
            ..WifiProfileChanges::default()
        })
        .await
        .unwrap();

    assert_eq!(profile.priority, Some(2));
    assert_eq!(cleared.priority, None);
    assert_eq!(cleared.ssid, "home");
}

#[tokio::test]
async fn given_missing_account_when_switched_through_bridge_then_not_found() {
    let host = local_host();
    let bridge = host.local_bridge();

    let failure = bridge.account().switch("nope").await.unwrap_err();

    assert_eq!(failure.kind, FailureKind::NotFound);
}

/// **VALUE**: Host events reach UI listeners, typed and in emission order.
///
/// **WHY THIS MATTERS**: The status bar is driven entirely by
/// `event:network:statusChanged`; out-of-order delivery shows a stale state.
#[tokio::test]
async fn given_listener_when_host_emits_then_delivered_in_order() {
    // GIVEN: A typed listener forwarding into a channel
    let host = local_host();
    let bridge = host.local_bridge();
    let (tx, mut rx) = mpsc::unbounded_channel();
    bridge.on(
        EventChannel::NetworkStatusChanged,
        move |status: NetworkStatus| {
            let _ = tx.send(status.connectivity);
        },
    );

    // WHEN: The monitor observes three changes
    for connectivity in [Connectivity::Online, Connectivity::Offline, Connectivity::Online] {
        host.monitor().observe(NetworkStatus {
            connectivity,
            ssid: None,
            signal_quality: None,
            timestamp: now_millis(),
        });
    }

    // THEN: The listener saw all three, in order
    let mut seen = Vec::new();
    for _ in 0..3 {
        let next = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await.unwrap();
        seen.push(next.unwrap());
    }
    assert_eq!(
        seen,
        vec![Connectivity::Online, Connectivity::Offline, Connectivity::Online]
    );
}

/// **VALUE**: A status change reaches the UI even when a log burst lands
/// before the listener pump gets to run.
///
/// **BUG THIS CATCHES**: Would catch `event:log:added` traffic evicting
/// `event:network:statusChanged` frames from a shared buffer.
#[tokio::test]
async fn given_status_change_then_log_burst_when_pump_runs_then_listener_still_sees_status() {
    // GIVEN: A network listener on a local bridge
    let host = local_host();
    let bridge = host.local_bridge();
    let (tx, mut rx) = mpsc::unbounded_channel();
    bridge.on(
        EventChannel::NetworkStatusChanged,
        move |status: NetworkStatus| {
            let _ = tx.send(status.ssid);
        },
    );

    // WHEN: A change is observed and 600 log lines follow without yielding
    host.monitor().observe(NetworkStatus {
        connectivity: Connectivity::Online,
        ssid: Some("a".into()),
        signal_quality: None,
        timestamp: now_millis(),
    });
    for i in 0..600 {
        host.logs().push(LogLevel::Debug, "netgate", format!("burst {i}"));
    }

    // THEN: The listener still receives the status
    let seen = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await.unwrap();
    assert_eq!(seen, Some(Some("a".to_string())));
}

#[tokio::test]
async fn given_unsubscribe_all_when_host_emits_then_listener_silent() {
    let host = local_host();
    let bridge = host.local_bridge();
    let hits = Arc::new(Mutex::new(0));
    let counter = hits.clone();
    bridge.subscribe("event:log:added", move |_| *counter.lock().unwrap() += 1);

    let removed = bridge.unsubscribe("event:log:added", None);
    host.logs().push(LogLevel::Info, "netgate", "after".into());
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(removed, 1);
    assert_eq!(*hits.lock().unwrap(), 0);
}

/// **VALUE**: Calls outliving the deadline fail with Timeout.
#[tokio::test]
async fn given_tiny_timeout_when_slow_call_then_timeout_failure() {
    // GIVEN: An update check parked forever
    let host = host_with(HostServices {
        updates: Arc::new(FakeUpdateSource {
            check_gate: Some(Arc::new(Notify::new())),
            ..FakeUpdateSource::default()
        }),
        ..HostServices::local()
    });
    let bridge = host.local_bridge().with_timeout(Duration::from_millis(50));

    // WHEN: Checking
    let failure = bridge.update().check().await.unwrap_err();

    // THEN: The bridge gave up
    assert_eq!(failure.kind, FailureKind::Timeout);
}
