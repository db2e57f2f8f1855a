// Unit tests for the request dispatcher.
// Fail-closed routing, resource exclusion, panic containment.

use crate::channel::RequestChannel;
use crate::dispatch::{Dispatcher, HandlerResult, Resource};
use crate::error::DispatchError;
use crate::error::HandlerError;
use crate::protocol::FailureKind;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::{Value, json};
use tokio::sync::Notify;

fn echo(payload: Value) -> impl Future<Output = HandlerResult> {
    async move { Ok(payload) }
}

/// **VALUE**: Unknown and event ids never reach a handler.
///
/// **WHY THIS MATTERS**: The UI side is untrusted; an unknown id must fail
/// closed rather than fall through to some default route.
#[tokio::test]
async fn given_unknown_or_event_id_when_dispatched_then_unknown_channel() {
    // GIVEN: A dispatcher with a counting handler on every channel we try
    let calls = Arc::new(AtomicUsize::new(0));
    let mut builder = Dispatcher::builder();
    let counter = calls.clone();
    builder
        .register(RequestChannel::AccountList, move |_payload: Value| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok(json!([])) }
        })
        .unwrap();
    let dispatcher = builder.build();

    // WHEN: Dispatching ids that are not request channels
    let unknown = dispatcher.dispatch("account:delete", Value::Null).await;
    let event = dispatcher.dispatch("event:log:added", Value::Null).await;

    // THEN: Both fail closed and the handler never ran
    assert_eq!(unknown.unwrap_err().kind, FailureKind::UnknownChannel);
    assert_eq!(event.unwrap_err().kind, FailureKind::UnknownChannel);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn given_duplicate_registration_when_registering_then_error() {
    let mut builder = Dispatcher::builder();
    builder.register(RequestChannel::AppVersion, echo).unwrap();

    let result = builder.register(RequestChannel::AppVersion, echo);

    assert!(matches!(result, Err(DispatchError::DuplicateHandler { .. })));
}

#[test]
fn given_missing_handlers_when_build_complete_then_lists_them() {
    let mut builder = Dispatcher::builder();
    builder.register(RequestChannel::AppVersion, echo).unwrap();

    let Err(DispatchError::MissingHandlers { channels, .. }) = builder.build_complete() else {
        panic!("expected MissingHandlers");
    };

    assert_eq!(channels.len(), RequestChannel::ALL.len() - 1);
    assert!(!channels.contains(&RequestChannel::AppVersion));
}

/// **VALUE**: A second mutation on a held resource is rejected, not queued.
///
/// **BUG THIS CATCHES**: Would catch two `account:switch` calls interleaving
/// and leaving the account list with zero or two current accounts.
#[tokio::test]
async fn given_resource_held_when_second_mutation_then_busy() {
    // GIVEN: Two exclusive routes on the same resource, the first parked
    let gate = Arc::new(Notify::new());
    let entered = Arc::new(Notify::new());
    let mut builder = Dispatcher::builder();
    let (parked_gate, parked_entered) = (gate.clone(), entered.clone());
    builder
        .register_exclusive(RequestChannel::AccountSwitch, Resource::Account, move |_p: Value| {
            let gate = parked_gate.clone();
            let entered = parked_entered.clone();
            async move {
                entered.notify_one();
                gate.notified().await;
                Ok(json!("switched"))
            }
        })
        .unwrap()
        .register_exclusive(RequestChannel::AccountAdd, Resource::Account, echo)
        .unwrap()
        .register_exclusive(RequestChannel::WifiAdd, Resource::WifiProfiles, echo)
        .unwrap();
    let dispatcher = builder.build();

    let first = tokio::spawn({
        let dispatcher = dispatcher.clone();
        async move { dispatcher.dispatch("account:switch", Value::Null).await }
    });
    entered.notified().await;

    // WHEN: Another Account mutation and an unrelated WiFi mutation arrive
    let blocked = dispatcher.dispatch("account:add", json!({})).await;
    let unrelated = dispatcher.dispatch("wifi:add", json!({"ssid": "x"})).await;

    // THEN: Only the same-resource call is Busy
    assert_eq!(blocked.unwrap_err().kind, FailureKind::Busy);
    assert_eq!(unrelated.unwrap(), json!({"ssid": "x"}));

    // AND: The resource frees up once the first call finishes
    gate.notify_one();
    assert_eq!(first.await.unwrap().unwrap(), json!("switched"));
    assert!(!dispatcher.locks().is_held(Resource::Account));
    assert!(dispatcher.dispatch("account:add", json!(1)).await.is_ok());
}

/// **VALUE**: A panicking handler becomes a HandlerFault and releases its lock.
///
/// **BUG THIS CATCHES**: Would catch a panic poisoning the resource so every
/// later mutation reports Busy forever.
#[tokio::test]
async fn given_panicking_handler_when_dispatched_then_handler_fault_and_lock_released() {
    let mut builder = Dispatcher::builder();
    builder
        .register_exclusive(RequestChannel::ConfigSet, Resource::Settings, |_p: Value| async {
            if true {
                panic!("handler bug");
            }
            Ok(Value::Null)
        })
        .unwrap();
    let dispatcher = builder.build();

    let result = dispatcher.dispatch("config:set", Value::Null).await;

    assert_eq!(result.unwrap_err().kind, FailureKind::HandlerFault);
    assert!(!dispatcher.locks().is_held(Resource::Settings));
}

#[tokio::test]
async fn given_handler_errors_when_dispatched_then_shaped_into_failures() {
    let mut builder = Dispatcher::builder();
    builder
        .register(RequestChannel::AccountSwitch, |_p: Value| async {
            Err(HandlerError::not_found("Account a1 not found"))
        })
        .unwrap()
        .register(RequestChannel::UpdateInstall, |_p: Value| async {
            Err(HandlerError::illegal_transition("Cannot install an update while Idle"))
        })
        .unwrap()
        .register(RequestChannel::AuthLogin, |_p: Value| async {
            Err(HandlerError::internal("db password is hunter2"))
        })
        .unwrap();
    let dispatcher = builder.build();

    let not_found = dispatcher.dispatch("account:switch", Value::Null).await.unwrap_err();
    let illegal = dispatcher.dispatch("update:install", Value::Null).await.unwrap_err();
    let internal = dispatcher.dispatch("auth:login", Value::Null).await.unwrap_err();

    assert_eq!(not_found.kind, FailureKind::NotFound);
    assert_eq!(illegal.kind, FailureKind::IllegalTransition);
    assert_eq!(internal.kind, FailureKind::HandlerFault);
    assert!(!internal.message.contains("hunter2"));
}

#[tokio::test]
async fn given_registered_channel_without_handler_when_dispatched_then_handler_fault() {
    let dispatcher = Dispatcher::builder().build();

    let result = dispatcher.dispatch("app:version", Value::Null).await;

    assert_eq!(result.unwrap_err().kind, FailureKind::HandlerFault);
}
