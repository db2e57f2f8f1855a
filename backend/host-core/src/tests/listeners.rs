// Unit tests for the UI-side listener registry.

use crate::bridge::ListenerRegistry;
use crate::channel::EventChannel;
use crate::events::EventFrame;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::{Value, json};

fn counter() -> (Arc<AtomicUsize>, Arc<dyn Fn(&Value) + Send + Sync>) {
    let count = Arc::new(AtomicUsize::new(0));
    let hits = count.clone();
    (
        count,
        Arc::new(move |_: &Value| {
            hits.fetch_add(1, Ordering::SeqCst);
        }),
    )
}

fn frame(channel: EventChannel) -> EventFrame {
    EventFrame {
        channel,
        payload: json!({}),
    }
}

/// **VALUE**: Unregistered ids and request ids get an inert handle.
///
/// **BUG THIS CATCHES**: Would catch a typo'd event name silently registering
/// a listener that can never fire.
#[test]
fn given_unknown_or_request_id_when_subscribed_then_inert_and_nothing_stored() {
    let registry = ListenerRegistry::new();
    let (_, listener) = counter();

    let unknown = registry.subscribe("event:network:changed", listener.clone());
    let request = registry.subscribe("network:status", listener);

    assert!(unknown.is_inert());
    assert!(request.is_inert());
    for channel in EventChannel::ALL {
        assert_eq!(registry.listener_count(channel), 0);
    }
}

#[test]
fn given_two_listeners_when_event_delivered_then_only_that_channel_fires() {
    let registry = ListenerRegistry::new();
    let (network_hits, network) = counter();
    let (log_hits, log) = counter();
    registry.subscribe("event:network:statusChanged", network);
    registry.subscribe("event:log:added", log);

    let delivered = registry.deliver(&frame(EventChannel::NetworkStatusChanged));

    assert_eq!(delivered, 1);
    assert_eq!(network_hits.load(Ordering::SeqCst), 1);
    assert_eq!(log_hits.load(Ordering::SeqCst), 0);
}

/// **VALUE**: `unsubscribe(id, None)` removes every listener for the id.
#[test]
fn given_several_listeners_when_unsubscribe_all_then_none_fire() {
    // GIVEN: Three listeners on one channel and one on another
    let registry = ListenerRegistry::new();
    let (hits, listener) = counter();
    for _ in 0..3 {
        registry.subscribe("event:update:statusChanged", listener.clone());
    }
    registry.subscribe("event:log:added", listener);

    // WHEN: Removing all update listeners
    let removed = registry.unsubscribe("event:update:statusChanged", None);

    // THEN: Update events reach nobody; log listener untouched
    assert_eq!(removed, 3);
    assert_eq!(registry.deliver(&frame(EventChannel::UpdateStatusChanged)), 0);
    assert_eq!(hits.load(Ordering::SeqCst), 0);
    assert_eq!(registry.listener_count(EventChannel::LogAdded), 1);
}

#[test]
fn given_subscription_when_unsubscribed_by_handle_then_only_it_is_removed() {
    let registry = ListenerRegistry::new();
    let (first_hits, first) = counter();
    let (second_hits, second) = counter();
    let subscription = registry.subscribe("event:auth:statusChanged", first);
    registry.subscribe("event:auth:statusChanged", second);

    assert!(subscription.unsubscribe());
    registry.deliver(&frame(EventChannel::AuthStatusChanged));

    assert_eq!(first_hits.load(Ordering::SeqCst), 0);
    assert_eq!(second_hits.load(Ordering::SeqCst), 1);
}

/// **VALUE**: A listener may unsubscribe itself while being delivered to.
///
/// **BUG THIS CATCHES**: Would catch delivery holding the registry lock while
/// invoking listeners, which deadlocks here.
#[test]
fn given_listener_that_unsubscribes_itself_when_delivered_then_no_deadlock() {
    let registry = ListenerRegistry::new();
    let inner = registry.clone();
    registry.subscribe(
        "event:log:added",
        Arc::new(move |_: &Value| {
            inner.unsubscribe("event:log:added", None);
        }),
    );

    assert_eq!(registry.deliver(&frame(EventChannel::LogAdded)), 1);
    assert_eq!(registry.listener_count(EventChannel::LogAdded), 0);
}
