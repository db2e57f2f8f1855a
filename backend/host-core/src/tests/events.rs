// Unit tests for the per-channel event bus.

use crate::channel::EventChannel;
use crate::events::{EventBus, EventFrame};

use std::time::Duration;

use serde_json::{Value, json};

/// **VALUE**: A log burst cannot push a status change out of the buffer.
///
/// **WHY THIS MATTERS**: Every log record is an event. With one shared
/// buffer, a burst of debug lines evicted the network and update frames and
/// the UI stayed on a stale state.
///
/// **BUG THIS CATCHES**: Would catch event channels sharing a buffer again.
#[test]
fn given_state_event_then_log_flood_when_drained_then_state_event_survives() {
    // GIVEN: A small bus and a subscriber
    let bus = EventBus::with_capacity(8);
    let mut rx = bus.subscribe();

    // WHEN: One status change is followed by far more log lines than fit
    bus.emit(EventChannel::NetworkStatusChanged, &json!({ "connectivity": "online" }));
    for i in 0..100 {
        bus.emit(EventChannel::LogAdded, &json!({ "seq": i }));
    }

    // THEN: The status change is delivered, and logs resume from the retained tail
    let first = rx.try_recv().unwrap();
    assert_eq!(first.channel, EventChannel::NetworkStatusChanged);
    let logs: Vec<Value> = std::iter::from_fn(|| rx.try_recv())
        .map(|frame| frame.payload["seq"].clone())
        .collect();
    assert_eq!(logs.first(), Some(&json!(92)));
    assert_eq!(logs.last(), Some(&json!(99)));
}

/// **VALUE**: A subscriber that falls behind on a state channel still ends
/// on the latest state.
///
/// **BUG THIS CATCHES**: Would catch a lagged receiver skipping straight to
/// the next future event, leaving the UI on whatever it saw last.
#[test]
fn given_lagged_state_lane_when_received_then_latest_snapshot_delivered_once() {
    // GIVEN: A subscriber that does not read while 20 states are emitted
    let bus = EventBus::with_capacity(4);
    let mut rx = bus.subscribe();
    for progress in 0..20 {
        bus.emit(EventChannel::UpdateStatusChanged, &json!({ "progress": progress }));
    }

    // WHEN: It finally reads
    let frame = rx.try_recv().unwrap();

    // THEN: It gets the newest state, and nothing stale after it
    assert_eq!(frame.payload, json!({ "progress": 19 }));
    assert_eq!(rx.try_recv(), None);
    assert_eq!(bus.latest(EventChannel::UpdateStatusChanged), Some(json!({ "progress": 19 })));

    // AND: Later events arrive normally
    bus.emit(EventChannel::UpdateStatusChanged, &json!({ "progress": 20 }));
    assert_eq!(rx.try_recv().unwrap().payload, json!({ "progress": 20 }));
}

#[test]
fn given_log_channel_when_latest_requested_then_none() {
    let bus = EventBus::new();
    bus.emit(EventChannel::LogAdded, &json!({ "seq": 1 }));

    assert_eq!(bus.latest(EventChannel::LogAdded), None);
}

#[test]
fn given_two_channels_when_interleaved_then_each_keeps_emission_order() {
    let bus = EventBus::new();
    let mut rx = bus.subscribe();

    for i in 0..3 {
        bus.emit(EventChannel::AuthStatusChanged, &json!({ "n": i }));
        bus.emit(EventChannel::LogAdded, &json!({ "n": i }));
    }

    let frames: Vec<EventFrame> = std::iter::from_fn(|| rx.try_recv()).collect();
    for channel in [EventChannel::AuthStatusChanged, EventChannel::LogAdded] {
        let order: Vec<Value> = frames
            .iter()
            .filter(|frame| frame.channel == channel)
            .map(|frame| frame.payload["n"].clone())
            .collect();
        assert_eq!(order, vec![json!(0), json!(1), json!(2)], "{channel}");
    }
}

#[tokio::test]
async fn given_bus_dropped_when_received_then_buffered_frames_then_none() {
    let bus = EventBus::new();
    let mut rx = bus.subscribe();
    bus.emit(EventChannel::NetworkStatusChanged, &json!({ "connectivity": "offline" }));
    drop(bus);

    let frame = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await.unwrap();
    let end = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await.unwrap();

    assert_eq!(frame.map(|f| f.channel), Some(EventChannel::NetworkStatusChanged));
    assert_eq!(end, None);
}
