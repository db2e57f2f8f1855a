//! Host-side event bus.
//!
//! Each [`EventChannel`] has its own `tokio::sync::broadcast` lane and a
//! single producer (the monitor, the update controller, the log store, the
//! auth handlers). A broadcast channel preserves send order, so per-channel
//! delivery order matches emission order for every subscriber, and a burst
//! on one lane cannot evict frames from another.
//!
//! State lanes (everything except `event:log:added`) also remember their
//! latest payload. A receiver that falls behind on a state lane skips the
//! stale frames and gets that latest payload instead.
//!
//! Nothing on the emit path logs: the log store itself emits
//! `event:log:added` from inside the logger.

use crate::channel::EventChannel;

use std::sync::{Arc, Mutex, PoisonError, Weak};

use futures_util::future::select_all;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

const EVENT_CHANNEL_SIZE: usize = 512;

/// Lanes are polled in this order; low-volume state lanes first so a log
/// flood never delays a status change.
const RECEIVE_ORDER: [EventChannel; 4] = [
    EventChannel::NetworkStatusChanged,
    EventChannel::UpdateStatusChanged,
    EventChannel::AuthStatusChanged,
    EventChannel::LogAdded,
];

/// An emitted event, already serialized to its wire payload.
#[derive(Debug, Clone, PartialEq)]
pub struct EventFrame {
    pub channel: EventChannel,
    pub payload: Value,
}

struct Lane {
    tx: broadcast::Sender<EventFrame>,
    latest: Mutex<Option<Value>>,
}

struct Lanes {
    lanes: [Lane; 4],
}

impl Lanes {
    fn get(&self, channel: EventChannel) -> &Lane {
        &self.lanes[channel.index()]
    }
}

#[derive(Clone)]
pub struct EventBus {
    inner: Arc<Lanes>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(EVENT_CHANNEL_SIZE)
    }

    /// `capacity` frames are buffered per channel.
    pub fn with_capacity(capacity: usize) -> Self {
        let lane = || Lane {
            tx: broadcast::channel(capacity).0,
            latest: Mutex::new(None),
        };
        Self {
            inner: Arc::new(Lanes {
                lanes: [lane(), lane(), lane(), lane()],
            }),
        }
    }

    /// Emit `payload` on `channel`.
    ///
    /// Returns the number of live subscribers that will see it. Having no
    /// subscribers is normal (no UI connected yet).
    pub fn emit<T: Serialize>(&self, channel: EventChannel, payload: &T) -> usize {
        let Ok(payload) = serde_json::to_value(payload) else {
            return 0;
        };
        self.publish(EventFrame { channel, payload })
    }

    /// Emit an already-serialized frame.
    pub fn publish(&self, frame: EventFrame) -> usize {
        let lane = self.inner.get(frame.channel);

        if !frame.channel.carries_state() {
            return lane.tx.send(frame).unwrap_or_default();
        }

        // Snapshot and send under one lock, so a lagging receiver that
        // resubscribes under the same lock misses nothing newer.
        let mut latest = lane.latest.lock().unwrap_or_else(PoisonError::into_inner);
        *latest = Some(frame.payload.clone());
        lane.tx.send(frame).unwrap_or_default()
    }

    /// Latest payload emitted on a state channel.
    pub fn latest(&self, channel: EventChannel) -> Option<Value> {
        if !channel.carries_state() {
            return None;
        }
        self.inner
            .get(channel)
            .latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Receive every event emitted from now on.
    pub fn subscribe(&self) -> EventReceiver {
        EventReceiver {
            bus: Arc::downgrade(&self.inner),
            lanes: RECEIVE_ORDER
                .into_iter()
                .map(|channel| (channel, self.inner.get(channel).tx.subscribe()))
                .collect(),
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// One subscriber's view of every event lane.
///
/// Holds the bus weakly: once every [`EventBus`] clone is dropped,
/// [`recv`](Self::recv) drains what is buffered and then returns `None`.
///
/// Frames lost to lag on `event:log:added` are skipped; the entries stay
/// readable through `log:get`.
pub struct EventReceiver {
    bus: Weak<Lanes>,
    lanes: Vec<(EventChannel, broadcast::Receiver<EventFrame>)>,
}

impl EventReceiver {
    /// Next frame from any lane. `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<EventFrame> {
        loop {
            if self.lanes.is_empty() {
                return None;
            }

            let (result, index) = {
                let (result, index, _rest) =
                    select_all(self.lanes.iter_mut().map(|(_, rx)| Box::pin(rx.recv()))).await;
                (result, index)
            };

            match result {
                Ok(frame) => return Some(frame),
                Err(RecvError::Lagged(_)) => {
                    if let Some(frame) = self.resync(index) {
                        return Some(frame);
                    }
                }
                Err(RecvError::Closed) => {
                    self.lanes.remove(index);
                }
            }
        }
    }

    /// Next frame that is already buffered, state lanes first.
    pub fn try_recv(&mut self) -> Option<EventFrame> {
        let mut index = 0;
        while index < self.lanes.len() {
            match self.lanes[index].1.try_recv() {
                Ok(frame) => return Some(frame),
                Err(TryRecvError::Lagged(_)) => {
                    if let Some(frame) = self.resync(index) {
                        return Some(frame);
                    }
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => index += 1,
            }
        }
        None
    }

    /// Recover a lagged state lane: resubscribe at the tail and hand back
    /// the latest payload. Log lanes just continue from the oldest
    /// retained frame.
    fn resync(&mut self, index: usize) -> Option<EventFrame> {
        let (channel, rx) = &mut self.lanes[index];
        let channel = *channel;
        if !channel.carries_state() {
            return None;
        }

        let bus = self.bus.upgrade()?;
        let lane = bus.get(channel);
        let latest = lane.latest.lock().unwrap_or_else(PoisonError::into_inner);
        *rx = lane.tx.subscribe();

        latest.clone().map(|payload| EventFrame { channel, payload })
    }
}
