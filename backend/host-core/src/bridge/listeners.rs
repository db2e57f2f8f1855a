//! UI-side listener registry.
//!
//! Listeners are keyed by [`EventChannel`]. Subscribing by an id that is not
//! a registered event channel returns an inert [`Subscription`] and stores
//! nothing. `unsubscribe(id, None)` removes every listener for the id.

use crate::channel::{self, EventChannel};
use crate::events::EventFrame;

use std::collections::HashMap;
use std::fmt::{Debug, Formatter, Result as FormatResult};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use log::warn;
use serde_json::Value;

/// A listener callback. Receives the event payload.
pub type Listener = Arc<dyn Fn(&Value) + Send + Sync>;

/// Identifies one registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type ListenerMap = HashMap<EventChannel, Vec<(ListenerId, Listener)>>;

struct Registry {
    listeners: Mutex<ListenerMap>,
    next_id: AtomicU64,
}

#[derive(Clone)]
pub struct ListenerRegistry {
    inner: Arc<Registry>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Registry {
                listeners: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Register `listener` for `event_id`.
    pub fn subscribe(&self, event_id: &str, listener: Listener) -> Subscription {
        let Some(channel) = channel::event_channel(event_id) else {
            warn!("Ignoring subscription to unregistered event channel {event_id:?}");
            return Subscription::inert();
        };

        let id = ListenerId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let Ok(mut listeners) = self.inner.listeners.lock() else {
            return Subscription::inert();
        };
        listeners.entry(channel).or_default().push((id, listener));

        Subscription {
            target: Some((channel, id)),
            registry: Arc::downgrade(&self.inner),
        }
    }

    /// Remove one listener, or all listeners of `event_id` when `listener`
    /// is `None`. Returns how many were removed. Unknown ids remove nothing.
    pub fn unsubscribe(&self, event_id: &str, listener: Option<ListenerId>) -> usize {
        match channel::event_channel(event_id) {
            Some(channel) => remove(&self.inner, channel, listener),
            None => 0,
        }
    }

    /// Invoke every listener registered for the frame's channel.
    ///
    /// The listener list is copied before invoking, so a listener may
    /// subscribe or unsubscribe without deadlocking.
    pub fn deliver(&self, frame: &EventFrame) -> usize {
        let targets: Vec<Listener> = match self.inner.listeners.lock() {
            Ok(listeners) => listeners
                .get(&frame.channel)
                .map(|entries| entries.iter().map(|(_, l)| Arc::clone(l)).collect())
                .unwrap_or_default(),
            Err(_) => return 0,
        };

        for listener in &targets {
            listener(&frame.payload);
        }
        targets.len()
    }

    pub fn listener_count(&self, channel: EventChannel) -> usize {
        self.inner
            .listeners
            .lock()
            .map(|listeners| listeners.get(&channel).map_or(0, Vec::len))
            .unwrap_or_default()
    }
}

impl Default for ListenerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn remove(registry: &Registry, channel: EventChannel, listener: Option<ListenerId>) -> usize {
    let Ok(mut listeners) = registry.listeners.lock() else {
        return 0;
    };

    match listener {
        None => listeners.remove(&channel).map_or(0, |entries| entries.len()),
        Some(id) => {
            let Some(entries) = listeners.get_mut(&channel) else {
                return 0;
            };
            let before = entries.len();
            entries.retain(|(entry_id, _)| *entry_id != id);
            let removed = before - entries.len();
            if entries.is_empty() {
                listeners.remove(&channel);
            }
            removed
        }
    }
}

/// Handle returned by `subscribe`.
///
/// Dropping it leaves the listener registered; call
/// [`unsubscribe`](Self::unsubscribe) to remove it. An inert handle (from an
/// unregistered id) does nothing.
pub struct Subscription {
    target: Option<(EventChannel, ListenerId)>,
    registry: Weak<Registry>,
}

impl Subscription {
    fn inert() -> Self {
        Self {
            target: None,
            registry: Weak::new(),
        }
    }

    pub fn is_inert(&self) -> bool {
        self.target.is_none()
    }

    pub fn id(&self) -> Option<ListenerId> {
        self.target.map(|(_, id)| id)
    }

    pub fn channel(&self) -> Option<EventChannel> {
        self.target.map(|(channel, _)| channel)
    }

    /// Remove this listener. Returns whether it was still registered.
    pub fn unsubscribe(self) -> bool {
        match (self.target, self.registry.upgrade()) {
            (Some((channel, id)), Some(registry)) => remove(&registry, channel, Some(id)) > 0,
            _ => false,
        }
    }
}

impl Debug for Subscription {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        formatter
            .debug_struct("Subscription")
            .field("target", &self.target)
            .finish()
    }
}
