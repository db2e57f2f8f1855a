//! Channel registry.
//!
//! The registry is the process-wide, immutable table of every channel id the
//! host and UI agree on. It is built once from [`RequestChannel::ALL`] and
//! [`EventChannel::ALL`] on first access and never mutated afterwards.
//!
//! Every id that arrives as a string (from the IPC socket or from UI code
//! subscribing by name) is resolved here before anything else happens:
//!
//! - dispatch of an unknown id fails closed with `UnknownChannel`
//! - subscription to an unknown id yields an inert handle

mod ids;

pub use ids::{EventChannel, RequestChannel};

use std::collections::HashMap;
use std::sync::LazyLock;

use serde::Serialize;

/// Kind of a channel id as seen by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ChannelKind {
    Request,
    Event,
    Unknown,
}

/// A resolved, registered channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Request(RequestChannel),
    Event(EventChannel),
}

impl Channel {
    pub const fn id(self) -> &'static str {
        match self {
            Channel::Request(channel) => channel.as_str(),
            Channel::Event(channel) => channel.as_str(),
        }
    }

    pub const fn kind(self) -> ChannelKind {
        match self {
            Channel::Request(_) => ChannelKind::Request,
            Channel::Event(_) => ChannelKind::Event,
        }
    }
}

/// Registry row exposed for diagnostics and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChannelDescriptor {
    pub id: &'static str,
    pub kind: ChannelKind,
}

static REGISTRY: LazyLock<HashMap<&'static str, Channel>> = LazyLock::new(build_registry);

fn build_registry() -> HashMap<&'static str, Channel> {
    let requests = RequestChannel::ALL.into_iter().map(Channel::Request);
    let events = EventChannel::ALL.into_iter().map(Channel::Event);

    requests
        .chain(events)
        .map(|channel| (channel.id(), channel))
        .collect()
}

/// Resolve a runtime id to a registered channel.
pub fn lookup(id: &str) -> Option<Channel> {
    REGISTRY.get(id).copied()
}

pub fn kind_of(id: &str) -> ChannelKind {
    lookup(id).map_or(ChannelKind::Unknown, Channel::kind)
}

pub fn is_valid_event_channel(id: &str) -> bool {
    matches!(lookup(id), Some(Channel::Event(_)))
}

pub fn request_channel(id: &str) -> Option<RequestChannel> {
    match lookup(id) {
        Some(Channel::Request(channel)) => Some(channel),
        _ => None,
    }
}

pub fn event_channel(id: &str) -> Option<EventChannel> {
    match lookup(id) {
        Some(Channel::Event(channel)) => Some(channel),
        _ => None,
    }
}

/// All registered channels, sorted by id.
pub fn descriptors() -> Vec<ChannelDescriptor> {
    let mut descriptors: Vec<_> = REGISTRY
        .values()
        .map(|channel| ChannelDescriptor {
            id: channel.id(),
            kind: channel.kind(),
        })
        .collect();
    descriptors.sort_by_key(|descriptor| descriptor.id);
    descriptors
}
