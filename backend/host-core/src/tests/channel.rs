// Unit tests for the channel registry.

use crate::channel::{self, ChannelKind, EventChannel, RequestChannel};

use std::collections::HashSet;

/// **VALUE**: Every id is unique and resolves back to itself.
///
/// **BUG THIS CATCHES**: Would catch a copy-paste id (two enum variants
/// mapping to the same string) that silently shadows a route.
#[test]
fn given_all_channels_when_registered_then_ids_unique_and_resolvable() {
    // GIVEN: Every request and event channel
    let ids: Vec<&str> = RequestChannel::ALL
        .iter()
        .map(|c| c.as_str())
        .chain(EventChannel::ALL.iter().map(|c| c.as_str()))
        .collect();

    // WHEN: Collected into a set
    let unique: HashSet<&str> = ids.iter().copied().collect();

    // THEN: No duplicates, and the registry knows them all
    assert_eq!(unique.len(), ids.len());
    assert_eq!(channel::descriptors().len(), 40);
    for id in ids {
        assert_ne!(channel::kind_of(id), ChannelKind::Unknown, "{id} not registered");
    }
}

#[test]
fn given_event_ids_when_classified_then_all_carry_event_prefix() {
    for channel in EventChannel::ALL {
        assert!(channel.as_str().starts_with("event:"));
        assert!(channel::is_valid_event_channel(channel.as_str()));
        assert!(channel::request_channel(channel.as_str()).is_none());
    }
    for channel in RequestChannel::ALL {
        assert!(!channel.as_str().starts_with("event:"));
        assert_eq!(channel::request_channel(channel.as_str()), Some(channel));
    }
}

#[test]
fn given_unregistered_id_when_looked_up_then_unknown() {
    assert_eq!(channel::kind_of("account:delete"), ChannelKind::Unknown);
    assert_eq!(channel::kind_of(""), ChannelKind::Unknown);
    assert_eq!(channel::kind_of("ACCOUNT:LIST"), ChannelKind::Unknown);
    assert!(!channel::is_valid_event_channel("event:bogus"));
}
