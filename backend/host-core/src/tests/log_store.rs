// Unit tests for the in-memory log history.

use super::support::drain;
use crate::channel::EventChannel;
use crate::events::EventBus;
use crate::log_store::{ExportFormat, LogStore, render};
use crate::model::{LogEntry, LogLevel};

use std::str::FromStr;

#[test]
fn given_full_store_when_pushed_then_oldest_dropped_and_seq_keeps_counting() {
    let store = LogStore::with_capacity(EventBus::new(), 3);

    for i in 0..5 {
        store.push(LogLevel::Info, "netgate", format!("line {i}"));
    }

    let entries = store.entries(None);
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].message, "line 2");
    assert_eq!(entries[2].seq, 5);
}

#[test]
fn given_limit_when_entries_requested_then_most_recent_returned_oldest_first() {
    let store = LogStore::new(EventBus::new());
    for i in 0..4 {
        store.push(LogLevel::Debug, "netgate", format!("line {i}"));
    }

    let tail: Vec<String> = store.entries(Some(2)).into_iter().map(|e| e.message).collect();

    assert_eq!(tail, vec!["line 2", "line 3"]);
    assert_eq!(store.entries(Some(100)).len(), 4);
}

/// **VALUE**: Every appended entry is broadcast with its sequence number.
#[test]
fn given_subscriber_when_pushed_then_log_added_event_carries_entry() {
    let bus = EventBus::new();
    let mut rx = bus.subscribe();
    let store = LogStore::new(bus);

    let entry = store.push(LogLevel::Warn, "netgate::monitor", "probe slow".into()).unwrap();

    let events = drain(&mut rx, EventChannel::LogAdded);
    assert_eq!(events.len(), 1);
    let seen: LogEntry = serde_json::from_value(events[0].clone()).unwrap();
    assert_eq!(seen, entry);
}

#[test]
fn given_entries_when_cleared_then_count_returned_and_store_empty() {
    let store = LogStore::new(EventBus::new());
    store.push(LogLevel::Info, "netgate", "a".into());
    store.push(LogLevel::Info, "netgate", "b".into());

    assert_eq!(store.clear(), 2);
    assert!(store.is_empty());
    assert_eq!(store.clear(), 0);
}

/// **VALUE**: Export output depends only on the entries.
///
/// **BUG THIS CATCHES**: Would catch a render that stamps the export time or
/// iterates a HashMap, making two exports of the same history differ.
#[test]
fn given_same_entries_when_exported_twice_then_identical_output() {
    // GIVEN: Fixed entries
    let entries = vec![
        LogEntry {
            seq: 1,
            timestamp: "2026-01-01T00:00:00.000Z".into(),
            level: LogLevel::Info,
            target: "netgate".into(),
            message: "started".into(),
        },
        LogEntry {
            seq: 2,
            timestamp: "2026-01-01T00:00:01.000Z".into(),
            level: LogLevel::Error,
            target: "netgate::update".into(),
            message: "feed down".into(),
        },
    ];

    // WHEN: Rendering both formats twice
    let text = render(&entries, ExportFormat::Text);
    let json = render(&entries, ExportFormat::Json);

    // THEN: Stable and well-formed
    assert_eq!(text, render(&entries, ExportFormat::Text));
    assert_eq!(json, render(&entries, ExportFormat::Json));
    assert_eq!(
        text,
        "2026-01-01T00:00:00.000Z [INFO] netgate: started\n\
         2026-01-01T00:00:01.000Z [ERROR] netgate::update: feed down\n"
    );
    let parsed: Vec<LogEntry> = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, entries);
}

#[test]
fn given_format_names_when_parsed_then_only_text_and_json_accepted() {
    assert_eq!(ExportFormat::from_str("text"), Ok(ExportFormat::Text));
    assert_eq!(ExportFormat::from_str("json"), Ok(ExportFormat::Json));
    assert!(ExportFormat::from_str("csv").is_err());
    assert!(ExportFormat::from_str("JSON").is_err());
}
