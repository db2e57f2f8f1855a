//! In-memory log history.
//!
//! ```text
//! log::info!("...")
//!        │
//!        ▼
//!   fern dispatch (netgate binary)
//!        │
//!        ▼
//!   LogStore::record()
//!        │
//!        ├──► ring buffer      (log:get / log:export)
//!        └──► EventBus         (event:log:added)
//! ```
//!
//! Nothing in here may log: it runs inside the logger.

use crate::channel::EventChannel;
use crate::events::EventBus;
use crate::model::{LogEntry, LogLevel};

use std::collections::VecDeque;
use std::fmt::Write as _;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use humantime::format_rfc3339_millis;
use serde::{Deserialize, Serialize};

/// Entries kept before the oldest are dropped.
pub const DEFAULT_CAPACITY: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Text,
    Json,
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "text" => Ok(ExportFormat::Text),
            "json" => Ok(ExportFormat::Json),
            other => Err(format!("Unsupported export format: {other}")),
        }
    }
}

struct Inner {
    entries: VecDeque<LogEntry>,
    next_seq: u64,
}

#[derive(Clone)]
pub struct LogStore {
    inner: Arc<Mutex<Inner>>,
    capacity: usize,
    bus: EventBus,
}

impl LogStore {
    pub fn new(bus: EventBus) -> Self {
        Self::with_capacity(bus, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(bus: EventBus, capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                entries: VecDeque::with_capacity(capacity.min(DEFAULT_CAPACITY)),
                next_seq: 1,
            })),
            capacity: capacity.max(1),
            bus,
        }
    }

    /// Append a `log` record.
    pub fn record(&self, record: &log::Record<'_>) -> Option<LogEntry> {
        self.push(
            LogLevel::from(record.level()),
            record.target(),
            record.args().to_string(),
        )
    }

    /// Append an entry and broadcast it.
    ///
    /// Returns `None` only if the store's lock was poisoned.
    pub fn push(&self, level: LogLevel, target: &str, message: String) -> Option<LogEntry> {
        let mut inner = self.inner.lock().ok()?;

        let entry = LogEntry {
            seq: inner.next_seq,
            timestamp: format_rfc3339_millis(SystemTime::now()).to_string(),
            level,
            target: target.to_string(),
            message,
        };
        inner.next_seq += 1;

        if inner.entries.len() >= self.capacity {
            inner.entries.pop_front();
        }
        inner.entries.push_back(entry.clone());

        // Emitted under the lock so event order follows sequence order.
        self.bus.emit(EventChannel::LogAdded, &entry);

        Some(entry)
    }

    /// The most recent `limit` entries (all when `None`), oldest first.
    pub fn entries(&self, limit: Option<usize>) -> Vec<LogEntry> {
        let Ok(inner) = self.inner.lock() else {
            return Vec::new();
        };
        let skip = limit.map_or(0, |limit| inner.entries.len().saturating_sub(limit));
        inner.entries.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|inner| inner.entries.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop all entries; returns how many were removed.
    pub fn clear(&self) -> usize {
        let Ok(mut inner) = self.inner.lock() else {
            return 0;
        };
        let cleared = inner.entries.len();
        inner.entries.clear();
        cleared
    }

    /// Render the current history. Output depends only on the entries.
    pub fn export(&self, format: ExportFormat) -> String {
        render(&self.entries(None), format)
    }
}

/// Render entries as plain text lines or a pretty JSON array.
pub fn render(entries: &[LogEntry], format: ExportFormat) -> String {
    match format {
        ExportFormat::Text => {
            let mut out = String::new();
            for entry in entries {
                let _ = writeln!(
                    out,
                    "{} [{}] {}: {}",
                    entry.timestamp, entry.level, entry.target, entry.message
                );
            }
            out
        }
        ExportFormat::Json => serde_json::to_string_pretty(entries).unwrap_or_else(|_| "[]".to_string()),
    }
}
