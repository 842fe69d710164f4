//! Event record types for the structured log.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tag distinguishing record kinds in the structured log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordType {
    Event,
}

/// One persisted occurrence tied to a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    #[serde(rename = "type")]
    pub record_type: RecordType,
    pub session_id: String,
    pub event: String,
    /// Free-form payload. Written as `null` when absent.
    #[serde(default)]
    pub data: Option<Value>,
    pub timestamp: DateTime<Utc>,
}

impl EventRecord {
    /// Build a record stamped with the process clock.
    pub fn new(
        session_id: impl Into<String>,
        event: impl Into<String>,
        data: Option<Value>,
    ) -> Self {
        Self::at(session_id, event, data, monotonic_now())
    }

    pub fn at(
        session_id: impl Into<String>,
        event: impl Into<String>,
        data: Option<Value>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            record_type: RecordType::Event,
            session_id: session_id.into(),
            event: event.into(),
            data: data.filter(|value| !value.is_null()),
            timestamp,
        }
    }
}

/// A session's history, rebuilt from the log on every read.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub session_id: String,
    pub events: Vec<EventRecord>,
}

impl Session {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            events: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.events.first().map(|e| e.timestamp)
    }

    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        self.events.last().map(|e| e.timestamp)
    }
}

static LAST_TIMESTAMP_MICROS: AtomicI64 = AtomicI64::new(i64::MIN);

/// Current time, clamped so it never goes backwards within this process.
pub fn monotonic_now() -> DateTime<Utc> {
    let now = Utc::now().timestamp_micros();
    let previous = LAST_TIMESTAMP_MICROS.fetch_max(now, Ordering::SeqCst);
    let micros = previous.max(now);
    DateTime::from_timestamp_micros(micros).unwrap_or_else(Utc::now)
}
