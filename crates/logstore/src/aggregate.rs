//! Session Aggregator: groups the structured log into per-session histories.

use std::collections::HashMap;
use std::path::Path;

use crate::error::Result;
use crate::event::{EventRecord, Session};
use crate::writer::read_event_log;

/// Group records by session id.
///
/// Sessions come out in the order their id first appears in `records`;
/// events inside a session keep their append order.
pub fn group_sessions(records: Vec<EventRecord>) -> Vec<Session> {
    let mut sessions: Vec<Session> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for record in records {
        let slot = match index.get(&record.session_id) {
            Some(&slot) => slot,
            None => {
                index.insert(record.session_id.clone(), sessions.len());
                sessions.push(Session::new(record.session_id.clone()));
                sessions.len() - 1
            }
        };
        sessions[slot].events.push(record);
    }

    sessions
}

/// Load the structured log at `path` and group it. Absent log is empty.
pub fn list_sessions(path: &Path) -> Result<Vec<Session>> {
    let records = read_event_log(path)?;
    let total = records.len();
    let sessions = group_sessions(records);
    tracing::debug!(
        path = %path.display(),
        events = total,
        sessions = sessions.len(),
        "loaded sessions"
    );
    Ok(sessions)
}

/// Load a single session's history, if any events exist for it.
pub fn load_session(path: &Path, session_id: &str) -> Result<Option<Session>> {
    let events: Vec<EventRecord> = read_event_log(path)?
        .into_iter()
        .filter(|record| record.session_id == session_id)
        .collect();

    if events.is_empty() {
        return Ok(None);
    }
    Ok(Some(Session {
        session_id: session_id.to_string(),
        events,
    }))
}
