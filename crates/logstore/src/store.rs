//! Log store facade.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::config::StoreConfig;
use crate::{Result, Session, aggregate, codec, writer};

/// File-backed event and summary log.
///
/// Holds only paths, so clones are cheap and every clone talks to the same
/// files. Writers to the structured log serialize through a per-path lock.
#[derive(Debug, Clone)]
pub struct LogStore {
    events_path: PathBuf,
    summary_path: PathBuf,
}

impl LogStore {
    /// Use the given structured and flat log paths. Nothing is created until
    /// the first write.
    pub fn new(events_path: impl Into<PathBuf>, summary_path: impl Into<PathBuf>) -> Self {
        Self {
            events_path: events_path.into(),
            summary_path: summary_path.into(),
        }
    }

    /// Open the store described by `config`.
    pub fn open(config: &StoreConfig) -> Self {
        Self::new(config.events_path(), config.summary_path())
    }

    /// Open a store using the default file names under `dir`.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self::open(&StoreConfig::in_dir(dir))
    }

    pub fn events_path(&self) -> &Path {
        &self.events_path
    }

    pub fn summary_path(&self) -> &Path {
        &self.summary_path
    }

    /// Append an event to `session_id`'s history. The timestamp is assigned
    /// here, not by the caller.
    pub fn append_event(&self, session_id: &str, event: &str, data: Option<Value>) -> Result<()> {
        writer::append_event(&self.events_path, session_id, event, data)?;
        Ok(())
    }

    /// Append one line of free text to the summary log.
    pub fn append_summary_line(&self, text: &str) -> Result<()> {
        writer::append_summary_line(&self.summary_path, text)
    }

    /// All sessions, ordered by first appearance, each with its events in
    /// append order.
    pub fn list_sessions(&self) -> Result<Vec<Session>> {
        aggregate::list_sessions(&self.events_path)
    }

    /// One session's history, or `None` if it has no events.
    pub fn load_session(&self, session_id: &str) -> Result<Option<Session>> {
        aggregate::load_session(&self.events_path, session_id)
    }

    /// Every summary line in append order.
    pub fn read_summary_lines(&self) -> Result<Vec<String>> {
        let bytes = writer::read_log_bytes(&self.summary_path)?.unwrap_or_default();
        Ok(codec::decode_summary_log(&bytes))
    }
}
