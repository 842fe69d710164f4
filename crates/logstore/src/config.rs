//! Where the store keeps its two log files.

use std::path::PathBuf;

use serde::Deserialize;

/// Store location settings, usually the `[store]` table of `eventlog.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding both log files.
    pub dir: PathBuf,

    /// File name of the structured event log.
    pub events_file: String,

    /// File name of the flat summary log.
    pub summary_file: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("logs"),
            events_file: "events.json".to_string(),
            summary_file: "summary.txt".to_string(),
        }
    }
}

impl StoreConfig {
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ..Self::default()
        }
    }

    pub fn events_path(&self) -> PathBuf {
        self.dir.join(&self.events_file)
    }

    pub fn summary_path(&self) -> PathBuf {
        self.dir.join(&self.summary_file)
    }
}
