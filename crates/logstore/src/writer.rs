//! Append Log Writer.
//!
//! The structured log is one decodable container rather than an appendable
//! byte stream, so every event append is a full read-decode-append-encode-write
//! cycle under the file lock. That makes each write O(log size). It is fine for
//! session history volumes; beyond that the log needs an append-only format
//! with an index instead.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::Path;

use serde_json::Value;
use tempfile::NamedTempFile;

use crate::codec;
use crate::error::{Error, Result, ValidationError};
use crate::event::EventRecord;
use crate::lock::with_file_lock;

/// Read a log file. A missing file is `None`, not an error.
pub(crate) fn read_log_bytes(path: &Path) -> Result<Option<Vec<u8>>> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::read_failed(path, e)),
    }
}

/// Load and decode the structured log. Absent file decodes as empty.
pub(crate) fn read_event_log(path: &Path) -> Result<Vec<EventRecord>> {
    let Some(bytes) = read_log_bytes(path)? else {
        return Ok(Vec::new());
    };
    codec::decode_event_log(&bytes).map_err(|source| {
        tracing::warn!(path = %path.display(), error = %source, "structured log failed to decode");
        Error::corrupt(path, source)
    })
}

/// Append one event to the structured log at `path`.
///
/// The timestamp is assigned while the lock is held so file order and
/// timestamp order agree.
pub fn append_event(
    path: &Path,
    session_id: &str,
    event: &str,
    data: Option<Value>,
) -> Result<EventRecord> {
    if session_id.is_empty() {
        return Err(ValidationError::EmptySessionId.into());
    }
    if event.is_empty() {
        return Err(ValidationError::EmptyEvent.into());
    }

    with_file_lock(path, || {
        // A corrupt log aborts here, before anything is rewritten.
        let mut records = read_event_log(path)?;
        let record = EventRecord::new(session_id, event, data);
        records.push(record.clone());

        let bytes = codec::encode_event_log(&records)?;
        replace_atomically(path, &bytes)?;

        tracing::debug!(
            path = %path.display(),
            session_id,
            event,
            total = records.len(),
            "appended event"
        );
        Ok(record)
    })
}

/// Append one line to the flat summary log at `path`.
///
/// Plain `O_APPEND` writes need no lock: each line is written with a single
/// call and lines carry no cross-record dependency.
pub fn append_summary_line(path: &Path, text: &str) -> Result<()> {
    let line = codec::encode_summary_line(text)?;
    let mut buf = Vec::with_capacity(line.len() + 1);
    buf.extend_from_slice(line);
    buf.push(b'\n');

    ensure_parent(path)?;
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| Error::write_failed(path, e))?;
    file.write_all(&buf)
        .and_then(|()| file.flush())
        .map_err(|e| Error::write_failed(path, e))?;

    tracing::debug!(path = %path.display(), bytes = buf.len(), "appended summary line");
    Ok(())
}

/// Write `bytes` to a sibling temp file, sync it, and rename it over `path`.
/// Readers see the old content or the new content, never a mix.
fn replace_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = ensure_parent(path)?;
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| Error::write_failed(path, e))?;
    tmp.write_all(bytes)
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| Error::write_failed(tmp.path(), e))?;
    tmp.persist(path)
        .map_err(|e| Error::write_failed(path, e.error))?;
    sync_dir(dir)
}

/// Flush a directory entry change (the rename above) to disk.
#[cfg(unix)]
fn sync_dir(dir: &Path) -> Result<()> {
    std::fs::File::open(dir)
        .and_then(|d| d.sync_all())
        .map_err(|e| Error::write_failed(dir, e))
}

// Directories cannot be opened as files here; the rename is left to the OS.
#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> Result<()> {
    Ok(())
}

/// Create the parent directory of `path` if needed and return it.
fn ensure_parent(path: &Path) -> Result<&Path> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(|e| Error::write_failed(parent, e))?;
    Ok(parent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind as StoreErrorKind;
    use serde_json::json;

    #[test]
    fn append_creates_log_and_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/logs/events.json");

        let record = append_event(&path, "s1", "login", Some(json!({"method": "wallet"}))).unwrap();
        assert_eq!(record.session_id, "s1");

        let records = read_event_log(&path).unwrap();
        assert_eq!(records, vec![record]);
    }

    #[test]
    fn append_preserves_existing_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.json");

        let first = append_event(&path, "s1", "a", None).unwrap();
        let second = append_event(&path, "s2", "b", Some(json!(1))).unwrap();

        assert_eq!(read_event_log(&path).unwrap(), vec![first, second]);
    }

    #[test]
    fn timestamps_follow_append_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.json");
        for i in 0..5 {
            append_event(&path, "s1", &format!("e{i}"), None).unwrap();
        }
        let records = read_event_log(&path).unwrap();
        assert!(records.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[test]
    fn rejects_empty_identifiers_without_touching_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.json");

        let err = append_event(&path, "", "login", None).unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::EmptySessionId)
        ));
        let err = append_event(&path, "s1", "", None).unwrap_err();
        assert!(matches!(err, Error::Validation(ValidationError::EmptyEvent)));
        assert!(!path.exists());
    }

    #[test]
    fn corrupt_log_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.json");
        std::fs::write(&path, b"[{\"type\":\"event\",").unwrap();

        let err = append_event(&path, "s1", "login", None).unwrap_err();
        assert_eq!(err.kind(), StoreErrorKind::CorruptLog);
        assert_eq!(std::fs::read(&path).unwrap(), b"[{\"type\":\"event\",");
    }

    #[test]
    fn unwritable_target_is_write_failed() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the log file should be.
        let path = dir.path().join("events.json");
        std::fs::create_dir(&path).unwrap();

        let err = append_summary_line(&path, "hello").unwrap_err();
        assert_eq!(err.kind(), StoreErrorKind::WriteFailed);
    }

    #[test]
    fn event_append_under_a_file_is_write_failed() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();
        let path = blocker.join("events.json");

        let err = append_event(&path, "s1", "login", None).unwrap_err();
        assert_eq!(err.kind(), StoreErrorKind::WriteFailed);
        assert!(!err.is_client_error());
        assert!(!path.exists());
        assert_eq!(std::fs::read(&blocker).unwrap(), b"not a directory");
    }

    #[test]
    fn replace_leaves_no_temp_files_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.json");

        replace_atomically(&path, b"[]\n").unwrap();
        replace_atomically(&path, b"[ ]\n").unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"[ ]\n");
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("events.json")]);
    }

    #[cfg(unix)]
    #[test]
    fn sync_dir_reports_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        sync_dir(dir.path()).unwrap();

        let err = sync_dir(&dir.path().join("gone")).unwrap_err();
        assert_eq!(err.kind(), StoreErrorKind::WriteFailed);
    }

    #[test]
    fn summary_lines_append_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.txt");

        append_summary_line(&path, "first").unwrap();
        append_summary_line(&path, "second").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }

    #[test]
    fn invalid_summary_line_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.txt");

        let err = append_summary_line(&path, "a\nb").unwrap_err();
        assert!(err.is_client_error());
        assert!(!path.exists());
    }

    #[test]
    fn missing_log_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(read_log_bytes(&dir.path().join("absent")).unwrap(), None);
    }
}
