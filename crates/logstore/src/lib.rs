//! File-backed, append-only event log for session histories.
//!
//! Request handlers record discrete events against a session and one-line
//! summaries; readers get the events back grouped into sessions. Everything
//! lives in two files owned by this crate.
//!
//! # Overview
//!
//! - **Structured log** — a single JSON array of [`EventRecord`]s in append
//!   order. Appends rewrite the whole file through a temp file and an atomic
//!   rename, serialized per path by an in-process mutex plus an advisory lock
//!   on a `<file>.lock` sidecar. A reader never sees a half-written file.
//! - **Flat log** — one summary line per text line, written with plain
//!   `O_APPEND`.
//!
//! A missing structured log means "no history yet" and reads as empty. A log
//! that exists but fails to decode is [`Error::CorruptLog`] and is never
//! rewritten.
//!
//! # Example
//!
//! ```no_run
//! use logstore::LogStore;
//! use serde_json::json;
//!
//! let store = LogStore::in_dir("logs");
//!
//! store.append_event("s1", "login", Some(json!({"method": "wallet"})))?;
//! store.append_event("s1", "logout", None)?;
//! store.append_summary_line("s1 logged in and out")?;
//!
//! for session in store.list_sessions()? {
//!     println!("{}: {} events", session.session_id, session.len());
//! }
//! # Ok::<(), logstore::Error>(())
//! ```

mod aggregate;
pub mod codec;
mod config;
mod error;
mod event;
mod lock;
mod store;
mod writer;

pub use aggregate::group_sessions;
pub use codec::CodecError;
pub use config::StoreConfig;
pub use error::{Error, ErrorKind, Result, ValidationError};
pub use event::{EventRecord, RecordType, Session, monotonic_now};
pub use lock::lock_path;
pub use store::LogStore;
