use std::path::PathBuf;

use thiserror::Error;

use crate::codec::CodecError;

/// Rejected caller input. Never retried by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("session id must not be empty")]
    EmptySessionId,

    #[error("event name must not be empty")]
    EmptyEvent,

    #[error("summary line must not be empty")]
    EmptySummaryLine,

    #[error("summary line must not contain a line break")]
    MultilineSummaryLine,
}

/// Log store errors.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Caller supplied malformed or missing input.
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// The storage medium rejected a write (disk full, permission denied, ...).
    #[error("failed to write {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The structured log exists but does not decode.
    ///
    /// The file is left untouched so an operator can recover it by hand.
    #[error("corrupt log at {path}: {source}")]
    CorruptLog {
        path: PathBuf,
        #[source]
        source: CodecError,
    },

    /// A log file exists but could not be read.
    #[error("failed to read {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode log: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Coarse classification of an [`Error`], used to pick a client or server
/// response at the request boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    WriteFailed,
    CorruptLog,
    ReadFailed,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::WriteFailed => "write_failed",
            ErrorKind::CorruptLog => "corrupt_log",
            ErrorKind::ReadFailed => "read_failed",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) => ErrorKind::Validation,
            // Encoding a record we built ourselves only fails if the write
            // path is broken, so it counts as a failed write.
            Error::WriteFailed { .. } | Error::Encode(_) => ErrorKind::WriteFailed,
            Error::CorruptLog { .. } => ErrorKind::CorruptLog,
            Error::ReadFailed { .. } => ErrorKind::ReadFailed,
        }
    }

    /// True when the caller is at fault and should not retry unchanged.
    pub fn is_client_error(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }

    pub(crate) fn write_failed(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::WriteFailed {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn read_failed(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadFailed {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn corrupt(path: impl Into<PathBuf>, source: CodecError) -> Self {
        Self::CorruptLog {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
