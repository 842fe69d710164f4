//! CLI error types.

use thiserror::Error;

use crate::config::ConfigError;

/// CLI errors.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// No session was found matching the given prefix.
    #[error("no session found matching '{prefix}'")]
    SessionNotFound { prefix: String },

    /// Multiple sessions match the given prefix.
    ///
    /// The user should provide a longer prefix to disambiguate.
    #[error("multiple sessions match '{prefix}': {matches:?}")]
    AmbiguousSession {
        prefix: String,
        matches: Vec<String>,
    },

    /// `--data` was not valid JSON.
    #[error("invalid --data JSON: {0}")]
    InvalidData(#[source] serde_json::Error),

    /// Configuration is invalid or missing required fields.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An error occurred in the log store.
    #[error(transparent)]
    Store(#[from] logstore::Error),

    /// An error occurred while serving requests.
    #[error(transparent)]
    Rpc(#[from] rpc::Error),
}

impl Error {
    /// Process exit code: 2 for bad input, 1 for everything else.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidData(_) | Error::SessionNotFound { .. } | Error::AmbiguousSession { .. } => 2,
            Error::Store(e) if e.is_client_error() => 2,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
