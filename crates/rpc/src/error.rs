//! RPC surface error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error on request stream: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize response: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
