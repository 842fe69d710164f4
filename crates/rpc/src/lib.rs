//! JSON-RPC request surface for the log store.
//!
//! Each line on the input stream is one JSON-RPC 2.0 message; each response
//! is written back as one line. Requests are handled concurrently and every
//! store call runs on the blocking pool under a timeout.
//!
//! | method              | params                         | result              |
//! |---------------------|--------------------------------|---------------------|
//! | `appendEvent`       | `sessionId`, `event`, `data?`  | `{}`                |
//! | `appendSummaryLine` | `text`                         | `{}`                |
//! | `listSessions`      |                                | `{sessions: [...]}` |
//! | `getSession`        | `sessionId`                    | `{session: ...}`    |
//! | `listSummaryLines`  |                                | `{lines: [...]}`    |
//!
//! Bad input is reported as `-32602` (invalid params); storage failures use
//! the `-32000..=-32003` server range, with `error.data.kind` naming the
//! failure.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use logstore::LogStore;
//! use rpc::{Server, ServerConfig};
//!
//! # async fn example() -> rpc::Result<()> {
//! let server = Arc::new(Server::new(LogStore::in_dir("logs"), ServerConfig::default()));
//! let stdin = tokio::io::BufReader::new(tokio::io::stdin());
//! server.serve(stdin, tokio::io::stdout()).await?;
//! # Ok(())
//! # }
//! ```

mod error;
mod framing;
mod protocol;
mod server;

pub use error::{Error, Result};
pub use protocol::{
    APPEND_EVENT, APPEND_SUMMARY_LINE, AppendEventParams, AppendSummaryLineParams, CORRUPT_LOG,
    GET_SESSION, GetSessionParams, INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST,
    JsonRpcError, JsonRpcRequest, JsonRpcResponse, LIST_SESSIONS, LIST_SUMMARY_LINES,
    METHOD_NOT_FOUND, PARSE_ERROR, READ_FAILED, RequestId, TIMED_OUT, WRITE_FAILED,
};
pub use server::{DEFAULT_TIMEOUT, MAX_REQUEST_SIZE, Server, ServerConfig};
