//! Line-delimited JSON-RPC server over the log store.

use std::sync::Arc;
use std::time::Duration;

use logstore::LogStore;
use serde_json::{Value, json};
use tokio::io::{AsyncBufRead, AsyncWrite, AsyncWriteExt};
use tokio::task::JoinSet;
use tokio::time::timeout;

use crate::error::Result;
use crate::framing::{Frame, LineReader};
use crate::protocol::{
    APPEND_EVENT, APPEND_SUMMARY_LINE, AppendEventParams, AppendSummaryLineParams, GET_SESSION,
    GetSessionParams, JsonRpcError, JsonRpcRequest, JsonRpcResponse, LIST_SESSIONS,
    LIST_SUMMARY_LINES,
};

/// Default time a store call may take before the request fails.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Maximum request line size (1MB).
pub const MAX_REQUEST_SIZE: usize = 1024 * 1024;

/// Server settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub timeout: Duration,
    pub max_request_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_request_size: MAX_REQUEST_SIZE,
        }
    }
}

/// Serves log store requests, one JSON-RPC message per line.
pub struct Server {
    store: LogStore,
    config: ServerConfig,
}

impl Server {
    pub fn new(store: LogStore, config: ServerConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &LogStore {
        &self.store
    }

    /// Read requests from `reader` until EOF, writing each response to
    /// `writer` as soon as its handler finishes.
    ///
    /// Requests run concurrently, so responses may come back out of order;
    /// callers match them up by `id`. A line that is not UTF-8 or exceeds
    /// `max_request_size` gets an error response and serving continues. If
    /// reading fails, requests already accepted are still answered before
    /// the error is returned.
    pub async fn serve<R, W>(self: Arc<Self>, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let max = self.config.max_request_size;
        let mut frames = LineReader::new(reader, max);
        let mut inflight = JoinSet::new();
        let mut input_open = true;
        let mut read_error = None;

        tracing::info!(
            events = %self.store.events_path().display(),
            summary = %self.store.summary_path().display(),
            "log store server started"
        );

        loop {
            tokio::select! {
                frame = frames.next_frame(), if input_open => {
                    match frame {
                        Ok(Some(Frame::Line(bytes))) => match String::from_utf8(bytes) {
                            Ok(line) if line.trim().is_empty() => {}
                            Ok(line) => {
                                let server = Arc::clone(&self);
                                inflight.spawn(async move { server.handle_line(&line).await });
                            }
                            Err(e) => {
                                tracing::debug!(error = %e, "request line is not UTF-8");
                                let error = JsonRpcError::parse_error(format!("request is not valid UTF-8: {e}"));
                                write_response(&mut writer, &JsonRpcResponse::failure(None, error)).await?;
                            }
                        },
                        Ok(Some(Frame::TooLong)) => {
                            tracing::debug!(max, "request line too large");
                            let error = JsonRpcError::invalid_request(format!("request too large (max {max} bytes)"));
                            write_response(&mut writer, &JsonRpcResponse::failure(None, error)).await?;
                        }
                        Ok(None) => input_open = false,
                        Err(e) => {
                            tracing::error!(error = %e, "failed to read request stream");
                            read_error = Some(e);
                            input_open = false;
                        }
                    }
                }
                Some(joined) = inflight.join_next() => match joined {
                    Ok(Some(response)) => write_response(&mut writer, &response).await?,
                    Ok(None) => {}
                    Err(e) => tracing::error!(error = %e, "request handler panicked"),
                },
                else => break,
            }
        }

        tracing::info!("log store server stopped");
        match read_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }

    /// Handle one raw request line. Returns `None` for notifications.
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        if line.len() > self.config.max_request_size {
            return Some(JsonRpcResponse::failure(
                None,
                JsonRpcError::invalid_request(format!(
                    "request too large: {} bytes (max {})",
                    line.len(),
                    self.config.max_request_size
                )),
            ));
        }

        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                return Some(JsonRpcResponse::failure(
                    None,
                    JsonRpcError::parse_error(e.to_string()),
                ));
            }
        };

        let request: JsonRpcRequest = match serde_json::from_value(value.clone()) {
            Ok(request) => request,
            Err(e) => {
                let id = value
                    .get("id")
                    .and_then(|id| serde_json::from_value(id.clone()).ok());
                return Some(JsonRpcResponse::failure(
                    id,
                    JsonRpcError::invalid_request(e.to_string()),
                ));
            }
        };

        self.handle(request).await
    }

    /// Dispatch a parsed request. Returns `None` for notifications.
    pub async fn handle(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let outcome = if request.jsonrpc != "2.0" {
            Err(JsonRpcError::invalid_request("jsonrpc must be \"2.0\""))
        } else {
            self.dispatch(&request.method, request.params.as_ref()).await
        };

        match &outcome {
            Ok(_) => tracing::debug!(method = %request.method, "request ok"),
            Err(e) if e.is_client_error() => {
                tracing::debug!(method = %request.method, error = %e, "request rejected")
            }
            Err(e) => tracing::error!(method = %request.method, error = %e, "request failed"),
        }

        let id = request.id?;
        Some(match outcome {
            Ok(result) => JsonRpcResponse::success(Some(id), result),
            Err(error) => JsonRpcResponse::failure(Some(id), error),
        })
    }

    async fn dispatch(
        &self,
        method: &str,
        params: Option<&Value>,
    ) -> std::result::Result<Value, JsonRpcError> {
        match method {
            APPEND_EVENT => {
                let p = AppendEventParams::from_params(params)?;
                self.run(move |store| {
                    store.append_event(&p.session_id, &p.event, p.data)?;
                    Ok(json!({}))
                })
                .await
            }
            APPEND_SUMMARY_LINE => {
                let p = AppendSummaryLineParams::from_params(params)?;
                self.run(move |store| {
                    store.append_summary_line(&p.text)?;
                    Ok(json!({}))
                })
                .await
            }
            LIST_SESSIONS => {
                self.run(|store| Ok(json!({ "sessions": store.list_sessions()? })))
                    .await
            }
            GET_SESSION => {
                let p = GetSessionParams::from_params(params)?;
                self.run(move |store| Ok(json!({ "session": store.load_session(&p.session_id)? })))
                    .await
            }
            LIST_SUMMARY_LINES => {
                self.run(|store| Ok(json!({ "lines": store.read_summary_lines()? })))
                    .await
            }
            other => Err(JsonRpcError::method_not_found(other)),
        }
    }

    /// Run a blocking store call on the blocking pool, bounded by the
    /// configured timeout.
    async fn run<F>(&self, f: F) -> std::result::Result<Value, JsonRpcError>
    where
        F: FnOnce(&LogStore) -> logstore::Result<Value> + Send + 'static,
    {
        let store = self.store.clone();
        let task = tokio::task::spawn_blocking(move || f(&store));

        match timeout(self.config.timeout, task).await {
            Ok(Ok(result)) => result.map_err(JsonRpcError::from),
            Ok(Err(e)) => Err(JsonRpcError::internal(format!("store task failed: {e}"))),
            // The blocking call keeps running; its outcome is dropped.
            Err(_) => Err(JsonRpcError::timed_out()),
        }
    }
}

async fn write_response<W>(writer: &mut W, response: &JsonRpcResponse) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut json = serde_json::to_vec(response)?;
    json.push(b'\n');
    writer.write_all(&json).await?;
    writer.flush().await?;
    Ok(())
}
