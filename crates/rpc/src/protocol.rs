//! JSON-RPC 2.0 wire types for the log store surface.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Parse error: the line is not JSON.
pub const PARSE_ERROR: i32 = -32700;
/// The JSON is not a valid request object.
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
/// Missing, mistyped or rejected parameters. Client error.
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;

// Server errors from the implementation-defined range.
pub const WRITE_FAILED: i32 = -32000;
pub const CORRUPT_LOG: i32 = -32001;
pub const READ_FAILED: i32 = -32002;
pub const TIMED_OUT: i32 = -32003;

/// JSON-RPC 2.0 request (or notification, when `id` is absent).
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<RequestId>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// JSON-RPC 2.0 response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    /// `null` only when the request id could not be read.
    pub id: Option<RequestId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    pub fn success(id: Option<RequestId>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Option<RequestId>, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }

    /// Returns the result if successful, or the error.
    pub fn into_result(self) -> Result<Value, JsonRpcError> {
        if let Some(error) = self.error {
            Err(error)
        } else {
            Ok(self.result.unwrap_or(Value::Null))
        }
    }
}

/// JSON-RPC 2.0 error.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_kind(mut self, kind: &str) -> Self {
        self.data = Some(json!({ "kind": kind }));
        self
    }

    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::new(PARSE_ERROR, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(INVALID_REQUEST, message)
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(METHOD_NOT_FOUND, format!("unknown method: {method}"))
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(INVALID_PARAMS, message).with_kind("validation")
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(INTERNAL_ERROR, message)
    }

    pub fn timed_out() -> Self {
        Self::new(TIMED_OUT, "log store did not respond in time").with_kind("timed_out")
    }

    /// True for errors caused by the request rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self.code,
            PARSE_ERROR | INVALID_REQUEST | METHOD_NOT_FOUND | INVALID_PARAMS
        )
    }
}

impl From<logstore::Error> for JsonRpcError {
    fn from(err: logstore::Error) -> Self {
        let kind = err.kind();
        let code = match kind {
            logstore::ErrorKind::Validation => INVALID_PARAMS,
            logstore::ErrorKind::WriteFailed => WRITE_FAILED,
            logstore::ErrorKind::CorruptLog => CORRUPT_LOG,
            logstore::ErrorKind::ReadFailed => READ_FAILED,
        };
        Self::new(code, err.to_string()).with_kind(kind.as_str())
    }
}

impl std::fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let code = self.code;
        let message = &self.message;
        write!(f, "[{code}] {message}")
    }
}

impl std::error::Error for JsonRpcError {}

/// Request ID (can be string or number).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    String(String),
    Number(i64),
}

impl From<i64> for RequestId {
    fn from(n: i64) -> Self {
        Self::Number(n)
    }
}

impl From<String> for RequestId {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

// --- Method names and params ---

pub const APPEND_EVENT: &str = "appendEvent";
pub const APPEND_SUMMARY_LINE: &str = "appendSummaryLine";
pub const LIST_SESSIONS: &str = "listSessions";
pub const GET_SESSION: &str = "getSession";
pub const LIST_SUMMARY_LINES: &str = "listSummaryLines";

/// Params for `appendEvent`.
#[derive(Debug, Clone, PartialEq)]
pub struct AppendEventParams {
    pub session_id: String,
    pub event: String,
    pub data: Option<Value>,
}

impl AppendEventParams {
    pub fn from_params(params: Option<&Value>) -> Result<Self, JsonRpcError> {
        let params = params_object(params)?;
        Ok(Self {
            session_id: required_str(params, "sessionId")?,
            event: required_str(params, "event")?,
            data: params.get("data").cloned().filter(|v| !v.is_null()),
        })
    }
}

/// Params for `appendSummaryLine`.
#[derive(Debug, Clone, PartialEq)]
pub struct AppendSummaryLineParams {
    pub text: String,
}

impl AppendSummaryLineParams {
    pub fn from_params(params: Option<&Value>) -> Result<Self, JsonRpcError> {
        let params = params_object(params)?;
        Ok(Self {
            text: required_str(params, "text")?,
        })
    }
}

/// Params for `getSession`.
#[derive(Debug, Clone, PartialEq)]
pub struct GetSessionParams {
    pub session_id: String,
}

impl GetSessionParams {
    pub fn from_params(params: Option<&Value>) -> Result<Self, JsonRpcError> {
        let params = params_object(params)?;
        Ok(Self {
            session_id: required_str(params, "sessionId")?,
        })
    }
}

fn params_object(params: Option<&Value>) -> Result<&serde_json::Map<String, Value>, JsonRpcError> {
    params
        .and_then(Value::as_object)
        .ok_or_else(|| JsonRpcError::invalid_params("params must be an object"))
}

fn required_str(params: &serde_json::Map<String, Value>, field: &str) -> Result<String, JsonRpcError> {
    match params.get(field) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Null) | None => Err(JsonRpcError::invalid_params(format!(
            "missing required field: {field}"
        ))),
        Some(_) => Err(JsonRpcError::invalid_params(format!(
            "field {field} must be a string"
        ))),
    }
}
