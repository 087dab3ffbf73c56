//! JSON-RPC payload types carried through the adapter.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// A JSON-RPC request payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: Value,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

impl JsonRpcRequest {
    /// Build a request with a fresh id.
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: Value::from(NEXT_ID.fetch_add(1, Ordering::Relaxed)),
            method: method.into(),
            params,
        }
    }
}

/// A JSON-RPC response payload. Exactly one of `result`/`error` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    pub fn result(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
        }
    }

    /// Split the response into its result value or its error object.
    pub fn into_result(self) -> Result<Value, JsonRpcError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        Ok(self.result.unwrap_or(Value::Null))
    }
}

/// A JSON-RPC error object.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
#[error("{message} (code {code})")]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
}
