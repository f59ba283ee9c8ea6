use serde::{Deserialize, Serialize};
use serde_json::json;

use leadline_core::errors::ActionError;

/// One RPC call posted to `/rpc`.
#[derive(Debug, Deserialize)]
pub struct RpcRequest {
    pub method: String,
    pub params: Option<serde_json::Value>,
    pub id: Option<serde_json::Value>,
}

/// Wire response: `{ id, success, data?, error?: { code, message, details? } }`.
#[derive(Debug, Serialize)]
pub struct RpcResponse {
    pub id: Option<serde_json::Value>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

/// Error object with a stable string code clients can switch on.
#[derive(Debug, Serialize)]
pub struct RpcError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl RpcResponse {
    pub fn success(id: Option<serde_json::Value>, data: serde_json::Value) -> Self {
        Self { id, success: true, data: Some(data), error: None }
    }

    pub fn error(
        id: Option<serde_json::Value>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id,
            success: false,
            data: None,
            error: Some(RpcError { code: code.into(), message: message.into(), details: None }),
        }
    }

    pub fn error_with_details(
        id: Option<serde_json::Value>,
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            id,
            success: false,
            data: None,
            error: Some(RpcError {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            }),
        }
    }

    pub fn method_not_found(id: Option<serde_json::Value>, method: &str) -> Self {
        Self::error(id, "METHOD_NOT_FOUND", format!("Method not found: {method}"))
    }

    pub fn invalid_params(id: Option<serde_json::Value>, msg: impl Into<String>) -> Self {
        Self::error(id, "INVALID_PARAMS", msg)
    }

    pub fn parse_error() -> Self {
        Self::error(None, "PARSE_ERROR", "Parse error")
    }

    /// Map an action failure onto the wire. Field issues and failed import
    /// rows travel in `details` so clients can render them inline; the
    /// message stays the user-facing Display string.
    pub fn from_action_error(id: Option<serde_json::Value>, err: &ActionError) -> Self {
        let message = err.to_string();
        match err {
            ActionError::Validation { issues } => Self::error_with_details(
                id,
                "VALIDATION_ERROR",
                message,
                json!({ "issues": issues }),
            ),
            ActionError::Conflict => Self::error(id, "CONFLICT", message),
            ActionError::RateLimited { retry_after_secs } => Self::error_with_details(
                id,
                "RATE_LIMITED",
                message,
                json!({ "retryAfterSecs": retry_after_secs }),
            ),
            ActionError::Unauthenticated => Self::error(id, "UNAUTHENTICATED", message),
            ActionError::NotFound => Self::error(id, "NOT_FOUND", message),
            ActionError::Storage(_) => Self::error(id, "STORAGE_ERROR", message),
            ActionError::ImportBatch { errors } => Self::error_with_details(
                id,
                "IMPORT_ERROR",
                message,
                json!({ "rows": errors }),
            ),
            ActionError::Suggestion => Self::error(id, "SUGGESTION_ERROR", message),
        }
    }
}

/// Extract a required string param from the RPC params object.
pub fn require_str<'a>(params: &'a serde_json::Value, key: &str) -> Result<&'a str, String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| format!("Missing required parameter: {key}"))
}

/// Extract an optional string param.
pub fn optional_str<'a>(params: &'a serde_json::Value, key: &str) -> Option<&'a str> {
    params.get(key).and_then(|v| v.as_str())
}

/// Extract an optional u64 param.
pub fn optional_u64(params: &serde_json::Value, key: &str) -> Option<u64> {
    params.get(key).and_then(|v| v.as_u64())
}
