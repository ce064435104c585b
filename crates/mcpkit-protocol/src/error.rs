//! The MCP error taxonomy (§4.1) and its mapping onto JSON-RPC error codes.

use serde_json::Value;
use thiserror::Error;

use crate::jsonrpc::JsonRpcError;
use mcpkit_types::RequestId;

/// `Result` alias used throughout the workspace. Boxed so that the common
/// success path stays cheap to move even though `McpError` itself carries a
/// details payload.
pub type Result<T> = std::result::Result<T, Box<McpError>>;

/// A single error carrier: kind, message, optional structured details, and
/// the request id it correlates to once the dispatcher has one to attach.
#[derive(Debug, Error, Clone)]
#[error("{kind}: {message}")]
pub struct McpError {
    /// Error classification.
    pub kind: ErrorKind,
    /// Short human-readable message.
    pub message: String,
    /// Structured details (e.g. the offending tool name, missing args).
    pub details: Option<Value>,
    /// The request id this error responds to, set by the dispatcher when it
    /// re-raises a handler error as a JSON-RPC response.
    pub correlates_to: Option<RequestId>,
}

/// The error kinds named in §4.1, each carrying its wire code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Parse,
    InvalidRequest,
    MethodNotFound,
    InvalidParams,
    Internal,
    Server,
    NotInitialized,
    NotFound,
    AuthenticationRequired,
    AuthorizationFailed,
    SamplingTimeout,
}

impl ErrorKind {
    /// The fixed JSON-RPC/MCP error code for this kind.
    pub fn code(self) -> i32 {
        match self {
            Self::Parse => -32700,
            Self::InvalidRequest => -32600,
            Self::MethodNotFound => -32601,
            Self::InvalidParams => -32602,
            Self::Internal => -32603,
            Self::Server => -32000,
            Self::NotFound => -32001,
            Self::NotInitialized => -32002,
            // Application-defined band; see SPEC_FULL.md §4.1a for the
            // rationale behind these specific values.
            Self::AuthenticationRequired => -32011,
            Self::AuthorizationFailed => -32012,
            Self::SamplingTimeout => -32013,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Parse => "Parse",
            Self::InvalidRequest => "InvalidRequest",
            Self::MethodNotFound => "MethodNotFound",
            Self::InvalidParams => "InvalidParams",
            Self::Internal => "Internal",
            Self::Server => "Server",
            Self::NotInitialized => "NotInitialized",
            Self::NotFound => "NotFound",
            Self::AuthenticationRequired => "AuthenticationRequired",
            Self::AuthorizationFailed => "AuthorizationFailed",
            Self::SamplingTimeout => "SamplingTimeout",
        };
        write!(f, "{name}")
    }
}

impl McpError {
    /// Construct a bare error of the given kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
            correlates_to: None,
        }
    }

    /// Attach structured details.
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Attach the request id this error correlates to.
    #[must_use]
    pub fn with_id(mut self, id: RequestId) -> Self {
        self.correlates_to = Some(id);
        self
    }

    /// Box and return as the workspace's `Result` error variant.
    pub fn into_box(self) -> Box<Self> {
        Box::new(self)
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Parse, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidRequest, message)
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(ErrorKind::MethodNotFound, format!("method not found: {method}"))
            .with_details(serde_json::json!({"method": method}))
    }

    pub fn invalid_params(message: impl Into<String>, details: Value) -> Self {
        Self::new(ErrorKind::InvalidParams, message).with_details(details)
    }

    /// Internal errors never leak the original handler message in `message`;
    /// the caller decides (per §7) whether to put it under `details` when
    /// not running in strict mode.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Server, message)
    }

    pub fn not_initialized(method: &str) -> Self {
        Self::new(
            ErrorKind::NotInitialized,
            format!("method '{method}' called before initialization"),
        )
    }

    pub fn not_found(kind: &str, name: &str) -> Self {
        Self::new(ErrorKind::NotFound, format!("{kind} not found: {name}"))
            .with_details(serde_json::json!({"details": name}))
    }

    pub fn authentication_required(strategy_detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::AuthenticationRequired, "authentication required")
            .with_details(serde_json::json!({"kind": strategy_detail.into()}))
    }

    pub fn authorization_failed() -> Self {
        Self::new(ErrorKind::AuthorizationFailed, "authorization failed")
            .with_details(serde_json::json!({"kind": "authorization_failed"}))
    }

    pub fn sampling_timeout() -> Self {
        Self::new(ErrorKind::SamplingTimeout, "sampling request timed out")
    }
}

impl From<&McpError> for JsonRpcError {
    fn from(err: &McpError) -> Self {
        Self {
            code: err.kind.code(),
            message: err.message.clone(),
            data: err.details.clone(),
        }
    }
}

impl From<McpError> for JsonRpcError {
    fn from(err: McpError) -> Self {
        Self::from(&err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_carries_details() {
        let err = McpError::not_found("tool", "frobnicate");
        assert_eq!(err.kind.code(), -32001);
        let details = err.details.clone().unwrap();
        assert_eq!(details["details"], "frobnicate");
    }

    #[test]
    fn authentication_and_authorization_do_not_share_a_code() {
        assert_ne!(
            ErrorKind::AuthenticationRequired.code(),
            ErrorKind::AuthorizationFailed.code()
        );
    }

    #[test]
    fn jsonrpc_error_conversion_preserves_code_and_details() {
        let err = McpError::invalid_params("bad args", serde_json::json!({"missing": ["b"]}));
        let wire: JsonRpcError = (&err).into();
        assert_eq!(wire.code, -32602);
        assert_eq!(wire.data.unwrap()["missing"][0], "b");
    }
}
