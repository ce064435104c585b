//! JSON-RPC 2.0 envelope types.
//!
//! Faithful to the wire shapes in §6 of the specification: requests carry
//! `jsonrpc`, `method`, optional `params`, and `id`; notifications omit
//! `id`; responses carry exactly one of `result` or `error`.

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use mcpkit_types::RequestId;

/// JSON-RPC version constant.
pub const JSONRPC_VERSION: &str = "2.0";

/// The literal `"2.0"` version marker, serialized as a plain string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsonRpcVersion;

impl Serialize for JsonRpcVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(JSONRPC_VERSION)
    }
}

impl<'de> Deserialize<'de> for JsonRpcVersion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let v = String::deserialize(deserializer)?;
        if v == JSONRPC_VERSION {
            Ok(JsonRpcVersion)
        } else {
            Err(serde::de::Error::custom(format!(
                "invalid jsonrpc version: expected '{JSONRPC_VERSION}', got '{v}'"
            )))
        }
    }
}

/// A parsed inbound frame, before the dispatcher decides whether it is a
/// request, a notification, or a response to a server-initiated request.
///
/// Deliberately permissive (all fields optional except `jsonrpc`) because
/// the dispatcher's own validation (§4.2 `handle_message`) is what
/// classifies malformed shapes, not serde.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawFrame {
    /// Must be `"2.0"`; checked by the caller, not enforced by serde here so
    /// that a missing/garbled version still parses far enough to classify.
    #[serde(default)]
    pub jsonrpc: Option<String>,
    /// Present on requests and notifications.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Present on requests and notifications.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    /// Present on requests and on responses to server-initiated requests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<RequestId>,
    /// Present only on responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Present only on error responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl RawFrame {
    /// A frame with both `id` and `method` is a request.
    pub fn is_request(&self) -> bool {
        self.method.is_some() && self.id.is_some()
    }

    /// A frame with `method` but no `id` is a notification.
    pub fn is_notification(&self) -> bool {
        self.method.is_some() && self.id.is_none()
    }

    /// A frame with `id` but no `method` is a response to a server-initiated
    /// request (or garbage).
    pub fn is_response_shaped(&self) -> bool {
        self.method.is_none() && self.id.is_some()
    }
}

/// An outbound JSON-RPC request (used for server-initiated `sampling/*`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: JsonRpcVersion,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    pub id: RequestId,
}

impl JsonRpcRequest {
    /// Build a request with parameters already serialized to `Value`.
    pub fn new(method: impl Into<String>, params: Option<Value>, id: RequestId) -> Self {
        Self {
            jsonrpc: JsonRpcVersion,
            method: method.into(),
            params,
            id,
        }
    }
}

/// An outbound JSON-RPC notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcNotification {
    pub jsonrpc: JsonRpcVersion,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcNotification {
    /// Build a notification.
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JsonRpcVersion,
            method: method.into(),
            params,
        }
    }
}

/// A JSON-RPC error object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// A response's `id` field: `null` only for parse errors where no id could
/// be recovered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResponseId(pub Option<RequestId>);

impl ResponseId {
    /// Construct from a known request id.
    pub fn from_request(id: RequestId) -> Self {
        Self(Some(id))
    }

    /// A null id, used for unrecoverable parse errors.
    pub fn null() -> Self {
        Self(None)
    }

    /// Whether this response carries no id.
    pub fn is_null(&self) -> bool {
        self.0.is_none()
    }
}

/// Either the result or the error payload of a response, never both.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsonRpcResponsePayload {
    Success { result: Value },
    Error { error: JsonRpcError },
}

/// An outbound JSON-RPC response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: JsonRpcVersion,
    #[serde(flatten)]
    pub payload: JsonRpcResponsePayload,
    pub id: ResponseId,
}

impl JsonRpcResponse {
    /// Build a success response for the given request id.
    pub fn success(result: Value, id: RequestId) -> Self {
        Self {
            jsonrpc: JsonRpcVersion,
            payload: JsonRpcResponsePayload::Success { result },
            id: ResponseId::from_request(id),
        }
    }

    /// Build an error response for the given request id.
    pub fn error_for(error: JsonRpcError, id: RequestId) -> Self {
        Self {
            jsonrpc: JsonRpcVersion,
            payload: JsonRpcResponsePayload::Error { error },
            id: ResponseId::from_request(id),
        }
    }

    /// Build an error response with a null id (unrecoverable parse error).
    pub fn error_without_id(error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JsonRpcVersion,
            payload: JsonRpcResponsePayload::Error { error },
            id: ResponseId::null(),
        }
    }

    /// Whether this is a success response.
    pub fn is_success(&self) -> bool {
        matches!(self.payload, JsonRpcResponsePayload::Success { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classifies_request_notification_response() {
        let req: RawFrame = serde_json::from_value(json!({
            "jsonrpc": "2.0", "id": 1, "method": "ping"
        }))
        .unwrap();
        assert!(req.is_request());
        assert!(!req.is_notification());
        assert!(!req.is_response_shaped());

        let notif: RawFrame = serde_json::from_value(json!({
            "jsonrpc": "2.0", "method": "initialized"
        }))
        .unwrap();
        assert!(notif.is_notification());

        let resp: RawFrame = serde_json::from_value(json!({
            "jsonrpc": "2.0", "id": 7, "result": {"ok": true}
        }))
        .unwrap();
        assert!(resp.is_response_shaped());
    }

    #[test]
    fn success_response_round_trips() {
        let resp = JsonRpcResponse::success(json!({"tools": []}), RequestId::Number(2));
        let text = serde_json::to_string(&resp).unwrap();
        assert!(text.contains("\"result\""));
        assert!(!text.contains("\"error\""));
    }

    #[test]
    fn parse_error_response_has_null_id() {
        let resp = JsonRpcResponse::error_without_id(JsonRpcError {
            code: -32700,
            message: "Parse error".into(),
            data: None,
        });
        let text = serde_json::to_string(&resp).unwrap();
        assert!(text.contains("\"id\":null"));
    }

    #[test]
    fn error_for_carries_the_original_request_id() {
        use pretty_assertions::assert_eq;

        let resp = JsonRpcResponse::error_for(
            JsonRpcError { code: -32601, message: "Method not found".into(), data: None },
            RequestId::String("abc".into()),
        );
        assert_eq!(resp.id, ResponseId::from_request(RequestId::String("abc".into())));
    }
}
