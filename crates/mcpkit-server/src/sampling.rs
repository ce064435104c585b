//! Server-initiated requests (§4.7 Sampling): build, send, and correlate
//! outbound `sampling/createMessage` requests back from the client.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::oneshot;
use uuid::Uuid;

use mcpkit_core::{Session, SessionId, TransportKind};
use mcpkit_protocol::jsonrpc::{JsonRpcRequest, JsonRpcResponsePayload};
use mcpkit_protocol::{McpError, Result};
use mcpkit_types::RequestId;

/// `messages[].role`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SamplingRole {
    User,
    Assistant,
}

/// `messages[].content`, restricted to the two kinds the source accepts for
/// sampling requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SamplingContent {
    Text { text: String },
    Image { data: String, #[serde(rename = "mimeType")] mime_type: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingMessage {
    pub role: SamplingRole,
    pub content: SamplingContent,
}

/// `includeContext` values (§4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IncludeContext {
    #[serde(rename = "none")]
    None,
    #[serde(rename = "thisServer")]
    ThisServer,
    #[serde(rename = "allServers")]
    AllServers,
}

/// Parameters for a `sample()` call, in Rust-native snake_case; converted to
/// the MCP camelCase wire shape by [`SamplingParams::to_wire_params`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SamplingParams {
    pub messages: Vec<SamplingMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_preferences: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_context: Option<IncludeContext>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_sequences: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, Value>>,
}

impl SamplingParams {
    /// Structural validation (§4.7 step 1). Type-level invariants (role and
    /// content `type` restricted to known variants) are already enforced by
    /// the enum shapes above; this covers what the type system can't.
    pub fn validate(&self) -> Result<()> {
        if self.messages.is_empty() {
            return Err(McpError::invalid_params(
                "sampling requires at least one message",
                serde_json::json!({"field": "messages"}),
            )
            .into_box());
        }
        for (i, message) in self.messages.iter().enumerate() {
            match &message.content {
                SamplingContent::Text { text } if text.is_empty() => {
                    return Err(McpError::invalid_params(
                        "sampling text content must be non-empty",
                        serde_json::json!({"field": format!("messages[{i}].content.text")}),
                    )
                    .into_box());
                }
                SamplingContent::Image { data, mime_type } if data.is_empty() || mime_type.is_empty() => {
                    return Err(McpError::invalid_params(
                        "sampling image content requires data and mimeType",
                        serde_json::json!({"field": format!("messages[{i}].content")}),
                    )
                    .into_box());
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Render as the camelCase JSON-RPC `params` object for
    /// `sampling/createMessage`.
    pub fn to_wire_params(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

struct PendingEntry {
    reply: oneshot::Sender<JsonRpcResponsePayload>,
    session_id: SessionId,
    /// The inbound request whose handler is blocked waiting on this sampling
    /// round-trip, if one was in flight when it started (§5 cancellation).
    request_id: Option<RequestId>,
}

/// The pending-outbound table (§3): one entry per in-flight server-initiated
/// request, keyed by a server-generated id.
#[derive(Default)]
pub struct SamplingCorrelator {
    pending: DashMap<RequestId, PendingEntry>,
}

impl SamplingCorrelator {
    pub fn new() -> Self {
        Self::default()
    }

    fn begin(
        &self,
        session_id: SessionId,
        request_id: Option<RequestId>,
    ) -> (RequestId, oneshot::Receiver<JsonRpcResponsePayload>) {
        let id = RequestId::String(Uuid::new_v4().to_string());
        let (tx, rx) = oneshot::channel();
        self.pending.insert(id.clone(), PendingEntry { reply: tx, session_id, request_id });
        (id, rx)
    }

    /// Fulfill a pending entry with a client-delivered response payload.
    /// Returns `true` if a waiter was resolved, `false` if the id was
    /// unknown (already timed out, cancelled, or never existed).
    pub fn resolve(&self, id: &RequestId, payload: JsonRpcResponsePayload) -> bool {
        match self.pending.remove(id) {
            Some((_, entry)) => entry.reply.send(payload).is_ok(),
            None => false,
        }
    }

    /// Whether an id is currently pending (used by the dispatcher to decide
    /// a response-shaped frame is a sampling reply rather than garbage).
    pub fn contains(&self, id: &RequestId) -> bool {
        self.pending.contains_key(id)
    }

    /// Fail and drop every pending entry belonging to a session (§5: DELETE,
    /// idle eviction, or stream-writer replacement).
    pub fn cancel_session(&self, session_id: &SessionId) {
        let ids: Vec<RequestId> = self
            .pending
            .iter()
            .filter(|e| &e.value().session_id == session_id)
            .map(|e| e.key().clone())
            .collect();
        for id in ids {
            if let Some((_, entry)) = self.pending.remove(&id) {
                let _ = entry.reply.send(JsonRpcResponsePayload::Error {
                    error: McpError::server("session closed").into(),
                });
            }
        }
    }

    /// Fail and drop the pending entry whose sampling call originated from
    /// `request_id`, unblocking its handler immediately instead of making it
    /// wait out the full sampling timeout ($/cancelRequest, §5).
    pub fn cancel_request(&self, request_id: &RequestId) {
        let id = self.pending.iter().find(|e| e.value().request_id.as_ref() == Some(request_id)).map(|e| e.key().clone());
        if let Some(id) = id {
            if let Some((_, entry)) = self.pending.remove(&id) {
                let _ = entry.reply.send(JsonRpcResponsePayload::Error {
                    error: McpError::server("request cancelled").into(),
                });
            }
        }
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Run the full `sample()` flow (§4.7) for a handler call originating on
/// `session`: validate, allocate a correlator slot, push the request, then
/// wait for either a response or the configured timeout.
pub async fn sample(
    correlator: &SamplingCorrelator,
    session: &Arc<Session>,
    params: SamplingParams,
    timeout: Duration,
) -> Result<Value> {
    if session.context().transport_kind() == TransportKind::Stdio {
        return Err(McpError::internal("sampling is not supported on the stdio transport").into_box());
    }
    params.validate()?;

    let (id, rx) = correlator.begin(session.id().clone(), session.current_request_id());
    let request = JsonRpcRequest::new("sampling/createMessage", Some(params.to_wire_params()), id.clone());
    session
        .push(mcpkit_core::OutboundFrame::Request(request))
        .map_err(|e| McpError::internal(format!("failed to push sampling request: {e}")).into_box())?;

    match tokio::time::timeout(timeout, rx).await {
        Ok(Ok(JsonRpcResponsePayload::Success { result })) => Ok(result),
        Ok(Ok(JsonRpcResponsePayload::Error { error })) => {
            Err(McpError::server(error.message).with_details(error.data.unwrap_or(Value::Null)).into_box())
        }
        Ok(Err(_)) => Err(McpError::server("sampling request cancelled").into_box()),
        Err(_) => {
            correlator.pending.remove(&id);
            Err(McpError::sampling_timeout().into_box())
        }
    }
}
