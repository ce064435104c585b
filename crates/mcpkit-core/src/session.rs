//! Per-client `Session` state (§3 Session).

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use uuid::Uuid;

use mcpkit_protocol::jsonrpc::{JsonRpcNotification, JsonRpcRequest, JsonRpcResponse};
use mcpkit_protocol::{McpError, Result};
use mcpkit_types::RequestId;

use crate::context::RequestContext;
use crate::security::SecurityContext;

/// A session identifier, stable for the lifetime of the logical connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A message the dispatcher or sampling machinery wants delivered back to
/// the client through whichever transport owns the session.
#[derive(Debug, Clone)]
pub enum OutboundFrame {
    Response(JsonRpcResponse),
    Notification(JsonRpcNotification),
    /// A server-initiated request (sampling).
    Request(JsonRpcRequest),
}

/// The owning transport's side of a session: how the dispatcher pushes a
/// message back without depending on the concrete transport type.
///
/// stdio implements this by writing a newline-framed JSON object to stdout;
/// the HTTP transport implements it by either writing the POST response
/// body directly or forwarding onto the session's SSE stream.
pub trait SessionSink: Send + Sync + std::fmt::Debug {
    /// Deliver a message. Transports that can't push asynchronously (stdio,
    /// mid-POST) may buffer and flush on their own schedule, but must
    /// preserve per-session enqueue order (§5).
    fn push(&self, frame: OutboundFrame) -> Result<()>;
}

/// A `SessionSink` that silently drops everything, used for sessions that
/// have no attached transport yet (or in tests).
#[derive(Debug, Default)]
pub struct NullSink;

impl SessionSink for NullSink {
    fn push(&self, _frame: OutboundFrame) -> Result<()> {
        Ok(())
    }
}

/// Negotiated handshake state and metadata for one logical client
/// connection.
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    initialized: AtomicBool,
    protocol_version: RwLock<Option<String>>,
    client_name: RwLock<Option<String>>,
    context: RwLock<RequestContext>,
    security: RwLock<SecurityContext>,
    current_request_id: RwLock<Option<RequestId>>,
    sink: Arc<dyn SessionSink>,
}

impl Session {
    pub fn new(context: RequestContext, sink: Arc<dyn SessionSink>) -> Self {
        Self {
            id: SessionId::new(),
            initialized: AtomicBool::new(false),
            protocol_version: RwLock::new(None),
            client_name: RwLock::new(None),
            context: RwLock::new(context),
            security: RwLock::new(SecurityContext::anonymous()),
            current_request_id: RwLock::new(None),
            sink,
        }
    }

    pub fn with_id(mut self, id: SessionId) -> Self {
        self.id = id;
        self
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Complete the handshake: record the negotiated version/client info and
    /// flip the initialized flag (§3 Session invariant).
    pub fn mark_initialized(&self, protocol_version: String, client_name: String) {
        *self.protocol_version.write() = Some(protocol_version);
        *self.client_name.write() = Some(client_name);
        self.initialized.store(true, Ordering::Release);
    }

    pub fn protocol_version(&self) -> Option<String> {
        self.protocol_version.read().clone()
    }

    pub fn client_name(&self) -> Option<String> {
        self.client_name.read().clone()
    }

    pub fn context(&self) -> RequestContext {
        self.context.read().clone()
    }

    /// Replace the session's context, e.g. with a freshly built one carrying
    /// the headers of the request currently in flight (§4.4 HTTP transport).
    pub fn set_context(&self, context: RequestContext) {
        *self.context.write() = context;
    }

    pub fn security(&self) -> SecurityContext {
        self.security.read().clone()
    }

    pub fn set_security(&self, ctx: SecurityContext) {
        *self.security.write() = ctx;
    }

    /// The id of the inbound request currently dispatching on this session,
    /// if any. Set by the dispatcher around the handler call so
    /// handler-initiated work (sampling) can tie itself back to the request
    /// that a later cancel notification will name.
    pub fn current_request_id(&self) -> Option<RequestId> {
        self.current_request_id.read().clone()
    }

    pub fn set_current_request_id(&self, id: Option<RequestId>) {
        *self.current_request_id.write() = id;
    }

    /// Only `initialize` and `ping` may run before the handshake completes
    /// (§3 Session invariant).
    pub fn require_initialized(&self, method: &str) -> Result<()> {
        if self.is_initialized() || method == "initialize" || method == "ping" {
            Ok(())
        } else {
            Err(McpError::not_initialized(method).into_box())
        }
    }

    /// Push a message back to the client through the owning transport.
    pub fn push(&self, frame: OutboundFrame) -> Result<()> {
        self.sink.push(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::TransportKind;

    #[test]
    fn session_starts_uninitialized_and_flips_once() {
        let session = Session::new(RequestContext::minimal_stdio(), Arc::new(NullSink));
        assert!(!session.is_initialized());
        assert!(session.require_initialized("tools/list").is_err());
        assert!(session.require_initialized("ping").is_ok());
        assert!(session.require_initialized("initialize").is_ok());

        session.mark_initialized("2025-03-26".into(), "test-client".into());
        assert!(session.is_initialized());
        assert!(session.require_initialized("tools/list").is_ok());
        assert_eq!(session.protocol_version().as_deref(), Some("2025-03-26"));
    }

    #[test]
    fn session_carries_its_context() {
        let ctx = RequestContext::builder(TransportKind::Http)
            .method("tools/call")
            .build();
        let session = Session::new(ctx, Arc::new(NullSink));
        assert_eq!(session.context().method(), "tools/call");
    }

    #[test]
    fn set_context_replaces_the_session_context() {
        let session = Session::new(RequestContext::minimal_stdio(), Arc::new(NullSink));
        assert!(session.context().header("x-api-key").is_none());

        let refreshed = RequestContext::builder(TransportKind::Http)
            .header("X-API-Key", "secret")
            .build();
        session.set_context(refreshed);

        assert_eq!(session.context().header("x-api-key"), Some("secret"));
    }
}
