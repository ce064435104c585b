//! The dispatcher (§4.2): the `Server` that holds every registration,
//! routes inbound frames to handlers, and tracks in-flight requests.

use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;
use tracing::{error, warn};

use mcpkit_core::{InFlightTable, Session, SessionId};
use mcpkit_protocol::jsonrpc::{JsonRpcNotification, JsonRpcResponse, JsonRpcResponsePayload, RawFrame};
use mcpkit_protocol::{McpError, Result};
use mcpkit_security::SecurityMiddleware;
use mcpkit_types::{Prompt, Resource, Root, Tool};

use crate::config::ServerConfig;
use crate::handlers::{self, NotificationHandler, RequestHandler};
use crate::registry::{EntityKind, PromptHandler, Registry, ResourceHandler, ToolHandler};
use crate::sampling::SamplingCorrelator;

const CANCEL_ALIASES: [&str; 3] = ["$/cancelRequest", "$/cancel", "notifications/cancelled"];

/// What `handle_message` produced for one inbound frame. Transports turn
/// this into bytes on the wire (or nothing, for notifications).
pub enum Outcome {
    Response(JsonRpcResponse),
    /// A notification, or a resolved sampling response: nothing to write.
    NoReply,
}

/// The MCP dispatcher. Owns the registry, security middleware, sampling
/// correlator, in-flight table, and the request/notification handler maps
/// (§4.2's public contract).
pub struct Server {
    pub(crate) config: ServerConfig,
    pub(crate) registry: Registry,
    pub(crate) security: SecurityMiddleware,
    pub(crate) correlator: SamplingCorrelator,
    pub(crate) inflight: Arc<InFlightTable>,
    pub(crate) sessions: DashMap<SessionId, Arc<Session>>,
    pub(crate) prompt_subscribers: DashMap<SessionId, ()>,
    request_handlers: DashMap<String, RequestHandler>,
    notification_handlers: DashMap<String, NotificationHandler>,
}

impl Server {
    pub fn new(config: ServerConfig) -> Arc<Self> {
        Self::with_security(config, SecurityMiddleware::disabled())
    }

    pub fn with_security(config: ServerConfig, security: SecurityMiddleware) -> Arc<Self> {
        let server = Arc::new(Self {
            config,
            registry: Registry::new(),
            security,
            correlator: SamplingCorrelator::new(),
            inflight: Arc::new(InFlightTable::new()),
            sessions: DashMap::new(),
            prompt_subscribers: DashMap::new(),
            request_handlers: DashMap::new(),
            notification_handlers: DashMap::new(),
        });
        server.install_builtin_handlers();
        server
    }

    fn install_builtin_handlers(&self) {
        self.request_handlers.insert("initialize".into(), handlers::request_handler(handlers::initialize::handle));
        self.request_handlers.insert("ping".into(), handlers::request_handler(handlers::ping::handle));
        self.request_handlers.insert("tools/list".into(), handlers::request_handler(handlers::tools::list));
        self.request_handlers.insert("tools/call".into(), handlers::request_handler(handlers::tools::call));
        self.request_handlers
            .insert("resources/list".into(), handlers::request_handler(handlers::resources::list));
        self.request_handlers
            .insert("resources/read".into(), handlers::request_handler(handlers::resources::read));
        self.request_handlers.insert("prompts/list".into(), handlers::request_handler(handlers::prompts::list));
        self.request_handlers.insert("prompts/get".into(), handlers::request_handler(handlers::prompts::get));
        self.request_handlers
            .insert("prompts/subscribe".into(), handlers::request_handler(handlers::prompts::subscribe));
        self.request_handlers.insert("roots/list".into(), handlers::request_handler(handlers::roots::list));

        self.notification_handlers
            .insert("initialized".into(), handlers::notification_handler(handlers::initialize::initialized));
        for alias in CANCEL_ALIASES {
            self.notification_handlers
                .insert(alias.to_string(), handlers::notification_handler(handlers::cancel::handle));
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Install or override a request handler (§4.2 `on_request`).
    pub fn on_request(&self, method: impl Into<String>, handler: RequestHandler) {
        self.request_handlers.insert(method.into(), handler);
    }

    /// Install or override a notification handler (§4.2 `on_notification`).
    pub fn on_notification(&self, method: impl Into<String>, handler: NotificationHandler) {
        self.notification_handlers.insert(method.into(), handler);
    }

    /// Issue a server-initiated request on behalf of a handler running in
    /// `session` (§4.7). Forbidden on stdio sessions; see the Design Notes'
    /// recorded decision for why.
    pub async fn sample(&self, session: &Arc<Session>, params: crate::sampling::SamplingParams) -> Result<Value> {
        crate::sampling::sample(&self.correlator, session, params, self.config.sampling.timeout()).await
    }

    #[must_use]
    pub fn register_tool(self: &Arc<Self>, tool: Tool, handler: ToolHandler) -> Result<()> {
        self.registry.register_tool(tool, handler)?;
        self.push_list_changed(EntityKind::Tool);
        Ok(())
    }

    #[must_use]
    pub fn register_resource(self: &Arc<Self>, resource: Resource, handler: ResourceHandler) -> Result<()> {
        self.registry.register_resource(resource, handler)?;
        self.push_list_changed(EntityKind::Resource);
        Ok(())
    }

    #[must_use]
    pub fn register_prompt(self: &Arc<Self>, prompt: Prompt, handler: PromptHandler) -> Result<()> {
        self.registry.register_prompt(prompt, handler)?;
        self.push_list_changed(EntityKind::Prompt);
        Ok(())
    }

    #[must_use]
    pub fn register_root(self: &Arc<Self>, root: Root) -> Result<()> {
        self.registry.register_root(root)?;
        self.push_list_changed(EntityKind::Root);
        Ok(())
    }

    /// Track a session so list-changed broadcasts (§4.2.5) and session-scoped
    /// sampling cleanup (§5) can reach it. Transports call this once per
    /// created session.
    pub fn track_session(&self, session: Arc<Session>) {
        self.sessions.insert(session.id().clone(), session);
    }

    /// Remove a session from tracking, failing any outstanding sampling
    /// requests it owned (§5: DELETE, idle eviction, stream-writer
    /// replacement).
    pub fn untrack_session(&self, id: &SessionId) {
        self.sessions.remove(id);
        self.prompt_subscribers.remove(id);
        self.correlator.cancel_session(id);
    }

    /// Best-effort push of a `notifications/<kind>/list_changed` event
    /// (§4.2.5). Tools/resources/roots broadcast to every tracked session;
    /// prompts only reach sessions that called `prompts/subscribe`. Absent
    /// any reachable session, the flag simply stays raised for the next
    /// explicit `*/list` call.
    fn push_list_changed(&self, kind: EntityKind) {
        if !self.registry.is_list_changed(kind) {
            return;
        }
        let method = match kind {
            EntityKind::Tool => "notifications/tools/list_changed",
            EntityKind::Resource => "notifications/resources/list_changed",
            EntityKind::Prompt => "notifications/prompts/list_changed",
            EntityKind::Root => "notifications/roots/list_changed",
        };
        let notification = JsonRpcNotification::new(method, None);

        let targets: Vec<Arc<Session>> = if matches!(kind, EntityKind::Prompt) {
            self.prompt_subscribers
                .iter()
                .filter_map(|e| self.sessions.get(e.key()).map(|s| Arc::clone(s.value())))
                .collect()
        } else {
            self.sessions.iter().map(|e| Arc::clone(e.value())).collect()
        };

        for session in targets {
            let _ = session.push(mcpkit_core::OutboundFrame::Notification(notification.clone()));
        }
    }

    /// The single entrypoint every transport calls for an inbound frame
    /// (§4.2 `handle_message`).
    pub async fn handle_message(self: &Arc<Self>, frame: RawFrame, session: &Arc<Session>) -> Result<Outcome> {
        if frame.jsonrpc.as_deref() != Some(mcpkit_protocol::JSONRPC_VERSION) {
            return Err(McpError::invalid_request("missing or invalid jsonrpc version").into_box());
        }

        if frame.is_request() {
            let id = frame.id.clone().expect("is_request guarantees id");
            let method = frame.method.clone().expect("is_request guarantees method");
            return self.handle_request(id, method, frame.params, session).await.map(Outcome::Response).or_else(
                |err| {
                    Ok(Outcome::Response(JsonRpcResponse::error_for((*err).into(), frame.id.unwrap())))
                },
            );
        }

        if frame.is_notification() {
            let method = frame.method.clone().expect("is_notification guarantees method");
            self.handle_notification(method, frame.params, session).await;
            return Ok(Outcome::NoReply);
        }

        if frame.is_response_shaped() {
            let id = frame.id.expect("is_response_shaped guarantees id");
            let payload = match frame.error {
                Some(error) => JsonRpcResponsePayload::Error { error },
                None => JsonRpcResponsePayload::Success { result: frame.result.unwrap_or(Value::Null) },
            };
            if self.correlator.resolve(&id, payload) {
                return Ok(Outcome::NoReply);
            }
            return Err(McpError::invalid_request("response does not match any pending request").into_box());
        }

        Err(McpError::invalid_request("frame is neither a request, notification, nor response").into_box())
    }

    async fn handle_request(
        self: &Arc<Self>,
        id: mcpkit_types::RequestId,
        method: String,
        params: Option<Value>,
        session: &Arc<Session>,
    ) -> Result<JsonRpcResponse> {
        session.require_initialized(&method).map_err(|e| e.with_id_boxed(id.clone()))?;

        let handler = self
            .request_handlers
            .get(&method)
            .map(|h| Arc::clone(&h))
            .ok_or_else(|| McpError::method_not_found(&method).with_id(id.clone()).into_box())?;

        let guard = self.inflight.begin(id.clone(), method.clone(), session.id().clone());
        session.set_current_request_id(Some(id.clone()));
        let server = Arc::clone(self);
        let session_clone = Arc::clone(session);
        let result = handler(server, session_clone, params).await;
        session.set_current_request_id(None);
        drop(guard);

        match result {
            Ok(value) => Ok(JsonRpcResponse::success(value, id)),
            Err(err) => {
                let mut err = *err;
                err.correlates_to = Some(id.clone());
                error!(method = %method, error = %err, "request handler failed");
                Ok(JsonRpcResponse::error_for(err.into(), id))
            }
        }
    }

    async fn handle_notification(self: &Arc<Self>, method: String, params: Option<Value>, session: &Arc<Session>) {
        if !session.is_initialized() && method != "initialized" && method != "initialize" {
            return;
        }
        let Some(handler) = self.notification_handlers.get(&method).map(|h| Arc::clone(&h)) else {
            return;
        };
        let server = Arc::clone(self);
        let session_clone = Arc::clone(session);
        if let Err(err) = handler(server, session_clone, params).await {
            warn!(method = %method, error = %err, "notification handler failed; swallowing (no response path)");
        }
    }
}

/// Extension so `NotInitialized`/other errors raised before an id is known
/// to the response builder can still carry it.
trait WithIdBoxed {
    fn with_id_boxed(self, id: mcpkit_types::RequestId) -> Box<McpError>;
}

impl WithIdBoxed for Box<McpError> {
    fn with_id_boxed(self, id: mcpkit_types::RequestId) -> Box<McpError> {
        let mut err = *self;
        err.correlates_to = Some(id);
        Box::new(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcpkit_core::{NullSink, RequestContext, TransportKind};
    use mcpkit_types::RequestId;
    use serde_json::json;

    fn request_frame(id: i64, method: &str, params: Option<Value>) -> RawFrame {
        RawFrame {
            jsonrpc: Some("2.0".to_string()),
            method: Some(method.to_string()),
            params,
            id: Some(RequestId::Number(id)),
            result: None,
            error: None,
        }
    }

    #[tokio::test]
    async fn ping_before_initialize_succeeds_but_tools_list_does_not() {
        let server = Server::new(ServerConfig::default());
        let session = Arc::new(Session::new(RequestContext::minimal_stdio(), Arc::new(NullSink)));

        let ping = server.handle_message(request_frame(1, "ping", None), &session).await.unwrap();
        match ping {
            Outcome::Response(resp) => assert!(resp.is_success()),
            _ => panic!("expected a response"),
        }

        let listing = server.handle_message(request_frame(2, "tools/list", None), &session).await.unwrap();
        match listing {
            Outcome::Response(resp) => assert!(!resp.is_success()),
            _ => panic!("expected a response"),
        }
    }

    #[tokio::test]
    async fn unknown_method_after_init_yields_method_not_found() {
        let server = Server::new(ServerConfig::default());
        let session = Arc::new(Session::new(RequestContext::minimal_stdio(), Arc::new(NullSink)));
        session.mark_initialized("2025-03-26".into(), "t".into());

        let outcome = server
            .handle_message(request_frame(3, "nonexistent/method", None), &session)
            .await
            .unwrap();
        match outcome {
            Outcome::Response(resp) => assert!(!resp.is_success()),
            _ => panic!("expected a response"),
        }
    }

    #[tokio::test]
    async fn notifications_never_produce_a_response() {
        let server = Server::new(ServerConfig::default());
        let session = Arc::new(Session::new(RequestContext::minimal_stdio(), Arc::new(NullSink)));
        let frame = RawFrame {
            jsonrpc: Some("2.0".to_string()),
            method: Some("initialized".to_string()),
            params: None,
            id: None,
            result: None,
            error: None,
        };
        let outcome = server.handle_message(frame, &session).await.unwrap();
        assert!(matches!(outcome, Outcome::NoReply));
    }

    #[tokio::test]
    async fn response_shaped_frame_with_unknown_id_is_invalid_request() {
        let server = Server::new(ServerConfig::default());
        let session = Arc::new(Session::new(RequestContext::minimal_stdio(), Arc::new(NullSink)));
        let frame = RawFrame {
            jsonrpc: Some("2.0".to_string()),
            method: None,
            params: None,
            id: Some(RequestId::Number(99)),
            result: Some(json!({"ok": true})),
            error: None,
        };
        let err = server.handle_message(frame, &session).await.unwrap_err();
        assert_eq!(err.kind, mcpkit_protocol::ErrorKind::InvalidRequest);
    }

    #[tokio::test]
    async fn calling_unknown_tool_reports_not_found_with_name_in_details() {
        let server = Server::new(ServerConfig::default());
        let session = Arc::new(Session::new(RequestContext::builder(TransportKind::Http).build(), Arc::new(NullSink)));
        session.mark_initialized("2025-03-26".into(), "t".into());

        let outcome = server
            .handle_message(
                request_frame(4, "tools/call", Some(json!({"name": "missing", "arguments": {}}))),
                &session,
            )
            .await
            .unwrap();
        match outcome {
            Outcome::Response(resp) => match resp.payload {
                JsonRpcResponsePayload::Error { error } => {
                    assert_eq!(error.code, mcpkit_protocol::ErrorKind::NotFound.code());
                    assert_eq!(error.data.unwrap()["details"], "missing");
                }
                _ => panic!("expected an error payload"),
            },
            _ => panic!("expected a response"),
        }
    }
}
