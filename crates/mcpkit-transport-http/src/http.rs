//! The Streamable HTTP transport: one configurable endpoint handling POST,
//! GET, and DELETE (§4.5).
//!
//! - POST carries a JSON-RPC request or notification and returns the
//!   response in the body, unless the session is currently streaming, in
//!   which case the response goes out over SSE and the POST returns an
//!   empty 202.
//! - GET opens the `text/event-stream` channel, replaying from
//!   `Last-Event-ID` when present.
//! - DELETE terminates the session and fails its pending correlators.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context as TaskContext, Poll};
use std::time::Duration;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::Router;
use futures::Stream;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use mcpkit_core::context::{RequestContext, TransportKind};
use mcpkit_core::session::{OutboundFrame, SessionId};
use mcpkit_protocol::jsonrpc::{JsonRpcError, JsonRpcResponse, RawFrame};
use mcpkit_protocol::{McpError, Result};
use mcpkit_server::{Outcome, Server};

use crate::event_ring::RingEvent;
use crate::session_manager::{HttpSession, SessionManager, StreamItem};

const SESSION_HEADER: &str = "mcp-session-id";
const LAST_EVENT_ID_HEADER: &str = "last-event-id";

#[derive(Clone)]
struct AppState {
    server: Arc<Server>,
    sessions: Arc<SessionManager>,
}

fn build_router(server: Arc<Server>) -> (Router, Arc<SessionManager>) {
    let path = server.config().http.path.clone();
    let ring_capacity = server.config().http.event_ring_capacity;
    let sessions = Arc::new(SessionManager::new(ring_capacity));
    let state = AppState { server, sessions: Arc::clone(&sessions) };

    let router = Router::new()
        .route(&path, post(handle_post))
        .route(&path, get(handle_get))
        .route(&path, delete(handle_delete))
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024))
        .with_state(state);
    (router, sessions)
}

/// Build the axum `Router` for the transport, mounted at `config.http.path`.
/// Does not start the idle-eviction sweep; use [`serve`] for a
/// fully-managed run loop.
pub fn router(server: Arc<Server>) -> Router {
    build_router(server).0
}

/// Bind and serve the router, running the idle-eviction sweep alongside it
/// (§4.6). Returns once the listener errors or the process is torn down.
pub async fn serve(server: Arc<Server>) -> Result<()> {
    let host = server.config().http.host.clone();
    let port = server.config().http.port;
    let idle_timeout = server.config().session.idle_timeout();
    let path = server.config().http.path.clone();
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .map_err(|e| McpError::internal(format!("invalid http.host/http.port: {e}")).into_box())?;

    let (app, sessions) = build_router(Arc::clone(&server));
    tokio::spawn(run_idle_eviction(sessions, Arc::clone(&server), idle_timeout));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| McpError::internal(format!("failed to bind {addr}: {e}")).into_box())?;
    tracing::info!(%addr, %path, "mcpkit http transport listening");

    axum::serve(listener, app)
        .await
        .map_err(|e| McpError::internal(format!("http server error: {e}")).into_box())
}

async fn run_idle_eviction(sessions: Arc<SessionManager>, server: Arc<Server>, idle_timeout: Duration) {
    let mut interval = tokio::time::interval(idle_timeout);
    interval.tick().await; // first tick fires immediately; skip it
    loop {
        interval.tick().await;
        for session in sessions.evict_idle_once(idle_timeout) {
            debug!(session_id = %session.id(), "evicting idle http session");
            session.disconnect_stream();
            server.untrack_session(session.id());
        }
    }
}

fn session_header(headers: &HeaderMap) -> Option<SessionId> {
    headers.get(SESSION_HEADER).and_then(|v| v.to_str().ok()).map(|s| SessionId(s.to_string()))
}

fn last_event_id(headers: &HeaderMap) -> Option<u64> {
    headers.get(LAST_EVENT_ID_HEADER).and_then(|v| v.to_str().ok()).and_then(|s| s.parse().ok())
}

fn protocol_error(status: StatusCode, error: McpError) -> axum::response::Response {
    let body = JsonRpcResponse::error_without_id(JsonRpcError::from(&error));
    (status, axum::Json(body)).into_response()
}

/// Build a fresh context carrying this request's headers, so
/// credential-extraction strategies see the headers of the POST currently in
/// flight rather than whatever the session looked like at creation time.
fn request_context(path: &str, method: &str, headers: &HeaderMap) -> RequestContext {
    let headers: std::collections::HashMap<String, String> = headers
        .iter()
        .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string())))
        .collect();

    RequestContext::builder(TransportKind::Http).path(path).method(method).headers(headers).build()
}

async fn handle_post(State(state): State<AppState>, headers: HeaderMap, body: axum::body::Bytes) -> axum::response::Response {
    let Some(id) = session_header(&headers) else {
        return protocol_error(StatusCode::BAD_REQUEST, McpError::invalid_request("missing Mcp-Session-Id header"));
    };

    let frame: RawFrame = match serde_json::from_slice(&body) {
        Ok(frame) => frame,
        Err(e) => return protocol_error(StatusCode::BAD_REQUEST, McpError::parse(format!("invalid JSON: {e}"))),
    };

    let session = match state.sessions.get(&id) {
        Some(session) => session,
        None if frame.is_request() && frame.method.as_deref() == Some("initialize") => {
            let session = state.sessions.create(id);
            state.server.track_session(Arc::clone(&session.core));
            session
        }
        None => {
            return protocol_error(StatusCode::NOT_FOUND, McpError::invalid_request("unknown session; must initialize first"));
        }
    };

    // Serialize POSTs for this session (§4.5 Concurrency); different
    // sessions proceed in parallel since each has its own lock.
    let _guard = session.post_lock.lock().await;
    session.touch();

    let path = state.server.config().http.path.clone();
    let method = frame.method.clone().unwrap_or_default();
    session.core.set_context(request_context(&path, &method, &headers));

    let outcome = match state.server.handle_message(frame, &session.core).await {
        Ok(outcome) => outcome,
        Err(e) => return protocol_error(StatusCode::BAD_REQUEST, *e),
    };

    match outcome {
        Outcome::NoReply => StatusCode::ACCEPTED.into_response(),
        Outcome::Response(response) => {
            if session.is_streaming() {
                if let Err(e) = session.core.push(OutboundFrame::Response(response)) {
                    warn!("failed to push response to streaming session: {e}");
                }
                StatusCode::ACCEPTED.into_response()
            } else {
                axum::Json(response).into_response()
            }
        }
    }
}

struct SseStream {
    replay: std::collections::VecDeque<RingEvent>,
    rx: mpsc::UnboundedReceiver<StreamItem>,
    closed: bool,
    _guard: SseGuard,
}

struct SseGuard {
    session: Arc<HttpSession>,
    tx: mpsc::UnboundedSender<StreamItem>,
}

impl Drop for SseGuard {
    fn drop(&mut self) {
        self.session.detach_writer_if_current(&self.tx);
    }
}

fn ring_event_to_sse(event: RingEvent) -> Event {
    let payload = match &event.frame {
        OutboundFrame::Response(r) => serde_json::to_string(r),
        OutboundFrame::Notification(n) => serde_json::to_string(n),
        OutboundFrame::Request(r) => serde_json::to_string(r),
    }
    .unwrap_or_default();
    Event::default().id(event.id.to_string()).data(payload)
}

impl Stream for SseStream {
    type Item = std::result::Result<Event, Infallible>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.closed {
            return Poll::Ready(None);
        }
        if let Some(event) = this.replay.pop_front() {
            return Poll::Ready(Some(Ok(ring_event_to_sse(event))));
        }
        match this.rx.poll_recv(cx) {
            Poll::Ready(Some(StreamItem::Event(event))) => Poll::Ready(Some(Ok(ring_event_to_sse(event)))),
            Poll::Ready(Some(StreamItem::Disconnect)) => {
                this.closed = true;
                Poll::Ready(Some(Ok(Event::default().event("disconnected").data(""))))
            }
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}

async fn handle_get(State(state): State<AppState>, headers: HeaderMap) -> axum::response::Response {
    let Some(id) = session_header(&headers) else {
        return protocol_error(StatusCode::BAD_REQUEST, McpError::invalid_request("missing Mcp-Session-Id header"));
    };
    let Some(session) = state.sessions.get(&id) else {
        return protocol_error(StatusCode::NOT_FOUND, McpError::not_found("session", id.as_str()));
    };
    session.touch();

    let replay = session.replay_after(last_event_id(&headers));
    let (tx, rx) = mpsc::unbounded_channel();
    session.attach_writer(tx.clone());

    let stream = SseStream {
        replay: replay.into(),
        rx,
        closed: false,
        _guard: SseGuard { session: Arc::clone(&session), tx },
    };

    let keepalive_secs = state.server.config().http.keepalive_seconds;
    let sse = Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(keepalive_secs)).text("keep-alive"));

    let cache_control = (header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    let session_id_header = (
        HeaderName::from_static(SESSION_HEADER),
        HeaderValue::from_str(id.as_str()).unwrap_or_else(|_| HeaderValue::from_static("")),
    );
    ([cache_control, session_id_header], sse).into_response()
}

async fn handle_delete(State(state): State<AppState>, headers: HeaderMap) -> axum::response::Response {
    let Some(id) = session_header(&headers) else {
        return protocol_error(StatusCode::BAD_REQUEST, McpError::invalid_request("missing Mcp-Session-Id header"));
    };
    let Some(session) = state.sessions.remove(&id) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    session.disconnect_stream();
    state.server.untrack_session(&id);
    StatusCode::NO_CONTENT.into_response()
}
