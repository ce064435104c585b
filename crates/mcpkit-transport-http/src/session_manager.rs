//! Per-connection HTTP session state and the manager that owns the whole
//! table (§4.5, §4.6).

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::mpsc;

use dashmap::DashMap;

use mcpkit_core::context::{RequestContext, TransportKind};
use mcpkit_core::session::{OutboundFrame, Session, SessionId, SessionSink};
use mcpkit_protocol::Result;

use crate::event_ring::EventRing;

/// One item handed to an attached SSE writer: either a live event or a
/// directive to close the stream because a newer GET displaced it.
#[derive(Debug, Clone)]
pub enum StreamItem {
    Event(crate::event_ring::RingEvent),
    Disconnect,
}

/// The `SessionSink` side of an HTTP session: every push is recorded into
/// the event ring and, if a writer is currently attached, forwarded to it.
#[derive(Debug)]
struct HttpSink {
    ring: EventRing,
    writer: Mutex<Option<mpsc::UnboundedSender<StreamItem>>>,
}

impl HttpSink {
    fn new(ring_capacity: usize) -> Self {
        Self { ring: EventRing::new(ring_capacity), writer: Mutex::new(None) }
    }
}

impl SessionSink for HttpSink {
    fn push(&self, frame: OutboundFrame) -> Result<()> {
        let event = self.ring.push(frame);
        if let Some(tx) = self.writer.lock().as_ref() {
            let _ = tx.send(StreamItem::Event(event));
        }
        Ok(())
    }
}

/// One tracked HTTP session: the core `Session`, its HTTP-specific sink,
/// idle bookkeeping, and the lock serializing POSTs for this session
/// (§4.5 Concurrency: "inbound POSTs for the same session are serialized").
#[derive(Debug)]
pub struct HttpSession {
    pub core: Arc<Session>,
    sink: Arc<HttpSink>,
    last_seen: Mutex<Instant>,
    pub post_lock: tokio::sync::Mutex<()>,
}

impl HttpSession {
    fn new(id: SessionId, ring_capacity: usize) -> Self {
        let sink = Arc::new(HttpSink::new(ring_capacity));
        let context = RequestContext::builder(TransportKind::Http).path("http").build();
        let core = Arc::new(Session::new(context, sink.clone()).with_id(id));
        Self { core, sink, last_seen: Mutex::new(Instant::now()), post_lock: tokio::sync::Mutex::new(()) }
    }

    pub fn id(&self) -> &SessionId {
        self.core.id()
    }

    pub fn is_streaming(&self) -> bool {
        self.sink.writer.lock().is_some()
    }

    pub fn replay_after(&self, last_id: Option<u64>) -> Vec<crate::event_ring::RingEvent> {
        self.sink.ring.replay_after(last_id)
    }

    /// Attach a fresh writer, displacing and disconnecting whichever one was
    /// attached before (§4.5: "a second GET displaces the first").
    pub fn attach_writer(&self, tx: mpsc::UnboundedSender<StreamItem>) {
        let previous = self.sink.writer.lock().replace(tx);
        if let Some(previous) = previous {
            let _ = previous.send(StreamItem::Disconnect);
        }
    }

    /// Clear the writer slot only if it's still `tx` — a displaced writer's
    /// own cleanup must not clobber whatever displaced it.
    pub fn detach_writer_if_current(&self, tx: &mpsc::UnboundedSender<StreamItem>) {
        let mut writer = self.sink.writer.lock();
        if writer.as_ref().is_some_and(|current| current.same_channel(tx)) {
            *writer = None;
        }
    }

    /// Tell the attached writer (if any) to close, without waiting for
    /// eviction or DELETE to clear the slot itself.
    pub fn disconnect_stream(&self) {
        if let Some(tx) = self.sink.writer.lock().as_ref() {
            let _ = tx.send(StreamItem::Disconnect);
        }
    }

    pub fn touch(&self) {
        *self.last_seen.lock() = Instant::now();
    }

    fn idle_for(&self) -> Duration {
        self.last_seen.lock().elapsed()
    }
}

/// Owns every live `HttpSession`, keyed by the `Mcp-Session-Id` the client
/// supplied (§4.6).
#[derive(Debug)]
pub struct SessionManager {
    sessions: DashMap<SessionId, Arc<HttpSession>>,
    ring_capacity: usize,
}

impl SessionManager {
    pub fn new(ring_capacity: usize) -> Self {
        Self { sessions: DashMap::new(), ring_capacity }
    }

    pub fn get(&self, id: &SessionId) -> Option<Arc<HttpSession>> {
        self.sessions.get(id).map(|s| Arc::clone(s.value()))
    }

    /// Create and track a new session under the client-supplied id. Only
    /// called when a POST's method is `initialize` and no session with this
    /// id exists yet (§4.5).
    pub fn create(&self, id: SessionId) -> Arc<HttpSession> {
        let session = Arc::new(HttpSession::new(id.clone(), self.ring_capacity));
        self.sessions.insert(id, Arc::clone(&session));
        session
    }

    pub fn remove(&self, id: &SessionId) -> Option<Arc<HttpSession>> {
        self.sessions.remove(id).map(|(_, s)| s)
    }

    /// Remove and return every session idle for at least `idle_timeout`.
    /// The caller is responsible for untracking them on the dispatcher and
    /// cancelling any attached stream (§4.6 idle eviction).
    pub fn evict_idle_once(&self, idle_timeout: Duration) -> Vec<Arc<HttpSession>> {
        let stale: Vec<SessionId> = self
            .sessions
            .iter()
            .filter(|e| e.value().idle_for() >= idle_timeout)
            .map(|e| e.key().clone())
            .collect();

        stale.into_iter().filter_map(|id| self.remove(&id)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_then_get_round_trips() {
        let manager = SessionManager::new(16);
        let id = SessionId("s1".into());
        let created = manager.create(id.clone());
        assert!(Arc::ptr_eq(&created, &manager.get(&id).unwrap()));
    }

    #[test]
    fn remove_drops_the_session_from_the_table() {
        let manager = SessionManager::new(16);
        let id = SessionId("s1".into());
        manager.create(id.clone());
        assert!(manager.remove(&id).is_some());
        assert!(manager.get(&id).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn idle_eviction_only_catches_sessions_past_the_timeout() {
        let manager = SessionManager::new(16);
        let stale = SessionId("stale".into());
        let fresh = SessionId("fresh".into());
        manager.create(stale.clone());
        tokio::time::advance(Duration::from_secs(10)).await;
        manager.create(fresh.clone());

        let evicted = manager.evict_idle_once(Duration::from_secs(5));
        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0].id(), &stale);
        assert!(manager.get(&fresh).is_some());
    }

    #[test]
    fn attaching_a_second_writer_disconnects_the_first() {
        let session = Arc::new(HttpSession::new(SessionId("s1".into()), 16));
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, _rx2) = mpsc::unbounded_channel();

        session.attach_writer(tx1);
        assert!(session.is_streaming());
        session.attach_writer(tx2);

        match rx1.try_recv() {
            Ok(StreamItem::Disconnect) => {}
            other => panic!("expected a disconnect for the displaced writer, got {other:?}"),
        }
    }

    #[test]
    fn detach_if_current_ignores_a_stale_writer() {
        let session = Arc::new(HttpSession::new(SessionId("s1".into()), 16));
        let (tx1, _rx1) = mpsc::unbounded_channel();
        let (tx2, _rx2) = mpsc::unbounded_channel();
        session.attach_writer(tx1.clone());
        session.attach_writer(tx2);

        // tx1 was already displaced; its own cleanup must not clear tx2.
        session.detach_writer_if_current(&tx1);
        assert!(session.is_streaming());
    }
}
