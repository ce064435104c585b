//! Bounded per-session outbound event ring (§4.5, §4.6).
//!
//! Every outbound message is assigned a monotonically increasing id and
//! recorded here before (optionally) being forwarded to a live SSE writer.
//! On reconnect, `Last-Event-ID` replay serves whatever the ring still
//! holds; ids older than the retained window are simply not replayed. The
//! ring advances, it does not gap-fill — a client that falls far enough
//! behind sees a jump in ids rather than a stall waiting for evicted
//! events to reappear.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use mcpkit_core::session::OutboundFrame;

/// One ring entry: its assigned event id and the frame it carries.
#[derive(Debug, Clone)]
pub struct RingEvent {
    pub id: u64,
    pub frame: OutboundFrame,
}

/// A fixed-capacity FIFO of `RingEvent`s, oldest evicted on overflow.
#[derive(Debug)]
pub struct EventRing {
    capacity: usize,
    next_id: AtomicU64,
    buffer: Mutex<VecDeque<RingEvent>>,
}

impl EventRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            next_id: AtomicU64::new(1),
            buffer: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Assign the next id to `frame`, record it, and return the event.
    pub fn push(&self, frame: OutboundFrame) -> RingEvent {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let event = RingEvent { id, frame };

        let mut buffer = self.buffer.lock();
        if buffer.len() >= self.capacity {
            buffer.pop_front();
        }
        buffer.push_back(event.clone());
        event
    }

    /// Events strictly after `last_id`, in id order. `None` (no
    /// `Last-Event-ID` supplied) yields nothing: a fresh connection only
    /// sees events that arrive after it attaches.
    pub fn replay_after(&self, last_id: Option<u64>) -> Vec<RingEvent> {
        let Some(last_id) = last_id else {
            return Vec::new();
        };
        self.buffer.lock().iter().filter(|e| e.id > last_id).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcpkit_protocol::jsonrpc::JsonRpcNotification;

    fn notify(method: &str) -> OutboundFrame {
        OutboundFrame::Notification(JsonRpcNotification::new(method, None))
    }

    #[test]
    fn ids_are_monotonic_and_start_at_one() {
        let ring = EventRing::new(4);
        let a = ring.push(notify("a"));
        let b = ring.push(notify("b"));
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
    }

    #[test]
    fn overflow_evicts_the_oldest_entry() {
        let ring = EventRing::new(2);
        ring.push(notify("a"));
        ring.push(notify("b"));
        ring.push(notify("c"));
        let all = ring.replay_after(Some(0));
        let ids: Vec<u64> = all.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn replay_after_returns_only_strictly_newer_events() {
        let ring = EventRing::new(8);
        ring.push(notify("a"));
        let b = ring.push(notify("b"));
        let replayed = ring.replay_after(Some(b.id - 1));
        assert_eq!(replayed.len(), 1);
        assert_eq!(replayed[0].id, b.id);
    }

    #[test]
    fn replay_after_an_evicted_id_advances_without_gap_filling() {
        let ring = EventRing::new(2);
        ring.push(notify("a"));
        ring.push(notify("b"));
        ring.push(notify("c"));
        // id 1 ("a") was evicted; replay still returns what remains rather
        // than failing or blocking on the gap.
        let replayed = ring.replay_after(Some(1));
        let ids: Vec<u64> = replayed.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn no_last_event_id_means_no_replay() {
        let ring = EventRing::new(4);
        ring.push(notify("a"));
        assert!(ring.replay_after(None).is_empty());
    }
}
