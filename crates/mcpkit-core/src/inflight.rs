//! The in-flight request table (§3 In-flight request table).
//!
//! Keyed by JSON-RPC request id; an entry exists for the full duration of a
//! request and is removed in a guaranteed-release scope around the handler
//! call, so cancellation or a handler panic can never leak an entry.

use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use mcpkit_types::RequestId;

use crate::session::SessionId;

/// Metadata recorded for one in-flight request.
#[derive(Debug, Clone)]
pub struct InFlightEntry {
    pub method: String,
    pub started_at: Instant,
    pub session_id: SessionId,
}

/// The table itself. Sharded by `DashMap`'s internal bucketing, so
/// concurrent requests on different ids never contend (§5).
#[derive(Debug, Default)]
pub struct InFlightTable {
    entries: DashMap<RequestId, InFlightEntry>,
}

impl InFlightTable {
    pub fn new() -> Self {
        Self { entries: DashMap::new() }
    }

    /// Register an in-flight request and return a guard that removes the
    /// entry on drop — including on an early return or panic unwind — so the
    /// table can never leak an entry for a request that stopped executing.
    pub fn begin(self: &Arc<Self>, id: RequestId, method: impl Into<String>, session_id: SessionId) -> InFlightGuard {
        self.entries.insert(
            id.clone(),
            InFlightEntry {
                method: method.into(),
                started_at: Instant::now(),
                session_id,
            },
        );
        InFlightGuard {
            table: Arc::clone(self),
            id,
            released: false,
        }
    }

    /// Whether an id is currently in-flight (used by cancel notifications).
    pub fn contains(&self, id: &RequestId) -> bool {
        self.entries.contains_key(id)
    }

    /// Best-effort removal on receipt of a cancel notification (§5).
    pub fn cancel(&self, id: &RequestId) -> Option<InFlightEntry> {
        self.entries.remove(id).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// RAII guard releasing an in-flight table entry. Dropping it (including via
/// panic unwind) removes the entry exactly once.
#[derive(Debug)]
pub struct InFlightGuard {
    table: Arc<InFlightTable>,
    id: RequestId,
    released: bool,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if !self.released {
            self.table.entries.remove(&self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_removes_entry_on_drop() {
        let table = Arc::new(InFlightTable::new());
        let id = RequestId::Number(1);
        {
            let _guard = table.begin(id.clone(), "tools/call", SessionId::new());
            assert!(table.contains(&id));
        }
        assert!(!table.contains(&id));
    }

    #[test]
    fn guard_removes_entry_even_on_unwind() {
        let table = Arc::new(InFlightTable::new());
        let id = RequestId::Number(2);
        let table_clone = Arc::clone(&table);
        let id_clone = id.clone();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let _guard = table_clone.begin(id_clone, "tools/call", SessionId::new());
            panic!("simulated handler panic");
        }));
        assert!(result.is_err());
        assert!(!table.contains(&id));
    }
}
