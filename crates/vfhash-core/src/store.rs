//! Concurrent path -> hash state map.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;

use crate::state::HashState;

/// Hash states keyed by virtual path.
///
/// Backed by a sharded map: writers to the same path are serialized by the
/// shard lock, readers clone the state out under a short read lock, so a
/// reader never sees a partially written digest. Entries are never evicted
/// implicitly.
#[derive(Debug, Default)]
pub struct HashStore {
    entries: DashMap<String, HashState>,
}

/// Entry counts per state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub pending: u64,
    pub ready: u64,
    pub missing: u64,
    pub read_errors: u64,
    pub cancelled: u64,
    /// Paths waiting in the fetch queue
    pub queued: u64,
}

impl StoreStats {
    pub fn total(&self) -> u64 {
        self.pending + self.ready + self.missing + self.read_errors + self.cancelled
    }
}

impl HashStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert; the last write wins
    pub fn put(&self, path: impl Into<String>, state: HashState) {
        self.entries.insert(path.into(), state);
    }

    pub fn get(&self, path: &str) -> Option<HashState> {
        self.entries.get(path).map(|entry| entry.value().clone())
    }

    /// True when the path is known and no longer pending
    pub fn is_ready(&self, path: &str) -> bool {
        self.entries
            .get(path)
            .is_some_and(|entry| entry.value().is_terminal())
    }

    /// Move a still-pending path to `Cancelled`. Returns whether it moved.
    pub fn cancel_if_pending(&self, path: &str) -> bool {
        match self.entries.get_mut(path) {
            Some(mut entry) if entry.is_pending() => {
                *entry = HashState::Cancelled;
                true
            }
            _ => false,
        }
    }

    /// Remove and return a terminal entry; pending entries stay.
    pub fn take_terminal(&self, path: &str) -> Option<HashState> {
        match self.entries.entry(path.to_string()) {
            Entry::Occupied(entry) if entry.get().is_terminal() => Some(entry.remove()),
            _ => None,
        }
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Count entries per state. Not a point-in-time snapshot under concurrent writes.
    pub fn stats(&self) -> StoreStats {
        let mut stats = StoreStats::default();
        for entry in self.entries.iter() {
            match entry.value() {
                HashState::Pending => stats.pending += 1,
                HashState::Ready(_) => stats.ready += 1,
                HashState::Missing => stats.missing += 1,
                HashState::ReadError { .. } => stats.read_errors += 1,
                HashState::Cancelled => stats.cancelled += 1,
            }
        }
        stats
    }
}
