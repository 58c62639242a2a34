//! LRU index over decoded tile content.
//!
//! Indefinite retention of decoded content defeats the purpose of LOD
//! streaming, so the engine keeps an LRU index by approximate byte size.
//! The cache only tracks and ranks; the engine decides which candidates are
//! actually evictable (attached content never is) and drops the data.

use std::collections::HashMap;

use tracing::debug;

use crate::tree::NodeId;

/// Default decoded-content budget: 512 MiB.
pub const DEFAULT_CONTENT_BUDGET: usize = 512 * 1024 * 1024;

#[derive(Debug, Clone, Copy)]
struct Entry {
    bytes: usize,
    /// Logical clock tick of the last touch; monotonic per cache.
    last_touch: u64,
}

/// Byte-budgeted LRU index of decoded content, keyed by tile node.
#[derive(Debug)]
pub struct ContentCache {
    entries: HashMap<NodeId, Entry>,
    clock: u64,
    budget_bytes: usize,
    total_bytes: usize,
}

impl ContentCache {
    pub fn new(budget_bytes: usize) -> Self {
        Self {
            entries: HashMap::new(),
            clock: 0,
            budget_bytes,
            total_bytes: 0,
        }
    }

    /// Record newly decoded content (or replace the previous size).
    pub fn insert(&mut self, id: NodeId, bytes: usize) {
        self.clock += 1;
        if let Some(old) = self.entries.insert(
            id,
            Entry {
                bytes,
                last_touch: self.clock,
            },
        ) {
            self.total_bytes -= old.bytes;
        }
        self.total_bytes += bytes;
    }

    /// Mark content as recently used.
    pub fn touch(&mut self, id: NodeId) {
        self.clock += 1;
        let clock = self.clock;
        if let Some(entry) = self.entries.get_mut(&id) {
            entry.last_touch = clock;
        }
    }

    /// Forget evicted or destroyed content.
    pub fn remove(&mut self, id: NodeId) {
        if let Some(entry) = self.entries.remove(&id) {
            self.total_bytes -= entry.bytes;
            debug!(node = id.index(), bytes = entry.bytes, "content evicted from cache index");
        }
    }

    pub fn total_bytes(&self) -> usize {
        self.total_bytes
    }

    pub fn budget_bytes(&self) -> usize {
        self.budget_bytes
    }

    pub fn over_budget(&self) -> bool {
        self.total_bytes > self.budget_bytes
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Tracked nodes in least-recently-touched order.
    pub fn lru_order(&self) -> Vec<NodeId> {
        let mut ids: Vec<_> = self.entries.iter().collect();
        ids.sort_by_key(|(_, e)| e.last_touch);
        ids.into_iter().map(|(id, _)| *id).collect()
    }
}
