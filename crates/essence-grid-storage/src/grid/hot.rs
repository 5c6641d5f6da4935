//! Tier 1: the hot buffer.

use std::sync::Arc;

use linked_hash_map::LinkedHashMap;

use essence_grid_core::Essence;

/// Fixed-capacity most-recently-used buffer with strict LRU eviction.
///
/// Entries share the tier-3 `Arc`, so the buffer costs one pointer per
/// hot id, not a copy of the essence.
#[derive(Debug)]
pub(super) struct HotBuffer {
    entries: LinkedHashMap<String, Arc<Essence>>,
    capacity: usize,
}

impl HotBuffer {
    pub(super) fn new(capacity: usize) -> Self {
        Self {
            entries: LinkedHashMap::new(),
            capacity,
        }
    }

    /// Fetch and refresh recency.
    pub(super) fn get_refresh(&mut self, id: &str) -> Option<Arc<Essence>> {
        self.entries.get_refresh(id).map(|e| Arc::clone(e))
    }

    /// Place an essence, evicting the coldest entry when full.
    pub(super) fn insert(&mut self, essence: Arc<Essence>) {
        if !self.entries.contains_key(&essence.id) {
            while self.entries.len() >= self.capacity {
                if self.entries.pop_front().is_none() {
                    break;
                }
            }
        }
        self.entries.insert(essence.id.clone(), essence);
    }

    pub(super) fn remove(&mut self, id: &str) -> bool {
        self.entries.remove(id).is_some()
    }

    pub(super) fn clear(&mut self) {
        self.entries.clear();
    }

    pub(super) fn len(&self) -> usize {
        self.entries.len()
    }
}
