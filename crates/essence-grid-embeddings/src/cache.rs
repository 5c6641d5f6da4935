//! Bounded LRU cache for generated vectors.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use linked_hash_map::LinkedHashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::xxh3_64;

/// 8-byte content hash of the attuned input text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct CacheKey(u64);

impl CacheKey {
    pub(crate) fn from_text(text: &str) -> Self {
        Self(xxh3_64(text.as_bytes()))
    }
}

/// Thread-safe cache metrics with atomic counters.
///
/// Relaxed ordering; exact consistency is not required for monitoring.
#[derive(Debug, Default)]
struct CacheMetrics {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl CacheMetrics {
    fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.evictions.store(0, Ordering::Relaxed);
    }
}

/// Serializable snapshot of cache activity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStatsSnapshot {
    /// Lookups served from the cache.
    pub hits: u64,
    /// Lookups that required generation.
    pub misses: u64,
    /// Entries evicted by the capacity bound.
    pub evictions: u64,
    /// Entries currently resident.
    pub size: usize,
    /// Configured capacity.
    pub capacity: usize,
    /// hits / (hits + misses), 0.0 when idle.
    pub hit_rate: f64,
}

/// LRU vector cache with a strict capacity bound.
///
/// `get` refreshes recency, so the front of the map is always the
/// coldest entry; eviction pops from the front.
#[derive(Debug)]
pub struct EssenceCache {
    entries: RwLock<LinkedHashMap<CacheKey, Arc<Vec<f32>>>>,
    capacity: usize,
    metrics: CacheMetrics,
}

impl EssenceCache {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(LinkedHashMap::new()),
            capacity,
            metrics: CacheMetrics::default(),
        }
    }

    pub(crate) fn get(&self, key: &CacheKey) -> Option<Arc<Vec<f32>>> {
        // Write lock: refreshing LRU order mutates the map.
        let mut entries = self.entries.write();
        match entries.get_refresh(key) {
            Some(vector) => {
                self.metrics.hits.fetch_add(1, Ordering::Relaxed);
                Some(Arc::clone(vector))
            }
            None => {
                self.metrics.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub(crate) fn put(&self, key: CacheKey, vector: Arc<Vec<f32>>) {
        let mut entries = self.entries.write();
        while entries.len() >= self.capacity {
            if entries.pop_front().is_none() {
                break;
            }
            self.metrics.evictions.fetch_add(1, Ordering::Relaxed);
        }
        entries.insert(key, vector);
    }

    /// Entries currently resident.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop all entries and reset counters.
    pub fn clear(&self) {
        self.entries.write().clear();
        self.metrics.reset();
    }

    /// Point-in-time statistics snapshot.
    pub fn stats(&self) -> CacheStatsSnapshot {
        let hits = self.metrics.hits.load(Ordering::Relaxed);
        let misses = self.metrics.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        CacheStatsSnapshot {
            hits,
            misses,
            evictions: self.metrics.evictions.load(Ordering::Relaxed),
            size: self.len(),
            capacity: self.capacity,
            hit_rate: if total == 0 {
                0.0
            } else {
                hits as f64 / total as f64
            },
        }
    }
}
