//! Chronos-Grid statistics.
//!
//! Counters live with the grid instance (created with it, reset only via
//! flush), not as ambient global state.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Atomic grid counters.
#[derive(Debug, Default)]
pub(super) struct GridStats {
    pub(super) lookups: AtomicU64,
    pub(super) tier1_hits: AtomicU64,
    pub(super) tier3_hits: AtomicU64,
    pub(super) filter_rejections: AtomicU64,
    pub(super) filter_false_positives: AtomicU64,
    pub(super) inserts: AtomicU64,
    pub(super) evictions: AtomicU64,
}

impl GridStats {
    pub(super) fn reset(&self) {
        self.lookups.store(0, Ordering::Relaxed);
        self.tier1_hits.store(0, Ordering::Relaxed);
        self.tier3_hits.store(0, Ordering::Relaxed);
        self.filter_rejections.store(0, Ordering::Relaxed);
        self.filter_false_positives.store(0, Ordering::Relaxed);
        self.inserts.store(0, Ordering::Relaxed);
        self.evictions.store(0, Ordering::Relaxed);
    }
}

/// Serializable point-in-time view of grid activity and occupancy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridStatsSnapshot {
    /// Total lookup calls.
    pub total_lookups: u64,
    /// Lookups answered by the hot buffer.
    pub tier1_hits: u64,
    /// Lookups answered by the sharded store.
    pub tier3_hits: u64,
    /// Lookups short-circuited by the membership filter.
    pub filter_rejections: u64,
    /// Lookups that passed the filter but missed the sharded store.
    pub filter_false_positives: u64,
    /// Insert calls (including updates).
    pub inserts: u64,
    /// Explicit evictions.
    pub evictions: u64,
    /// tier1_hits / total_lookups, 0.0 when idle.
    pub tier1_hit_rate: f64,
    /// Current hot-buffer occupancy.
    pub hot_occupancy: usize,
    /// Current resident count (sharded store).
    pub resident: usize,
    /// Set bits in the membership filter.
    pub filter_population: usize,
    /// Membership filter size in bits.
    pub filter_bits: usize,
}

impl GridStats {
    pub(super) fn snapshot(
        &self,
        hot_occupancy: usize,
        resident: usize,
        filter_population: usize,
        filter_bits: usize,
    ) -> GridStatsSnapshot {
        let total_lookups = self.lookups.load(Ordering::Relaxed);
        let tier1_hits = self.tier1_hits.load(Ordering::Relaxed);
        GridStatsSnapshot {
            total_lookups,
            tier1_hits,
            tier3_hits: self.tier3_hits.load(Ordering::Relaxed),
            filter_rejections: self.filter_rejections.load(Ordering::Relaxed),
            filter_false_positives: self.filter_false_positives.load(Ordering::Relaxed),
            inserts: self.inserts.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            tier1_hit_rate: if total_lookups == 0 {
                0.0
            } else {
                tier1_hits as f64 / total_lookups as f64
            },
            hot_occupancy,
            resident,
            filter_population,
            filter_bits,
        }
    }
}
