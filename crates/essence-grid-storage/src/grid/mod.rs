//! Chronos-Grid: the tiered cache/index.
//!
//! Three tiers, consulted in order on lookup:
//!
//! 1. Hot buffer: fixed-capacity LRU map, O(1); every successful lookup
//!    promotes here.
//! 2. Membership filter: bit array answering "definitely absent"; never
//!    a false negative, may be a false positive, never decremented.
//! 3. Sharded store: sorted buckets with binary-search lookup; the
//!    authoritative resident set.
//!
//! One exclusive lock guards tiers 1 and 3 together: promotion during
//! lookup already mutates tier 1, so reads that can promote take the
//! write lock, and `insert`/`evict` are mutually exclusive with them by
//! construction. The filter's bits are atomic and need no lock.
//! Similarity scans only read and run under the shared lock.

mod filter;
mod hot;
mod shards;
mod stats;

#[cfg(test)]
mod tests;

pub use stats::GridStatsSnapshot;

use std::cmp::Ordering as CmpOrdering;
use std::collections::BinaryHeap;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::{debug, info};

use essence_grid_core::config::GridSettings;
use essence_grid_core::error::GridError;
use essence_grid_core::Essence;

use filter::MembershipFilter;
use hot::HotBuffer;
use shards::ShardedStore;
use stats::GridStats;

/// Tiers 1 and 3, guarded together.
#[derive(Debug)]
struct Tiers {
    hot: HotBuffer,
    shards: ShardedStore,
}

/// The tiered cache/index over resident essences.
pub struct ChronosGrid {
    dimension: usize,
    tiers: RwLock<Tiers>,
    filter: MembershipFilter,
    stats: GridStats,
}

impl std::fmt::Debug for ChronosGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChronosGrid")
            .field("dimension", &self.dimension)
            .field("resident", &self.len())
            .finish()
    }
}

impl ChronosGrid {
    /// Build a grid for vectors of `dimension` with the given tier sizes.
    pub fn new(dimension: usize, settings: &GridSettings) -> Self {
        info!(
            dimension,
            hot_capacity = settings.hot_capacity,
            filter_bits = settings.filter_bits,
            shard_count = settings.shard_count,
            "chronos-grid ready"
        );
        Self {
            dimension,
            tiers: RwLock::new(Tiers {
                hot: HotBuffer::new(settings.hot_capacity),
                shards: ShardedStore::new(settings.shard_count),
            }),
            filter: MembershipFilter::new(settings.filter_bits, settings.filter_hashes),
            stats: GridStats::default(),
        }
    }

    /// Dimensionality every resident vector must have.
    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Insert or update an essence.
    ///
    /// Write-through to the sharded store, placement in the hot buffer
    /// (evicting the coldest entry when full) and filter-bit set.
    ///
    /// # Errors
    /// [`GridError::DimensionMismatch`] when the essence's vector length
    /// disagrees with the grid.
    pub fn insert(&self, essence: Essence) -> Result<(), GridError> {
        if essence.dimension() != self.dimension {
            return Err(GridError::DimensionMismatch {
                expected: self.dimension,
                actual: essence.dimension(),
            });
        }

        let essence = Arc::new(essence);
        let mut tiers = self.tiers.write();
        let updated = tiers.shards.upsert(Arc::clone(&essence));
        tiers.hot.insert(Arc::clone(&essence));
        self.filter.set(&essence.id);
        drop(tiers);

        self.stats.inserts.fetch_add(1, Ordering::Relaxed);
        debug!(id = %essence.id, updated, "essence inserted");
        Ok(())
    }

    /// Look up an essence by id, promoting hits into the hot buffer.
    pub fn lookup(&self, id: &str) -> Option<Arc<Essence>> {
        self.stats.lookups.fetch_add(1, Ordering::Relaxed);

        // Promotion mutates tier 1, so the lookup path takes the write
        // lock even though it reads tier 3.
        let mut tiers = self.tiers.write();

        if let Some(essence) = tiers.hot.get_refresh(id) {
            self.stats.tier1_hits.fetch_add(1, Ordering::Relaxed);
            return Some(essence);
        }

        if !self.filter.might_contain(id) {
            self.stats.filter_rejections.fetch_add(1, Ordering::Relaxed);
            return None;
        }

        match tiers.shards.get(id) {
            Some(essence) => {
                self.stats.tier3_hits.fetch_add(1, Ordering::Relaxed);
                tiers.hot.insert(Arc::clone(&essence));
                Some(essence)
            }
            None => {
                // Passed the filter but not resident: an observed false
                // positive.
                self.stats
                    .filter_false_positives
                    .fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Rank residents by cosine similarity to `query`.
    ///
    /// Linear scan over every resident with a bounded min-heap keeping
    /// the best `top_k` above `threshold`; ties break toward the most
    /// recent insertion. Quantized residents are scored through the
    /// integer kernel without reconstruction.
    ///
    /// # Errors
    /// [`GridError::DimensionMismatch`] when the query length disagrees
    /// with the grid.
    pub fn similarity_search(
        &self,
        query: &[f32],
        top_k: usize,
        threshold: f32,
    ) -> Result<Vec<(Arc<Essence>, f32)>, GridError> {
        if query.len() != self.dimension {
            return Err(GridError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let tiers = self.tiers.read();
        let mut heap: BinaryHeap<std::cmp::Reverse<Candidate>> =
            BinaryHeap::with_capacity(top_k + 1);

        for essence in tiers.shards.iter() {
            let score = essence.vector.cosine_to(query);
            if score < threshold {
                continue;
            }
            let candidate = Candidate {
                score,
                inserted_at: essence.inserted_at,
                essence: Arc::clone(essence),
            };
            if heap.len() < top_k {
                heap.push(std::cmp::Reverse(candidate));
            } else if let Some(worst) = heap.peek() {
                if candidate > worst.0 {
                    heap.pop();
                    heap.push(std::cmp::Reverse(candidate));
                }
            }
        }
        drop(tiers);

        let mut ranked: Vec<Candidate> = heap.into_iter().map(|r| r.0).collect();
        ranked.sort_by(|a, b| b.cmp(a));
        Ok(ranked
            .into_iter()
            .map(|c| (c.essence, c.score))
            .collect())
    }

    /// Remove an essence from every tier.
    ///
    /// Filter bits stay set: the filter is not decrementable, so its
    /// false-positive rate only grows until
    /// [`rebuild_filter`](Self::rebuild_filter) runs.
    pub fn evict(&self, id: &str) -> bool {
        let mut tiers = self.tiers.write();
        tiers.hot.remove(id);
        let removed = tiers.shards.remove(id);
        drop(tiers);

        if removed {
            self.stats.evictions.fetch_add(1, Ordering::Relaxed);
            debug!(id, "essence evicted");
        }
        removed
    }

    /// Re-derive the membership filter from the resident set.
    ///
    /// Periodic maintenance for the accumulated false-positive rate;
    /// holds the write lock so no insert can race the re-population.
    pub fn rebuild_filter(&self) {
        let tiers = self.tiers.write();
        self.filter.reset();
        for essence in tiers.shards.iter() {
            self.filter.set(&essence.id);
        }
        info!(
            resident = tiers.shards.len(),
            population = self.filter.population(),
            "membership filter rebuilt"
        );
    }

    /// Clear every tier and reset statistics.
    pub fn flush(&self) {
        let mut tiers = self.tiers.write();
        tiers.hot.clear();
        tiers.shards.clear();
        self.filter.reset();
        self.stats.reset();
        info!("chronos-grid flushed");
    }

    /// Resident essence count.
    pub fn len(&self) -> usize {
        self.tiers.read().shards.len()
    }

    /// Whether no essences are resident.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Point-in-time statistics snapshot.
    pub fn stats(&self) -> GridStatsSnapshot {
        let tiers = self.tiers.read();
        self.stats.snapshot(
            tiers.hot.len(),
            tiers.shards.len(),
            self.filter.population(),
            self.filter.bits(),
        )
    }
}

/// Heap entry ordered by score, then by insertion recency.
struct Candidate {
    score: f32,
    inserted_at: DateTime<Utc>,
    essence: Arc<Essence>,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.score == other.score && self.inserted_at == other.inserted_at
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        // Scores are clamped cosines, never NaN; ties rank the newer
        // insertion higher.
        self.score
            .partial_cmp(&other.score)
            .unwrap_or(CmpOrdering::Equal)
            .then_with(|| self.inserted_at.cmp(&other.inserted_at))
    }
}
