//! Tier 2: the membership filter.

use std::sync::atomic::{AtomicU64, Ordering};

use xxhash_rust::xxh3::xxh3_64_with_seed;

/// Fixed-size bit array answering "definitely absent" in O(1).
///
/// No false negatives; false positives grow with population because bits
/// are never cleared on eviction (the filter is not decrementable).
/// [`reset`](Self::reset) plus re-population is the rebuild path.
///
/// Bits live in atomics, so set/test need no lock of their own; tier
/// coordination is the grid's concern.
#[derive(Debug)]
pub(super) struct MembershipFilter {
    words: Vec<AtomicU64>,
    bits: usize,
    hashes: usize,
}

impl MembershipFilter {
    pub(super) fn new(bits: usize, hashes: usize) -> Self {
        let word_count = bits.div_ceil(64);
        Self {
            words: (0..word_count).map(|_| AtomicU64::new(0)).collect(),
            bits,
            hashes,
        }
    }

    #[inline]
    fn slot(&self, id: &str, seed: u64) -> (usize, u64) {
        let bit = (xxh3_64_with_seed(id.as_bytes(), seed) % self.bits as u64) as usize;
        (bit / 64, 1u64 << (bit % 64))
    }

    /// Set this id's bits.
    pub(super) fn set(&self, id: &str) {
        for seed in 0..self.hashes as u64 {
            let (word, mask) = self.slot(id, seed);
            self.words[word].fetch_or(mask, Ordering::Relaxed);
        }
    }

    /// `false` means the id is definitely not resident; `true` means it
    /// may be.
    pub(super) fn might_contain(&self, id: &str) -> bool {
        (0..self.hashes as u64).all(|seed| {
            let (word, mask) = self.slot(id, seed);
            self.words[word].load(Ordering::Relaxed) & mask != 0
        })
    }

    /// Clear every bit.
    pub(super) fn reset(&self) {
        for word in &self.words {
            word.store(0, Ordering::Relaxed);
        }
    }

    /// Number of set bits, for saturation monitoring.
    pub(super) fn population(&self) -> usize {
        self.words
            .iter()
            .map(|w| w.load(Ordering::Relaxed).count_ones() as usize)
            .sum()
    }

    pub(super) fn bits(&self) -> usize {
        self.bits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_ids_are_never_reported_absent() {
        let filter = MembershipFilter::new(512, 2);
        let ids: Vec<String> = (0..64).map(|i| format!("doc-{i}")).collect();
        for id in &ids {
            filter.set(id);
        }
        for id in &ids {
            assert!(filter.might_contain(id), "false negative for {id}");
        }
    }

    #[test]
    fn fresh_filter_rejects_everything() {
        let filter = MembershipFilter::new(512, 2);
        assert!(!filter.might_contain("anything"));
        assert_eq!(filter.population(), 0);
    }

    #[test]
    fn reset_clears_population() {
        let filter = MembershipFilter::new(512, 2);
        filter.set("doc-1");
        assert!(filter.population() > 0);
        filter.reset();
        assert_eq!(filter.population(), 0);
        assert!(!filter.might_contain("doc-1"));
    }

    #[test]
    fn odd_bit_sizes_round_up_to_whole_words() {
        let filter = MembershipFilter::new(100, 3);
        filter.set("x");
        assert!(filter.might_contain("x"));
        assert_eq!(filter.bits(), 100);
    }
}
