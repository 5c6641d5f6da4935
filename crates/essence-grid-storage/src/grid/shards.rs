//! Tier 3: the sharded sorted store.

use std::sync::Arc;

use xxhash_rust::xxh3::xxh3_64;

use essence_grid_core::Essence;

/// Authoritative resident store: a fixed number of buckets, each sorted
/// by id for binary-search lookup.
#[derive(Debug)]
pub(super) struct ShardedStore {
    buckets: Vec<Vec<Arc<Essence>>>,
    len: usize,
}

impl ShardedStore {
    pub(super) fn new(shard_count: usize) -> Self {
        Self {
            buckets: (0..shard_count).map(|_| Vec::new()).collect(),
            len: 0,
        }
    }

    #[inline]
    fn bucket_of(&self, id: &str) -> usize {
        (xxh3_64(id.as_bytes()) % self.buckets.len() as u64) as usize
    }

    /// Insert or replace, keeping the bucket sorted.
    /// Returns `true` when an existing id was updated.
    pub(super) fn upsert(&mut self, essence: Arc<Essence>) -> bool {
        let bucket = self.bucket_of(&essence.id);
        let entries = &mut self.buckets[bucket];
        match entries.binary_search_by(|e| e.id.as_str().cmp(&essence.id)) {
            Ok(pos) => {
                entries[pos] = essence;
                true
            }
            Err(pos) => {
                entries.insert(pos, essence);
                self.len += 1;
                false
            }
        }
    }

    pub(super) fn get(&self, id: &str) -> Option<Arc<Essence>> {
        let entries = &self.buckets[self.bucket_of(id)];
        entries
            .binary_search_by(|e| e.id.as_str().cmp(id))
            .ok()
            .map(|pos| Arc::clone(&entries[pos]))
    }

    pub(super) fn remove(&mut self, id: &str) -> bool {
        let bucket = self.bucket_of(id);
        let entries = &mut self.buckets[bucket];
        match entries.binary_search_by(|e| e.id.as_str().cmp(id)) {
            Ok(pos) => {
                entries.remove(pos);
                self.len -= 1;
                true
            }
            Err(_) => false,
        }
    }

    /// All residents, bucket by bucket.
    pub(super) fn iter(&self) -> impl Iterator<Item = &Arc<Essence>> {
        self.buckets.iter().flatten()
    }

    pub(super) fn clear(&mut self) {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
        self.len = 0;
    }

    pub(super) fn len(&self) -> usize {
        self.len
    }
}
