//! Brute-force in-memory backend.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

use essence_grid_core::error::BackendError;
use essence_grid_core::Essence;

use super::{BackendHit, VectorBackend};

/// Flat table scanned in full on every search.
///
/// O(n) per query with no index maintenance; the right choice below a
/// few hundred thousand records or as a correctness reference for the
/// indexed backend.
#[derive(Debug)]
pub struct FlatScanBackend {
    dimension: usize,
    entries: RwLock<HashMap<String, Arc<Essence>>>,
}

impl FlatScanBackend {
    /// Empty table for vectors of `dimension`.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            entries: RwLock::new(HashMap::new()),
        }
    }

    fn check_dimension(&self, actual: usize) -> Result<(), BackendError> {
        if actual != self.dimension {
            return Err(BackendError::DimensionMismatch {
                expected: self.dimension,
                actual,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl VectorBackend for FlatScanBackend {
    fn name(&self) -> &'static str {
        "flat-scan"
    }

    async fn upsert(&self, essence: Essence) -> Result<(), BackendError> {
        self.check_dimension(essence.dimension())?;
        self.entries
            .write()
            .insert(essence.id.clone(), Arc::new(essence));
        Ok(())
    }

    async fn search(
        &self,
        query: &[f32],
        top_k: usize,
        threshold: f32,
    ) -> Result<Vec<BackendHit>, BackendError> {
        self.check_dimension(query.len())?;

        let entries = self.entries.read();
        let mut hits: Vec<BackendHit> = entries
            .values()
            .filter_map(|essence| {
                let score = essence.vector.cosine_to(query);
                (score >= threshold).then(|| BackendHit {
                    id: essence.id.clone(),
                    score,
                    metadata: essence.metadata.clone(),
                })
            })
            .collect();
        drop(entries);

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(top_k);
        debug!(returned = hits.len(), "flat scan completed");
        Ok(hits)
    }

    async fn remove(&self, id: &str) -> Result<bool, BackendError> {
        Ok(self.entries.write().remove(id).is_some())
    }

    async fn count(&self) -> Result<usize, BackendError> {
        Ok(self.entries.read().len())
    }
}
