//! HNSW-indexed backend.

use std::collections::HashMap;

use async_trait::async_trait;
use hnsw_rs::hnsw::Hnsw;
use hnsw_rs::prelude::*;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use essence_grid_core::config::HnswSettings;
use essence_grid_core::error::BackendError;
use essence_grid_core::Essence;

use super::{BackendHit, VectorBackend};

/// Layer ceiling for the graph; generous for the supported corpus sizes.
const MAX_LAYER: usize = 16;

/// Upper bound on the dead-point compensation added to each fetch.
const MAX_OVERFETCH: usize = 64;

/// Record payload kept outside the graph.
struct StoredRecord {
    id: String,
    metadata: Vec<u8>,
}

struct HnswState {
    index: Hnsw<'static, f32, DistCosine>,
    /// Live id -> graph data id.
    id_to_data: HashMap<String, usize>,
    /// Live graph data id -> payload. Absent ids are dead points.
    records: HashMap<usize, StoredRecord>,
    next_data_id: usize,
}

/// Approximate-nearest-neighbor backend over an HNSW graph.
///
/// The graph cannot delete points, so removal and updates unlink the
/// record from the id maps and leave a dead point behind; searches
/// over-fetch to compensate and filter dead points out. Rebuild by
/// constructing a fresh backend when dead points accumulate.
pub struct HnswBackend {
    dimension: usize,
    ef_search: usize,
    state: Mutex<HnswState>,
}

impl std::fmt::Debug for HnswBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("HnswBackend")
            .field("dimension", &self.dimension)
            .field("live", &state.records.len())
            .field("allocated", &state.next_data_id)
            .finish()
    }
}

impl HnswBackend {
    /// Build an empty index for vectors of `dimension`.
    pub fn new(dimension: usize, settings: &HnswSettings) -> Self {
        info!(
            dimension,
            m = settings.m,
            ef_construction = settings.ef_construction,
            ef_search = settings.ef_search,
            "hnsw backend ready"
        );
        let index = Hnsw::<f32, DistCosine>::new(
            settings.m,
            settings.max_elements,
            MAX_LAYER,
            settings.ef_construction,
            DistCosine {},
        );
        Self {
            dimension,
            ef_search: settings.ef_search,
            state: Mutex::new(HnswState {
                index,
                id_to_data: HashMap::new(),
                records: HashMap::new(),
                next_data_id: 0,
            }),
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
impl VectorBackend for HnswBackend {
    fn name(&self) -> &'static str {
        "hnsw"
    }

    async fn upsert(&self, essence: Essence) -> Result<(), BackendError> {
        self.check_dimension(essence.dimension())?;

        let vector = essence.vector.to_float().into_owned();
        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm < f32::EPSILON {
            return Err(BackendError::Index(format!(
                "zero-norm vector for id {}",
                essence.id
            )));
        }

        let mut state = self.state.lock();
        if let Some(old_data_id) = state.id_to_data.remove(&essence.id) {
            // The old point stays in the graph as a dead entry.
            state.records.remove(&old_data_id);
            warn!(id = %essence.id, "re-inserting existing id; old point becomes dead");
        }

        let data_id = state.next_data_id;
        state.next_data_id += 1;
        state.index.insert_slice((vector.as_slice(), data_id));
        state.id_to_data.insert(essence.id.clone(), data_id);
        state.records.insert(
            data_id,
            StoredRecord {
                id: essence.id,
                metadata: essence.metadata,
            },
        );
        debug!(data_id, "vector inserted into hnsw graph");
        Ok(())
    }

    async fn search(
        &self,
        query: &[f32],
        top_k: usize,
        threshold: f32,
    ) -> Result<Vec<BackendHit>, BackendError> {
        self.check_dimension(query.len())?;
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let state = self.state.lock();
        if state.records.is_empty() {
            return Ok(Vec::new());
        }

        let dead = state.next_data_id - state.records.len();
        let fetch = top_k + dead.min(MAX_OVERFETCH);
        let ef = self.ef_search.max(fetch);
        let neighbours = state.index.search(query, fetch, ef);

        let mut hits: Vec<BackendHit> = neighbours
            .into_iter()
            .filter_map(|n| {
                state.records.get(&n.d_id).and_then(|record| {
                    let score = 1.0 - n.distance;
                    (score >= threshold).then(|| BackendHit {
                        id: record.id.clone(),
                        score,
                        metadata: record.metadata.clone(),
                    })
                })
            })
            .collect();
        drop(state);

        hits.truncate(top_k);
        debug!(returned = hits.len(), "hnsw search completed");
        Ok(hits)
    }

    async fn remove(&self, id: &str) -> Result<bool, BackendError> {
        let mut state = self.state.lock();
        match state.id_to_data.remove(id) {
            Some(data_id) => {
                state.records.remove(&data_id);
                debug!(id, data_id, "record unlinked; point remains in graph");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn count(&self) -> Result<usize, BackendError> {
        Ok(self.state.lock().records.len())
    }
}
