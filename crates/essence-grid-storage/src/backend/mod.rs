//! Pluggable durable vector-store backends.
//!
//! A backend owns the larger or persisted corpus; the engine consults it
//! through [`crate::resilient::ResilientStore`] so that backend
//! instability never cascades into request failures. Two implementations
//! ship here: a brute-force table and an HNSW-indexed store. Real
//! persistence is the backend's own concern, behind this seam.

mod flat;
mod hnsw;

pub use flat::FlatScanBackend;
pub use hnsw::HnswBackend;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use essence_grid_core::error::BackendError;
use essence_grid_core::Essence;

/// A match returned by a backend: identity, score and the compressed
/// metadata payload stored alongside the vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendHit {
    /// Identifier of the matched record.
    pub id: String,
    /// Cosine similarity in [-1.0, 1.0].
    pub score: f32,
    /// Gravitas-Pack compressed metadata stored with the vector.
    pub metadata: Vec<u8>,
}

/// Contract every durable vector-store backend implements.
///
/// All calls are async and must bound their own internal work; the
/// resilience wrapper adds per-attempt timeouts on top.
#[async_trait]
pub trait VectorBackend: Send + Sync {
    /// Short stable name for logs and health reports.
    fn name(&self) -> &'static str;

    /// Insert or replace a record.
    async fn upsert(&self, essence: Essence) -> Result<(), BackendError>;

    /// Rank stored records by cosine similarity to `query`.
    async fn search(
        &self,
        query: &[f32],
        top_k: usize,
        threshold: f32,
    ) -> Result<Vec<BackendHit>, BackendError>;

    /// Remove a record; `Ok(false)` when the id was not present.
    async fn remove(&self, id: &str) -> Result<bool, BackendError>;

    /// Number of stored records.
    async fn count(&self) -> Result<usize, BackendError>;
}
