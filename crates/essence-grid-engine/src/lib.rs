//! The essence-grid search engine facade.
//!
//! Ties the deterministic embedding generator, the Gravitas-Pack
//! metadata compressor, the Chronos-Grid tiers and the optional
//! resilient durable backend into the four operations the API layer
//! consumes: [`SearchEngine::ingest`], [`SearchEngine::query`],
//! [`SearchEngine::flush`] and [`SearchEngine::stats`].
//!
//! Backend instability never fails a query: when the circuit is open or
//! the backend keeps failing, semantic queries serve local-tier results
//! and mark the response degraded.

mod intent;

pub use intent::{IntentRefiner, SearchIntent};

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use essence_grid_core::config::BackendKind;
use essence_grid_core::pack::{GravitasPacker, PackStatsSnapshot};
use essence_grid_core::quantization::quantize;
use essence_grid_core::{EngineConfig, Essence, Record, Result, VectorData};
use essence_grid_embeddings::{CacheStatsSnapshot, EmbeddingGenerator};
use essence_grid_storage::{
    ChronosGrid, FlatScanBackend, GridStatsSnapshot, HealthReport, HnswBackend, ResilientStore,
    VectorBackend,
};

// ============================================================================
// REQUEST / RESPONSE TYPES
// ============================================================================

/// How a query string is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QueryMode {
    /// The query string is an essence id; answered by tier lookup.
    ExactId,
    /// The query string is text; answered by similarity search.
    Semantic,
    /// Semantic search plus intent-derived keyword boosting.
    Hybrid,
}

impl FromStr for QueryMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "exact-id" | "exact" => Ok(Self::ExactId),
            "semantic" => Ok(Self::Semantic),
            "hybrid" => Ok(Self::Hybrid),
            other => Err(format!(
                "unknown query mode '{other}', expected exact-id|semantic|hybrid"
            )),
        }
    }
}

/// One ranked answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryHit {
    /// Essence identifier.
    pub id: String,
    /// Similarity score; 1.0 for exact-id hits.
    pub score: f32,
    /// Decompressed metadata record.
    pub metadata: Record,
}

/// A ranked result list plus degradation signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Hits, best first.
    pub hits: Vec<QueryHit>,
    /// True when the durable backend could not contribute and the
    /// answer came from local tiers only (possibly reduced recall).
    pub degraded: bool,
    /// The intent-refined query, for hybrid mode.
    pub refined_query: Option<String>,
}

/// Aggregated counters for the monitoring layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineStats {
    /// Chronos-Grid tier counters and occupancy.
    pub grid: GridStatsSnapshot,
    /// Embedding result cache counters.
    pub embedding_cache: CacheStatsSnapshot,
    /// Gravitas-Pack compression counters.
    pub pack: PackStatsSnapshot,
    /// Breaker health of the durable backend, when one is configured.
    pub backend: Option<HealthReport>,
}

// ============================================================================
// ENGINE
// ============================================================================

/// Hybrid-mode score bonus for a hit matching every query keyword.
const KEYWORD_BOOST: f32 = 0.1;

/// The assembled search engine.
pub struct SearchEngine {
    config: EngineConfig,
    generator: EmbeddingGenerator,
    packer: GravitasPacker,
    grid: ChronosGrid,
    refiner: IntentRefiner,
    durable: Option<ResilientStore>,
}

impl std::fmt::Debug for SearchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchEngine")
            .field("dimension", &self.config.embedding.dimension)
            .field("resident", &self.grid.len())
            .field("durable", &self.durable.is_some())
            .finish()
    }
}

impl SearchEngine {
    /// Build an engine from validated configuration, constructing the
    /// configured backend kind.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let dimension = config.embedding.dimension;
        let backend: Option<Arc<dyn VectorBackend>> = match config.backend.kind {
            BackendKind::None => None,
            BackendKind::FlatScan => Some(Arc::new(FlatScanBackend::new(dimension))),
            BackendKind::Hnsw => Some(Arc::new(HnswBackend::new(dimension, &config.hnsw))),
        };
        Self::assemble(config, backend)
    }

    /// Build an engine around a caller-supplied backend.
    pub fn with_backend(config: EngineConfig, backend: Arc<dyn VectorBackend>) -> Result<Self> {
        config.validate()?;
        Self::assemble(config, Some(backend))
    }

    fn assemble(
        config: EngineConfig,
        backend: Option<Arc<dyn VectorBackend>>,
    ) -> Result<Self> {
        let generator = EmbeddingGenerator::new(&config.embedding);
        let grid = ChronosGrid::new(config.embedding.dimension, &config.grid);
        let durable = backend.map(|backend| {
            info!(backend = backend.name(), "durable backend attached");
            ResilientStore::new(backend, &config.breaker, &config.retry)
        });
        Ok(Self {
            config,
            generator,
            packer: GravitasPacker::new(),
            grid,
            refiner: IntentRefiner::new(),
            durable,
        })
    }

    /// Index a document: vectorize, optionally quantize, compress
    /// metadata, insert locally and write through to the durable backend.
    ///
    /// A failing backend downgrades the write to local-only with a
    /// warning once the local insert has succeeded; structural errors
    /// (dimension mismatch, oversized metadata) surface synchronously.
    pub async fn ingest(&self, id: &str, text: &str, metadata: Record) -> Result<()> {
        let vector = self.generator.generate(text);
        let packed = self.packer.compress(&metadata)?;

        let vector_data = if self.config.quantization.enabled {
            VectorData::Quantized(quantize(&vector)?)
        } else {
            VectorData::Float(vector.as_ref().clone())
        };

        let essence = Essence::new(id, vector_data, packed);
        self.grid.insert(essence.clone())?;
        debug!(id, "essence indexed locally");

        if let Some(store) = &self.durable {
            if let Err(err) = store.upsert(essence).await {
                if err.is_degraded_capability() {
                    warn!(id, error = %err, "durable write skipped; serving from local tiers");
                } else {
                    return Err(err.into());
                }
            }
        }
        Ok(())
    }

    /// Answer a query in the requested mode.
    pub async fn query(
        &self,
        text: &str,
        mode: QueryMode,
        top_k: usize,
        threshold: f32,
    ) -> Result<QueryResponse> {
        match mode {
            QueryMode::ExactId => self.exact_id_query(text),
            QueryMode::Semantic => self.semantic_query(text, top_k, threshold, None).await,
            QueryMode::Hybrid => {
                let intent = self.refiner.refine(text);
                debug!(refined = %intent.refined_query, "hybrid query refined");
                let refined = intent.refined_query.clone();
                self.semantic_query(&refined, top_k, threshold, Some(intent))
                    .await
            }
        }
    }

    /// Remove a document from the local tiers and the durable backend.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let removed = self.grid.evict(id);
        if let Some(store) = &self.durable {
            if let Err(err) = store.remove(id).await {
                if err.is_degraded_capability() {
                    warn!(id, error = %err, "durable delete skipped");
                } else {
                    return Err(err.into());
                }
            }
        }
        Ok(removed)
    }

    /// Clear local tiers, caches and statistics.
    ///
    /// The durable backend keeps its corpus; flush is a local reset for
    /// test isolation and operator-triggered recovery.
    pub fn flush(&self) {
        self.grid.flush();
        self.generator.clear_cache();
        self.packer.reset_stats();
        info!("engine flushed");
    }

    /// Rebuild the membership filter from the resident set (periodic
    /// maintenance for accumulated false positives).
    pub fn rebuild_filter(&self) {
        self.grid.rebuild_filter();
    }

    /// Aggregated statistics snapshot.
    pub fn stats(&self) -> EngineStats {
        EngineStats {
            grid: self.grid.stats(),
            embedding_cache: self.generator.cache_stats(),
            pack: self.packer.stats(),
            backend: self.durable.as_ref().map(|s| s.health_report()),
        }
    }

    fn exact_id_query(&self, id: &str) -> Result<QueryResponse> {
        let hits = match self.grid.lookup(id) {
            Some(essence) => vec![QueryHit {
                id: essence.id.clone(),
                score: 1.0,
                metadata: self.packer.decompress(&essence.metadata)?,
            }],
            None => Vec::new(),
        };
        Ok(QueryResponse {
            hits,
            degraded: false,
            refined_query: None,
        })
    }

    async fn semantic_query(
        &self,
        text: &str,
        top_k: usize,
        threshold: f32,
        intent: Option<SearchIntent>,
    ) -> Result<QueryResponse> {
        let query_vector = self.generator.generate(text);

        // Local tiers first; the grid scan never blocks on the backend.
        let mut merged: BTreeMap<String, QueryHit> = BTreeMap::new();
        for (essence, score) in self.grid.similarity_search(&query_vector, top_k, threshold)? {
            merged.insert(
                essence.id.clone(),
                QueryHit {
                    id: essence.id.clone(),
                    score,
                    metadata: self.packer.decompress(&essence.metadata)?,
                },
            );
        }

        let mut degraded = false;
        if let Some(store) = &self.durable {
            match store.search(&query_vector, top_k, threshold).await {
                Ok(remote) => {
                    for hit in remote {
                        let metadata = self.packer.decompress(&hit.metadata)?;
                        merged
                            .entry(hit.id.clone())
                            .and_modify(|existing| existing.score = existing.score.max(hit.score))
                            .or_insert(QueryHit {
                                id: hit.id,
                                score: hit.score,
                                metadata,
                            });
                    }
                }
                Err(err) if err.is_degraded_capability() => {
                    warn!(error = %err, "durable search unavailable; local results only");
                    degraded = true;
                }
                Err(err) => return Err(err.into()),
            }
        }

        let mut hits: Vec<QueryHit> = merged.into_values().collect();
        if let Some(intent) = &intent {
            apply_keyword_boost(&mut hits, intent);
        }
        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        hits.truncate(top_k);

        Ok(QueryResponse {
            hits,
            degraded,
            refined_query: intent.map(|i| i.refined_query),
        })
    }
}

/// Boost hits whose metadata mentions the query's keywords.
fn apply_keyword_boost(hits: &mut [QueryHit], intent: &SearchIntent) {
    if intent.keywords.is_empty() {
        return;
    }
    for hit in hits {
        let haystack: String = hit
            .metadata
            .values()
            .filter_map(|v| match v {
                essence_grid_core::MetadataValue::Str(s) => Some(s.to_lowercase()),
                _ => None,
            })
            .chain(std::iter::once(hit.id.to_lowercase()))
            .collect::<Vec<_>>()
            .join(" ");

        let matches = intent
            .keywords
            .iter()
            .filter(|k| haystack.contains(k.as_str()))
            .count();
        hit.score += KEYWORD_BOOST * matches as f32 / intent.keywords.len() as f32;
    }
}
