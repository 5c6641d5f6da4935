//! Deterministic DSP embedding generation for essence-grid.
//!
//! No neural model, no weights to load: text maps to a 384-dimension
//! unit vector through stable feature hashing. The same input yields a
//! bit-identical vector across calls, threads, processes and releases;
//! the index's correctness depends on that.
//!
//! # Pipeline
//!
//! 1. Attune: trim, lowercase, collapse whitespace, truncate to the
//!    configured character budget.
//! 2. Extract features: whitespace words (weight 2.0) and character
//!    3–5-grams (weight 1.0).
//! 3. SHA-256 each feature; the hash picks a dimension and a sign.
//! 4. L2-normalize; degenerate input falls back to a canonical unit
//!    vector instead of dividing by zero.
//! 5. Cache the result in a bounded LRU keyed by the attuned text.

mod cache;
mod dsp;

pub use cache::CacheStatsSnapshot;
pub use dsp::EmbeddingGenerator;
