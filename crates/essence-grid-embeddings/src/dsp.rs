//! The Gravitas DSP embedding generator.

use std::sync::Arc;

use rayon::prelude::*;
use sha2::{Digest, Sha256};
use tracing::debug;

use essence_grid_core::config::EmbeddingSettings;
use essence_grid_core::similarity::{l2_norm, normalize};

use crate::cache::{CacheKey, CacheStatsSnapshot, EssenceCache};

/// Word features weigh twice as much as character n-grams.
const WORD_WEIGHT: f32 = 2.0;
/// Character n-gram feature weight.
const NGRAM_WEIGHT: f32 = 1.0;
/// Sliding-window n-gram lengths.
const NGRAM_RANGE: std::ops::RangeInclusive<usize> = 3..=5;

/// Canonical direction for degenerate input, hashed through the same
/// pipeline as every other feature.
const FALLBACK_TOKEN: &str = "unknown-text";

/// Deterministic text-to-vector generator.
///
/// Identical input text (after attuning) always yields a bit-identical
/// vector for a given dimensionality. No side effects beyond the bounded
/// result cache.
pub struct EmbeddingGenerator {
    settings: EmbeddingSettings,
    cache: EssenceCache,
    fallback: Arc<Vec<f32>>,
}

impl EmbeddingGenerator {
    /// Build a generator from validated settings.
    pub fn new(settings: &EmbeddingSettings) -> Self {
        let fallback = Arc::new(fallback_vector(settings.dimension));
        debug!(
            dimension = settings.dimension,
            cache_capacity = settings.cache_capacity,
            "embedding generator ready"
        );
        Self {
            settings: settings.clone(),
            cache: EssenceCache::new(settings.cache_capacity),
            fallback,
        }
    }

    /// Output dimensionality.
    #[inline]
    pub fn dimension(&self) -> usize {
        self.settings.dimension
    }

    /// Generate the unit vector for `text`.
    ///
    /// Never fails: empty or degenerate input yields the canonical
    /// fallback vector.
    pub fn generate(&self, text: &str) -> Arc<Vec<f32>> {
        let attuned = self.attune(text);
        if attuned.is_empty() {
            return Arc::clone(&self.fallback);
        }

        let key = CacheKey::from_text(&attuned);
        if let Some(cached) = self.cache.get(&key) {
            return cached;
        }

        let vector = Arc::new(self.vectorize(&attuned));
        self.cache.put(key, Arc::clone(&vector));
        vector
    }

    /// Generate vectors for a batch of texts in parallel.
    ///
    /// Repeated texts are served from the shared cache.
    pub fn batch_generate(&self, texts: &[&str]) -> Vec<Arc<Vec<f32>>> {
        texts.par_iter().map(|text| self.generate(text)).collect()
    }

    /// The canonical fallback vector for degenerate input.
    pub fn fallback_vector(&self) -> Arc<Vec<f32>> {
        Arc::clone(&self.fallback)
    }

    /// Cache statistics snapshot.
    pub fn cache_stats(&self) -> CacheStatsSnapshot {
        self.cache.stats()
    }

    /// Drop cached vectors and reset cache counters.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Normalization pipeline: trim, lowercase, collapse whitespace,
    /// truncate to the configured character budget.
    fn attune(&self, text: &str) -> String {
        let collapsed = text
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        collapsed
            .chars()
            .take(self.settings.max_text_length)
            .collect()
    }

    fn vectorize(&self, attuned: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.settings.dimension];

        for word in attuned.split_whitespace() {
            self.accumulate(&mut vector, word, WORD_WEIGHT);
        }

        let chars: Vec<char> = attuned.chars().collect();
        for n in NGRAM_RANGE {
            if chars.len() < n {
                break;
            }
            for window in chars.windows(n) {
                let ngram: String = window.iter().collect();
                self.accumulate(&mut vector, &ngram, NGRAM_WEIGHT);
            }
        }

        if l2_norm(&vector) < f32::EPSILON {
            return self.fallback.as_ref().clone();
        }
        normalize(&mut vector);
        vector
    }

    fn accumulate(&self, vector: &mut [f32], feature: &str, weight: f32) {
        let (dimension, sign) = feature_slot(feature, self.settings.dimension);
        vector[dimension] += weight * sign;
    }
}

/// Map a feature string to its dimension and sign.
///
/// SHA-256 keeps the mapping stable across platforms and releases; the
/// first 8 digest bytes select the dimension, the low bit of byte 8
/// selects the sign.
fn feature_slot(feature: &str, dimension: usize) -> (usize, f32) {
    let digest = Sha256::digest(feature.as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    let slot = (u64::from_le_bytes(prefix) % dimension as u64) as usize;
    let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
    (slot, sign)
}

fn fallback_vector(dimension: usize) -> Vec<f32> {
    let mut vector = vec![0.0f32; dimension];
    let (slot, sign) = feature_slot(FALLBACK_TOKEN, dimension);
    vector[slot] = sign;
    vector
}
