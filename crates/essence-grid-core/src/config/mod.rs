//! Root configuration for the essence-grid engine.
//!
//! All tuning lives in one validated struct constructed at startup and
//! passed by reference into each component's constructor. Invalid
//! configuration returns an error, never a silent default.
//!
//! # Loading
//!
//! ```rust,ignore
//! use essence_grid_core::EngineConfig;
//!
//! // Defaults for development
//! let config = EngineConfig::default();
//!
//! // From a TOML file, then environment overrides
//! let config = EngineConfig::from_file("essence-grid.toml")?.with_env_overrides()?;
//! config.validate()?;
//! ```
//!
//! # TOML structure
//!
//! ```toml
//! [embedding]
//! dimension = 384
//! max_text_length = 512
//! cache_capacity = 1024
//!
//! [quantization]
//! enabled = true
//!
//! [grid]
//! hot_capacity = 256
//! filter_bits = 512
//! filter_hashes = 2
//! shard_count = 1024
//!
//! [backend]
//! kind = "hnsw"
//!
//! [hnsw]
//! m = 16
//! ef_construction = 200
//! ef_search = 64
//!
//! [breaker]
//! failure_threshold = 5
//! recovery_timeout_ms = 60000
//! success_threshold = 2
//!
//! [retry]
//! max_retries = 3
//! initial_delay_ms = 100
//! max_delay_ms = 2000
//! attempt_timeout_ms = 5000
//! ```

#[cfg(test)]
mod tests;

use std::env;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;

/// Environment variable prefix for overrides.
const ENV_PREFIX: &str = "ESSENCE_GRID_";

// ============================================================================
// ROOT CONFIG
// ============================================================================

/// Root configuration aggregating all component settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Embedding generator settings.
    #[serde(default)]
    pub embedding: EmbeddingSettings,
    /// Vector quantization settings.
    #[serde(default)]
    pub quantization: QuantizationSettings,
    /// Chronos-Grid tier settings.
    #[serde(default)]
    pub grid: GridSettings,
    /// Durable backend selection.
    #[serde(default)]
    pub backend: BackendSettings,
    /// HNSW parameters for the indexed backend.
    #[serde(default)]
    pub hnsw: HnswSettings,
    /// Circuit breaker thresholds.
    #[serde(default)]
    pub breaker: BreakerSettings,
    /// Retry policy parameters.
    #[serde(default)]
    pub retry: RetrySettings,
}

impl EngineConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// [`ConfigError::FileNotFound`] or [`ConfigError::ParseError`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound(path.display().to_string()))?;
        let config: Self = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            file: path.display().to_string(),
            reason: e.to_string(),
        })?;
        debug!(path = %path.display(), "loaded engine configuration");
        Ok(config)
    }

    /// Apply `ESSENCE_GRID_*` environment overrides.
    ///
    /// # Errors
    /// [`ConfigError::EnvInvalid`] when a set variable does not parse.
    pub fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        override_from_env(&mut self.embedding.dimension, "DIMENSION")?;
        override_from_env(&mut self.embedding.max_text_length, "MAX_TEXT_LENGTH")?;
        override_from_env(&mut self.embedding.cache_capacity, "CACHE_CAPACITY")?;
        override_from_env(&mut self.quantization.enabled, "QUANTIZATION")?;
        override_from_env(&mut self.grid.hot_capacity, "HOT_CAPACITY")?;
        override_from_env(&mut self.grid.filter_bits, "FILTER_BITS")?;
        override_from_env(&mut self.grid.filter_hashes, "FILTER_HASHES")?;
        override_from_env(&mut self.grid.shard_count, "SHARD_COUNT")?;
        override_from_env(&mut self.backend.kind, "BACKEND")?;
        override_from_env(&mut self.hnsw.m, "HNSW_M")?;
        override_from_env(&mut self.hnsw.ef_construction, "HNSW_EF_CONSTRUCTION")?;
        override_from_env(&mut self.hnsw.ef_search, "HNSW_EF_SEARCH")?;
        override_from_env(&mut self.breaker.failure_threshold, "FAILURE_THRESHOLD")?;
        override_from_env(&mut self.breaker.recovery_timeout_ms, "RECOVERY_TIMEOUT_MS")?;
        override_from_env(&mut self.breaker.success_threshold, "SUCCESS_THRESHOLD")?;
        override_from_env(&mut self.retry.max_retries, "MAX_RETRIES")?;
        override_from_env(&mut self.retry.initial_delay_ms, "INITIAL_DELAY_MS")?;
        override_from_env(&mut self.retry.max_delay_ms, "MAX_DELAY_MS")?;
        override_from_env(&mut self.retry.attempt_timeout_ms, "ATTEMPT_TIMEOUT_MS")?;
        Ok(self)
    }

    /// Validate every field; fails fast on the first violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.embedding.validate()?;
        self.grid.validate()?;
        self.hnsw.validate()?;
        self.breaker.validate()?;
        self.retry.validate()?;
        Ok(())
    }
}

fn override_from_env<T: FromStr>(field: &mut T, suffix: &str) -> Result<(), ConfigError>
where
    T::Err: std::fmt::Display,
{
    let var = format!("{ENV_PREFIX}{suffix}");
    if let Ok(raw) = env::var(&var) {
        *field = raw.parse().map_err(|e: T::Err| ConfigError::EnvInvalid {
            var: var.clone(),
            reason: e.to_string(),
        })?;
        debug!(%var, value = %raw, "applied environment override");
    }
    Ok(())
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field: field.to_string(),
        reason: reason.into(),
    }
}

// ============================================================================
// EMBEDDING
// ============================================================================

/// Embedding generator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Output vector dimensionality. Fixed for the lifetime of an index.
    pub dimension: usize,
    /// Inputs longer than this many characters are truncated, not rejected.
    pub max_text_length: usize,
    /// Bounded LRU result cache capacity.
    pub cache_capacity: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            dimension: 384,
            max_text_length: 512,
            cache_capacity: 1024,
        }
    }
}

impl EmbeddingSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.dimension == 0 {
            return Err(invalid("embedding.dimension", "must be positive"));
        }
        if self.max_text_length == 0 {
            return Err(invalid("embedding.max_text_length", "must be positive"));
        }
        if self.cache_capacity == 0 {
            return Err(invalid("embedding.cache_capacity", "must be positive"));
        }
        Ok(())
    }
}

// ============================================================================
// QUANTIZATION
// ============================================================================

/// Vector quantization toggle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuantizationSettings {
    /// Store int8 quantized vectors instead of floats.
    pub enabled: bool,
}

impl Default for QuantizationSettings {
    fn default() -> Self {
        Self { enabled: true }
    }
}

// ============================================================================
// GRID
// ============================================================================

/// Chronos-Grid tier settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSettings {
    /// Tier 1 hot buffer capacity (strict LRU eviction).
    pub hot_capacity: usize,
    /// Tier 2 membership filter size in bits.
    pub filter_bits: usize,
    /// Hash functions per id in the membership filter.
    pub filter_hashes: usize,
    /// Tier 3 bucket count.
    pub shard_count: usize,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            hot_capacity: 256,
            filter_bits: 512,
            filter_hashes: 2,
            shard_count: 1024,
        }
    }
}

impl GridSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.hot_capacity == 0 {
            return Err(invalid("grid.hot_capacity", "must be positive"));
        }
        if self.filter_bits == 0 {
            return Err(invalid("grid.filter_bits", "must be positive"));
        }
        if !(1..=8).contains(&self.filter_hashes) {
            return Err(invalid(
                "grid.filter_hashes",
                format!("must be 1..=8, got {}", self.filter_hashes),
            ));
        }
        if self.shard_count == 0 {
            return Err(invalid("grid.shard_count", "must be positive"));
        }
        Ok(())
    }
}

// ============================================================================
// BACKEND
// ============================================================================

/// Which durable vector-store backend to run behind the resilience wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    /// No durable backend; local tiers only.
    None,
    /// Brute-force in-memory table.
    FlatScan,
    /// HNSW-indexed store.
    Hnsw,
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "flat-scan" | "flat" => Ok(Self::FlatScan),
            "hnsw" => Ok(Self::Hnsw),
            other => Err(format!(
                "unknown backend kind '{other}', expected none|flat-scan|hnsw"
            )),
        }
    }
}

/// Durable backend selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendSettings {
    /// Backend implementation to wrap.
    pub kind: BackendKind,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            kind: BackendKind::None,
        }
    }
}

/// HNSW parameters for the indexed backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HnswSettings {
    /// Connectivity per layer.
    pub m: usize,
    /// Candidate list size during construction.
    pub ef_construction: usize,
    /// Candidate list size during search.
    pub ef_search: usize,
    /// Capacity hint for index allocation.
    pub max_elements: usize,
}

impl Default for HnswSettings {
    fn default() -> Self {
        Self {
            m: 16,
            ef_construction: 200,
            ef_search: 64,
            max_elements: 100_000,
        }
    }
}

impl HnswSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.m == 0 {
            return Err(invalid("hnsw.m", "must be positive"));
        }
        if self.ef_construction == 0 {
            return Err(invalid("hnsw.ef_construction", "must be positive"));
        }
        if self.ef_search == 0 {
            return Err(invalid("hnsw.ef_search", "must be positive"));
        }
        if self.max_elements == 0 {
            return Err(invalid("hnsw.max_elements", "must be positive"));
        }
        Ok(())
    }
}

// ============================================================================
// RESILIENCE
// ============================================================================

/// Circuit breaker thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakerSettings {
    /// Consecutive failures that open the circuit.
    pub failure_threshold: u32,
    /// How long the circuit stays open before probing, in milliseconds.
    pub recovery_timeout_ms: u64,
    /// Consecutive half-open successes that close the circuit.
    pub success_threshold: u32,
}

impl Default for BreakerSettings {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            recovery_timeout_ms: 60_000,
            success_threshold: 2,
        }
    }
}

impl BreakerSettings {
    /// Open-state dwell time as a [`Duration`].
    pub fn recovery_timeout(&self) -> Duration {
        Duration::from_millis(self.recovery_timeout_ms)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.failure_threshold == 0 {
            return Err(invalid("breaker.failure_threshold", "must be positive"));
        }
        if self.success_threshold == 0 {
            return Err(invalid("breaker.success_threshold", "must be positive"));
        }
        Ok(())
    }
}

/// Retry policy parameters (exponential backoff, bounded attempts).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Attempts per call, including the first.
    pub max_retries: u32,
    /// Delay before the second attempt, in milliseconds.
    pub initial_delay_ms: u64,
    /// Backoff ceiling, in milliseconds.
    pub max_delay_ms: u64,
    /// Bounded timeout per individual attempt, in milliseconds.
    pub attempt_timeout_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 100,
            max_delay_ms: 2_000,
            attempt_timeout_ms: 5_000,
        }
    }
}

impl RetrySettings {
    /// Delay before the second attempt.
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    /// Backoff ceiling.
    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    /// Per-attempt timeout.
    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.attempt_timeout_ms)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_retries == 0 {
            return Err(invalid("retry.max_retries", "must be at least 1"));
        }
        if self.initial_delay_ms > self.max_delay_ms {
            return Err(invalid(
                "retry.initial_delay_ms",
                "must not exceed retry.max_delay_ms",
            ));
        }
        if self.attempt_timeout_ms == 0 {
            return Err(invalid("retry.attempt_timeout_ms", "must be positive"));
        }
        Ok(())
    }
}
