//! Top-level unified error type for the essence-grid library.

use thiserror::Error;

use super::sub_errors::{
    BackendError, ConfigError, GridError, PackError, QuantizationError, SimilarityError,
};

// ============================================================================
// TOP-LEVEL UNIFIED ERROR TYPE
// ============================================================================

/// Top-level unified error type for the essence-grid library.
///
/// All crate errors are convertible to this type via `From` implementations.
///
/// # Propagation policy
///
/// Ingest-time structural errors (dimension mismatch, corrupted records)
/// are reported to the caller synchronously. Backend instability is
/// absorbed by the circuit breaker and reported as degraded capability,
/// never as a hard query failure;
/// [`EssenceGridError::is_degraded_capability`] identifies those
/// variants.
#[derive(Debug, Error)]
pub enum EssenceGridError {
    /// Dense similarity computation error.
    #[error("Similarity error: {0}")]
    Similarity(#[from] SimilarityError),

    /// Vector quantization error.
    #[error("Quantization error: {0}")]
    Quantization(#[from] QuantizationError),

    /// Gravitas-Pack compression/decompression error.
    #[error("Pack error: {0}")]
    Pack(#[from] PackError),

    /// Chronos-Grid error.
    #[error("Grid error: {0}")]
    Grid(#[from] GridError),

    /// Durable backend / resilience wrapper error.
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation error for input data.
    #[error("Validation error: {0}")]
    Validation(String),
}

impl EssenceGridError {
    /// Whether this error denotes degraded backend capability rather
    /// than a fault in the request.
    ///
    /// Callers should treat such errors as "serve from local tiers only,
    /// possibly with reduced recall".
    #[inline]
    pub fn is_degraded_capability(&self) -> bool {
        matches!(self, Self::Backend(e) if e.is_degraded_capability())
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, EssenceGridError>;
