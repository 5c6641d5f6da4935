//! Sub-error types for essence-grid-core.
//!
//! Each error type covers a specific domain of failures.

use thiserror::Error;

// ============================================================================
// SIMILARITY ERROR
// ============================================================================

/// Errors from dense vector similarity computation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimilarityError {
    /// Empty vector provided.
    #[error("Empty vector provided")]
    EmptyVector,

    /// Dimension mismatch between vectors.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension (from first vector)
        expected: usize,
        /// Actual dimension (from second vector)
        actual: usize,
    },

    /// Zero magnitude vector - cosine undefined.
    #[error("Zero magnitude vector - cosine undefined")]
    ZeroMagnitude,
}

// ============================================================================
// QUANTIZATION ERROR
// ============================================================================

/// Errors during quantization or integer-kernel similarity.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum QuantizationError {
    /// Empty input vector.
    #[error("Cannot quantize an empty vector")]
    EmptyVector,

    /// Input contains NaN or Infinity.
    #[error("Non-finite value {value} at index {index}")]
    NonFinite {
        /// Index of the offending component
        index: usize,
        /// The offending value
        value: f32,
    },

    /// Operand dimensions disagree.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension received
        actual: usize,
    },
}

// ============================================================================
// PACK ERROR
// ============================================================================

/// Gravitas-Pack compression/decompression errors.
///
/// Decompression failures are local-data-integrity faults: they are
/// surfaced to the caller rather than guessed at.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PackError {
    /// The byte sequence does not parse as a packed record.
    #[error("Corrupted record at byte {offset}: {reason}")]
    Corrupted {
        /// Byte offset where parsing failed
        offset: usize,
        /// What went wrong
        reason: String,
    },

    /// The record was packed by an unknown format version.
    #[error("Unsupported pack format version {found}, expected {expected}")]
    UnsupportedVersion {
        /// Version byte found in the input
        found: u8,
        /// Version this build writes and reads
        expected: u8,
    },

    /// A field exceeds the encodable size limits.
    #[error("Field '{key}' too large to encode: {reason}")]
    FieldTooLarge {
        /// Offending field name
        key: String,
        /// Which limit was hit
        reason: String,
    },
}

// ============================================================================
// GRID ERROR
// ============================================================================

/// Chronos-Grid errors.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GridError {
    /// Essence vector length disagrees with the grid's configured
    /// dimensionality. Rejected at insert, never silently truncated
    /// or padded.
    #[error("Dimension mismatch: grid expects {expected}, essence has {actual}")]
    DimensionMismatch {
        /// Dimensionality the grid was constructed with
        expected: usize,
        /// Dimensionality of the rejected essence
        actual: usize,
    },
}

// ============================================================================
// BACKEND ERROR
// ============================================================================

/// Errors from the durable vector-store backend and its resilience wrapper.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BackendError {
    /// The circuit breaker is open; the call was rejected without
    /// contacting the backend.
    #[error("Circuit open: backend calls rejected for another {remaining_ms}ms")]
    CircuitOpen {
        /// Milliseconds until the breaker transitions to half-open
        remaining_ms: u64,
    },

    /// A single backend attempt exceeded its bounded timeout.
    #[error("Backend attempt timed out after {timeout_ms}ms")]
    Timeout {
        /// Per-attempt timeout that was exceeded
        timeout_ms: u64,
    },

    /// The backend reported a failure.
    #[error("Backend unavailable: {reason}")]
    Unavailable {
        /// Backend-supplied failure description
        reason: String,
    },

    /// All retry attempts failed.
    #[error("Retries exhausted after {attempts} attempts: {last}")]
    RetriesExhausted {
        /// Number of attempts made
        attempts: u32,
        /// Display form of the final attempt's error
        last: String,
    },

    /// Query vector dimension disagrees with the backend index.
    #[error("Dimension mismatch: backend expects {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimensionality the backend was constructed with
        expected: usize,
        /// Dimensionality received
        actual: usize,
    },

    /// Index-level failure (construction, insertion, search).
    #[error("Index error: {0}")]
    Index(String),
}

impl BackendError {
    /// Whether this error means "serve from local tiers only, possibly
    /// with reduced recall" rather than a fault in the request itself.
    #[inline]
    pub fn is_degraded_capability(&self) -> bool {
        matches!(
            self,
            Self::CircuitOpen { .. }
                | Self::Timeout { .. }
                | Self::Unavailable { .. }
                | Self::RetriesExhausted { .. }
        )
    }
}

// ============================================================================
// CONFIG ERROR
// ============================================================================

/// Configuration errors.
///
/// Covers invalid values, file loading and environment parsing. Invalid
/// configuration returns an error, never a silent default.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration value is invalid.
    #[error("Invalid configuration: {field}: {reason}")]
    Invalid {
        /// Configuration field name
        field: String,
        /// Reason why it's invalid
        reason: String,
    },

    /// Configuration file not found.
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Configuration file parse error.
    #[error("Parse error in {file}: {reason}")]
    ParseError {
        /// File being parsed
        file: String,
        /// Parse error reason
        reason: String,
    },

    /// Environment variable is set but does not parse.
    #[error("Environment variable {var} invalid: {reason}")]
    EnvInvalid {
        /// Variable name
        var: String,
        /// Parse error reason
        reason: String,
    },
}
