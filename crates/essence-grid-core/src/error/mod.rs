//! Error types for essence-grid-core.
//!
//! This module defines the central error types used throughout the
//! essence-grid system:
//!
//! - [`EssenceGridError`]: Top-level unified error for all crate errors
//! - Sub-error types: [`SimilarityError`], [`QuantizationError`],
//!   [`PackError`], [`GridError`], [`BackendError`], [`ConfigError`]
//!
//! Library code never panics; every fallible path returns `Result` and
//! propagates with `?`.

mod sub_errors;
mod unified;


pub use sub_errors::{
    BackendError, ConfigError, GridError, PackError, QuantizationError, SimilarityError,
};
pub use unified::EssenceGridError;

// Re-export Result type alias
pub use unified::Result;
