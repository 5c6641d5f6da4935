//! Core domain library for the essence-grid semantic search engine.
//!
//! This crate defines:
//! - Domain types (`Essence`, `VectorData`, `MetadataValue`, scored hits)
//! - Error types and the crate-wide [`Result`] alias
//! - Validated configuration structures with TOML and environment loading
//! - Dense similarity primitives (dot product, cosine, normalization)
//! - The int8 affine vector quantizer and its integer similarity kernel
//! - Gravitas-Pack, the symbolic metadata compressor
//!
//! # Example
//!
//! ```
//! use essence_grid_core::quantization::{quantize, dequantize};
//! use essence_grid_core::similarity::cosine_similarity;
//!
//! let v: Vec<f32> = (0..384).map(|i| ((i as f32) * 0.37).sin()).collect();
//! let q = quantize(&v).unwrap();
//! let restored = dequantize(&q);
//! let fidelity = cosine_similarity(&v, &restored).unwrap();
//! assert!(fidelity > 0.999);
//! ```

pub mod config;
pub mod error;
pub mod pack;
pub mod quantization;
pub mod similarity;
pub mod types;

// Re-exports for convenience
pub use config::EngineConfig;
pub use error::{EssenceGridError, Result};
pub use types::{Essence, MetadataValue, Record, VectorData};
