//! Domain types for the essence-grid system.
//!
//! The atomic stored unit is the [`Essence`]: a caller-identified vector
//! (float or quantized) plus a Gravitas-Pack compressed metadata record
//! and its insertion timestamp.

use std::borrow::Cow;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::quantization::{dequantize, QuantizedVector};

// ============================================================================
// METADATA
// ============================================================================

/// A scalar metadata value.
///
/// Records are string-keyed mappings of these; nested structures are not
/// part of the data model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    /// Absent/unknown value.
    Null,
    /// Boolean flag.
    Bool(bool),
    /// Signed integer (sizes, counts, line numbers).
    Int(i64),
    /// Floating point value.
    Float(f64),
    /// UTF-8 string (paths, names, timestamps).
    Str(String),
}

impl From<&str> for MetadataValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<i64> for MetadataValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for MetadataValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for MetadataValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

/// A metadata record: string keys to scalar values.
///
/// `BTreeMap` keeps key order stable, so packing the same record always
/// produces the same bytes.
pub type Record = BTreeMap<String, MetadataValue>;

// ============================================================================
// VECTORS
// ============================================================================

/// The vector form an [`Essence`] carries.
///
/// Quantized storage trades <0.1% relative calibration error for a 4x
/// memory reduction; which form is used is decided at ingest time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum VectorData {
    /// Full-precision float vector, L2-normalized.
    Float(Vec<f32>),
    /// Int8 affine-quantized vector with per-vector calibration.
    Quantized(QuantizedVector),
}

impl VectorData {
    /// Dimensionality of the carried vector.
    #[inline]
    pub fn dimension(&self) -> usize {
        match self {
            Self::Float(v) => v.len(),
            Self::Quantized(q) => q.data.len(),
        }
    }

    /// Whether this is the quantized form.
    #[inline]
    pub fn is_quantized(&self) -> bool {
        matches!(self, Self::Quantized(_))
    }

    /// Borrow the float representation, reconstructing it when quantized.
    pub fn to_float(&self) -> Cow<'_, [f32]> {
        match self {
            Self::Float(v) => Cow::Borrowed(v.as_slice()),
            Self::Quantized(q) => Cow::Owned(dequantize(q)),
        }
    }

    /// Cosine similarity against a float query.
    ///
    /// Quantized vectors score through the integer kernel without
    /// reconstruction. Degenerate operands score 0.0 so ranking callers
    /// need no error path here.
    pub fn cosine_to(&self, query: &[f32]) -> f32 {
        match self {
            Self::Float(v) => crate::similarity::cosine_similarity(query, v).unwrap_or(0.0),
            Self::Quantized(q) => crate::quantization::kernel::mixed_cosine(query, q).unwrap_or(0.0),
        }
    }
}

// ============================================================================
// ESSENCE
// ============================================================================

/// The atomic indexed unit: identity + vector + compressed metadata.
///
/// `id` is a stable, caller-supplied identifier; uniqueness is the
/// caller's responsibility. Re-inserting an existing id is an update.
/// An Essence is immutable after construction except for cache-tier
/// migration, which never alters its fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Essence {
    /// Caller-supplied stable identifier.
    pub id: String,
    /// The vector, in whichever form ingest produced.
    pub vector: VectorData,
    /// Gravitas-Pack compressed metadata record.
    pub metadata: Vec<u8>,
    /// Insertion timestamp; similarity ties break toward the most recent.
    pub inserted_at: DateTime<Utc>,
}

impl Essence {
    /// Create an essence stamped with the current time.
    pub fn new(id: impl Into<String>, vector: VectorData, metadata: Vec<u8>) -> Self {
        Self {
            id: id.into(),
            vector,
            metadata,
            inserted_at: Utc::now(),
        }
    }

    /// Dimensionality of the stored vector.
    #[inline]
    pub fn dimension(&self) -> usize {
        self.vector.dimension()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quantization::quantize;

    #[test]
    fn metadata_value_json_round_trip() {
        let mut record = Record::new();
        record.insert("file_name".into(), "report.pdf".into());
        record.insert("size_bytes".into(), MetadataValue::Int(2048));
        record.insert("score".into(), MetadataValue::Float(0.75));
        record.insert("is_binary".into(), MetadataValue::Bool(true));
        record.insert("owner".into(), MetadataValue::Null);

        let json = serde_json::to_string(&record).unwrap();
        let parsed: Record = serde_json::from_str(&json).unwrap();
        assert_eq!(record, parsed);
    }

    #[test]
    fn vector_data_dimension_matches_both_forms() {
        let v: Vec<f32> = (0..384).map(|i| (i as f32 * 0.01).cos()).collect();
        let float = VectorData::Float(v.clone());
        let quantized = VectorData::Quantized(quantize(&v).unwrap());

        assert_eq!(float.dimension(), 384);
        assert_eq!(quantized.dimension(), 384);
        assert!(!float.is_quantized());
        assert!(quantized.is_quantized());
    }

    #[test]
    fn to_float_reconstructs_quantized_form() {
        let v: Vec<f32> = (0..384).map(|i| ((i as f32) * 0.2).sin() * 0.05).collect();
        let quantized = VectorData::Quantized(quantize(&v).unwrap());
        let restored = quantized.to_float();
        assert_eq!(restored.len(), v.len());
        for (a, b) in v.iter().zip(restored.iter()) {
            assert!((a - b).abs() < 1e-2);
        }
    }

    #[test]
    fn essence_update_semantics_are_callers_concern() {
        let v = vec![0.5f32; 4];
        let e = Essence::new("doc-1", VectorData::Float(v), vec![1, 2, 3]);
        assert_eq!(e.id, "doc-1");
        assert_eq!(e.dimension(), 4);
        assert_eq!(e.metadata, vec![1, 2, 3]);
    }
}
