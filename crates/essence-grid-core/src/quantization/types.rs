//! Quantized vector representation.

use serde::{Deserialize, Serialize};

/// An int8 affine-quantized vector with per-vector calibration.
///
/// Reconstruction: `x_i = (data_i + 128) * scale + offset`.
///
/// Per-vector calibration maximizes fidelity at the cost of byte-level
/// comparability across vectors; [`super::kernel`] handles cross-vector
/// similarity by expanding the affine form instead of rescaling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantizedVector {
    /// One signed byte per original component.
    pub data: Vec<i8>,
    /// Level width of the affine map; 1.0 for constant input.
    pub scale: f32,
    /// Minimum of the original components.
    pub offset: f32,
}

impl QuantizedVector {
    /// Compressed size in bytes (payload plus calibration pair).
    pub fn compressed_size(&self) -> usize {
        self.data.len() + 2 * std::mem::size_of::<f32>()
    }

    /// Size of the float vector this replaces.
    pub fn uncompressed_size(&self) -> usize {
        self.data.len() * std::mem::size_of::<f32>()
    }

    /// Achieved compression ratio (uncompressed / compressed).
    pub fn compression_ratio(&self) -> f32 {
        if self.compressed_size() == 0 {
            return 0.0;
        }
        self.uncompressed_size() as f32 / self.compressed_size() as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compression_ratio_is_near_four() {
        let q = QuantizedVector {
            data: vec![0i8; 384],
            scale: 0.01,
            offset: -0.5,
        };
        assert_eq!(q.compressed_size(), 392);
        assert_eq!(q.uncompressed_size(), 1536);
        assert!(q.compression_ratio() > 3.9);
    }

    #[test]
    fn serde_round_trip() {
        let q = QuantizedVector {
            data: vec![-128, 0, 127],
            scale: 0.5,
            offset: -1.0,
        };
        let json = serde_json::to_string(&q).unwrap();
        let parsed: QuantizedVector = serde_json::from_str(&json).unwrap();
        assert_eq!(q, parsed);
    }
}
