//! Int8 affine vector quantization.
//!
//! Each vector is compressed independently: `scale = (max - min) / 255`,
//! `offset = min`, and every component maps to a signed byte. The
//! per-vector `(scale, offset)` calibration pair reconstructs an
//! approximation with <0.1% relative error on unit vectors.
//!
//! Similarity over quantized vectors never needs a dequantization pass:
//! [`kernel`] expands the affine map into integer accumulators, which is
//! also the fast path (integer arithmetic in the hot loop).

mod accuracy;
pub mod kernel;
mod types;

pub use accuracy::{compute_max_abs_error, compute_rmse, AccuracyReport};
pub use types::QuantizedVector;

use crate::error::QuantizationError;

/// Quantization levels available in a signed byte.
const LEVELS: f32 = 255.0;

/// Bias applied so the unsigned level index fits a signed byte.
pub(crate) const ZERO_POINT: i32 = 128;

/// Quantize a float vector to signed bytes with per-vector calibration.
///
/// A constant vector (`max == min`) uses `scale = 1.0` so the affine map
/// stays invertible.
///
/// # Errors
/// - [`QuantizationError::EmptyVector`] for empty input
/// - [`QuantizationError::NonFinite`] if any component is NaN or infinite
pub fn quantize(v: &[f32]) -> Result<QuantizedVector, QuantizationError> {
    if v.is_empty() {
        return Err(QuantizationError::EmptyVector);
    }
    for (index, &value) in v.iter().enumerate() {
        if !value.is_finite() {
            return Err(QuantizationError::NonFinite { index, value });
        }
    }

    let min = v.iter().copied().fold(f32::INFINITY, f32::min);
    let max = v.iter().copied().fold(f32::NEG_INFINITY, f32::max);

    let range = max - min;
    let scale = if range.abs() < f32::EPSILON {
        1.0
    } else {
        range / LEVELS
    };
    let offset = min;

    let data = v
        .iter()
        .map(|&x| {
            let level = ((x - offset) / scale).round() as i32 - ZERO_POINT;
            level.clamp(i8::MIN as i32, i8::MAX as i32) as i8
        })
        .collect();

    Ok(QuantizedVector {
        data,
        scale,
        offset,
    })
}

/// Reconstruct the float approximation of a quantized vector.
pub fn dequantize(q: &QuantizedVector) -> Vec<f32> {
    q.data
        .iter()
        .map(|&b| (b as i32 + ZERO_POINT) as f32 * q.scale + q.offset)
        .collect()
}
