//! Integer similarity kernel over quantized vectors.
//!
//! For unsigned levels `u_i = data_i + 128`, the reconstructed component
//! is `scale * u_i + offset`, so a dot product expands to
//!
//! ```text
//! dot(a, b) = s_a*s_b*Σ(u_a·u_b) + s_a*o_b*Σu_a + s_b*o_a*Σu_b + n*o_a*o_b
//! ```
//!
//! The three sums accumulate in `i64` (the hot loop touches no floats),
//! and four float operations recover the exact reconstructed dot product.
//! This works across vectors with different calibrations, so no rescaling
//! or dequantization pass is ever needed for scoring.

use super::types::QuantizedVector;
use super::ZERO_POINT;
use crate::error::QuantizationError;

/// Integer accumulators for one quantized vector pair.
struct PairSums {
    /// Σ u_a·u_b
    cross: i64,
    /// Σ u_a
    sum_a: i64,
    /// Σ u_b
    sum_b: i64,
}

#[inline]
fn accumulate(a: &[i8], b: &[i8]) -> PairSums {
    let mut cross = 0i64;
    let mut sum_a = 0i64;
    let mut sum_b = 0i64;
    for (&xa, &xb) in a.iter().zip(b.iter()) {
        let ua = (xa as i32 + ZERO_POINT) as i64;
        let ub = (xb as i32 + ZERO_POINT) as i64;
        cross += ua * ub;
        sum_a += ua;
        sum_b += ub;
    }
    PairSums {
        cross,
        sum_a,
        sum_b,
    }
}

#[inline]
fn check_dims(expected: usize, actual: usize) -> Result<(), QuantizationError> {
    if expected == 0 || actual == 0 {
        return Err(QuantizationError::EmptyVector);
    }
    if expected != actual {
        return Err(QuantizationError::DimensionMismatch { expected, actual });
    }
    Ok(())
}

/// Reconstructed dot product of two quantized vectors.
///
/// # Errors
/// - [`QuantizationError::EmptyVector`] if either side is empty
/// - [`QuantizationError::DimensionMismatch`] if lengths differ
pub fn quantized_dot(a: &QuantizedVector, b: &QuantizedVector) -> Result<f32, QuantizationError> {
    check_dims(a.data.len(), b.data.len())?;
    let n = a.data.len() as f32;
    let sums = accumulate(&a.data, &b.data);

    Ok(a.scale * b.scale * sums.cross as f32
        + a.scale * b.offset * sums.sum_a as f32
        + b.scale * a.offset * sums.sum_b as f32
        + n * a.offset * b.offset)
}

/// Reconstructed squared L2 norm of a quantized vector.
pub fn quantized_norm_sq(q: &QuantizedVector) -> f32 {
    let n = q.data.len() as f32;
    let mut self_cross = 0i64;
    let mut sum = 0i64;
    for &x in &q.data {
        let u = (x as i32 + ZERO_POINT) as i64;
        self_cross += u * u;
        sum += u;
    }
    q.scale * q.scale * self_cross as f32
        + 2.0 * q.scale * q.offset * sum as f32
        + n * q.offset * q.offset
}

/// Cosine similarity between two quantized vectors.
///
/// A degenerate reconstruction (zero norm) scores as orthogonal rather
/// than erroring; ranking callers treat it as "no resonance".
pub fn quantized_cosine(
    a: &QuantizedVector,
    b: &QuantizedVector,
) -> Result<f32, QuantizationError> {
    let dot = quantized_dot(a, b)?;
    let norm = (quantized_norm_sq(a) * quantized_norm_sq(b)).sqrt();
    if norm < f32::EPSILON {
        return Ok(0.0);
    }
    Ok((dot / norm).clamp(-1.0, 1.0))
}

/// Dot product between a float query and a quantized stored vector.
///
/// Expansion: `Σ q_i·(scale·u_i + offset) = scale·Σ(q_i·u_i) + offset·Σq_i`,
/// one pass, no reconstruction allocation.
///
/// # Errors
/// - [`QuantizationError::EmptyVector`] if either side is empty
/// - [`QuantizationError::DimensionMismatch`] if lengths differ
pub fn mixed_dot(query: &[f32], stored: &QuantizedVector) -> Result<f32, QuantizationError> {
    check_dims(query.len(), stored.data.len())?;

    let mut weighted = 0.0f32;
    let mut query_sum = 0.0f32;
    for (&q, &x) in query.iter().zip(stored.data.iter()) {
        weighted += q * (x as i32 + ZERO_POINT) as f32;
        query_sum += q;
    }
    Ok(stored.scale * weighted + stored.offset * query_sum)
}

/// Cosine similarity between a float query and a quantized stored vector.
pub fn mixed_cosine(query: &[f32], stored: &QuantizedVector) -> Result<f32, QuantizationError> {
    let dot = mixed_dot(query, stored)?;
    let query_norm: f32 = query.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm = query_norm * quantized_norm_sq(stored).sqrt();
    if norm < f32::EPSILON {
        return Ok(0.0);
    }
    Ok((dot / norm).clamp(-1.0, 1.0))
}
