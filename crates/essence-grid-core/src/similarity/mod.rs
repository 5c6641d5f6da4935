//! Dense vector similarity primitives.
//!
//! All stored vectors are unit-normalized at generation time, so cosine
//! similarity usually reduces to a dot product; the full cosine form is
//! kept for callers that cannot guarantee normalization.

use crate::error::SimilarityError;

/// Calculate the L2 norm (Euclidean length) of a vector.
#[inline]
pub fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Normalize a vector to unit length in place.
///
/// Does nothing if the vector has zero magnitude (avoids division by zero).
#[inline]
pub fn normalize(v: &mut [f32]) {
    let norm = l2_norm(v);
    if norm > f32::EPSILON {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

/// Internal dot product without validation.
/// Caller must ensure vectors have equal length.
#[inline]
fn dot_product_unchecked(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Calculate the dot product between two dense vectors.
///
/// # Errors
/// - [`SimilarityError::EmptyVector`] if either vector is empty
/// - [`SimilarityError::DimensionMismatch`] if lengths differ
#[inline]
pub fn dot_product(a: &[f32], b: &[f32]) -> Result<f32, SimilarityError> {
    if a.is_empty() || b.is_empty() {
        return Err(SimilarityError::EmptyVector);
    }
    if a.len() != b.len() {
        return Err(SimilarityError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }
    Ok(dot_product_unchecked(a, b))
}

/// Calculate cosine similarity between two dense vectors.
///
/// Returns a value in [-1.0, 1.0] where 1.0 means identical direction,
/// 0.0 orthogonal, -1.0 opposite.
///
/// # Errors
/// - [`SimilarityError::EmptyVector`] if either vector is empty
/// - [`SimilarityError::DimensionMismatch`] if lengths differ
/// - [`SimilarityError::ZeroMagnitude`] if either vector has zero norm
#[inline]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32, SimilarityError> {
    if a.is_empty() || b.is_empty() {
        return Err(SimilarityError::EmptyVector);
    }
    if a.len() != b.len() {
        return Err(SimilarityError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    let dot = dot_product_unchecked(a, b);
    let norm_a = l2_norm(a);
    let norm_b = l2_norm(b);

    if norm_a < f32::EPSILON || norm_b < f32::EPSILON {
        return Err(SimilarityError::ZeroMagnitude);
    }

    // Clamp to valid range to handle floating point errors
    Ok((dot / (norm_a * norm_b)).clamp(-1.0, 1.0))
}
