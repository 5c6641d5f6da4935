//! Reconstruction accuracy measurement for quantized vectors.

use serde::{Deserialize, Serialize};

use super::{dequantize, QuantizedVector};
use crate::similarity::cosine_similarity;

/// Root mean square error between an original vector and its
/// reconstruction. Returns 0.0 for empty or mismatched inputs.
pub fn compute_rmse(original: &[f32], restored: &[f32]) -> f32 {
    if original.is_empty() || original.len() != restored.len() {
        return 0.0;
    }
    let sum: f32 = original
        .iter()
        .zip(restored.iter())
        .map(|(a, b)| (a - b).powi(2))
        .sum();
    (sum / original.len() as f32).sqrt()
}

/// Largest absolute component error between an original vector and its
/// reconstruction. Returns 0.0 for empty or mismatched inputs.
pub fn compute_max_abs_error(original: &[f32], restored: &[f32]) -> f32 {
    original
        .iter()
        .zip(restored.iter())
        .map(|(a, b)| (a - b).abs())
        .fold(0.0, f32::max)
}

/// Accuracy report for one quantized vector against its source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccuracyReport {
    /// Root mean square reconstruction error.
    pub rmse: f32,
    /// Worst single-component error.
    pub max_abs_error: f32,
    /// Cosine between the original and the reconstruction.
    pub cosine_fidelity: f32,
}

impl AccuracyReport {
    /// Measure reconstruction accuracy of `quantized` against `original`.
    pub fn measure(original: &[f32], quantized: &QuantizedVector) -> Self {
        let restored = dequantize(quantized);
        let cosine_fidelity = cosine_similarity(original, &restored).unwrap_or(0.0);
        Self {
            rmse: compute_rmse(original, &restored),
            max_abs_error: compute_max_abs_error(original, &restored),
            cosine_fidelity,
        }
    }

    /// Whether reconstruction stays inside the documented error budget.
    pub fn within_budget(&self) -> bool {
        self.cosine_fidelity > 0.999
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quantization::quantize;
    use crate::similarity::normalize;

    #[test]
    fn report_on_smooth_vector_is_within_budget() {
        let mut v: Vec<f32> = (0..384).map(|i| ((i as f32) * 0.17).sin()).collect();
        normalize(&mut v);
        let q = quantize(&v).unwrap();
        let report = AccuracyReport::measure(&v, &q);

        assert!(report.within_budget());
        // Half a quantization level on a unit vector.
        assert!(report.max_abs_error < q.scale);
        assert!(report.rmse < q.scale);
    }

    #[test]
    fn rmse_of_identical_vectors_is_zero() {
        let v = vec![0.5f32; 16];
        assert_eq!(compute_rmse(&v, &v), 0.0);
        assert_eq!(compute_max_abs_error(&v, &v), 0.0);
    }
}
