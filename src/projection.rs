// src/projection.rs

use log::warn;
use ndarray::{s, Array1, Axis};
use serde::{Deserialize, Serialize};

use crate::eigenpairs::EigenDecomposition;
use crate::error::{Result, StatsError};
use crate::matrix::Matrix;

/// Default share of total variance the retained components must exceed.
pub const DEFAULT_VARIANCE_THRESHOLD: f64 = 0.95;

/// Principal-component scores `Y = Z * V_sorted` (N x p).
///
/// # Errors
/// Returns [`StatsError::DimensionMismatch`] if `Z` has a different number of
/// columns than there are eigenvectors.
pub fn project(standardized: &Matrix, sorted: &EigenDecomposition) -> Result<Matrix> {
    project_onto(standardized, sorted, sorted.len())
}

/// Scores on the first `k` sorted eigenvectors only (N x k).
///
/// # Errors
/// - [`StatsError::DimensionMismatch`] on a feature-count mismatch.
/// - [`StatsError::InvalidParameter`] if `k` exceeds the number of eigenvectors.
pub fn project_onto(standardized: &Matrix, sorted: &EigenDecomposition, k: usize) -> Result<Matrix> {
    if k > sorted.len() {
        return Err(StatsError::invalid_parameter(
            "k",
            format!("asked for {} components, only {} available", k, sorted.len()),
        ));
    }
    let basis = sorted.eigenvectors().as_array().slice(s![.., ..k]).to_owned();
    standardized.multiply(&Matrix::from_array(basis))
}

/// Total variance before and after projection.
///
/// For an orthonormal eigenvector basis the two totals agree up to rounding;
/// the pair is reported for inspection and never enforced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VarianceComparison {
    /// `sum_j Var(Z[:, j])`
    pub standardized_total: f64,
    /// `sum_j Var(Y[:, j])`
    pub projected_total: f64,
}

impl VarianceComparison {
    pub fn compute(standardized: &Matrix, projected: &Matrix) -> Self {
        Self {
            standardized_total: column_variances(standardized).sum(),
            projected_total: column_variances(projected).sum(),
        }
    }

    pub fn absolute_difference(&self) -> f64 {
        (self.standardized_total - self.projected_total).abs()
    }

    pub fn is_conserved(&self, tolerance: f64) -> bool {
        self.absolute_difference() <= tolerance
    }
}

/// Population variance (divisor N) of every column; empty for a matrix without rows.
pub fn column_variances(matrix: &Matrix) -> Array1<f64> {
    let x = matrix.as_array();
    match x.mean_axis(Axis(0)) {
        Some(means) => {
            let n = x.nrows() as f64;
            let centered = x - &means;
            centered.mapv(|v| v * v).sum_axis(Axis(0)) / n
        }
        None => Array1::zeros(x.ncols()),
    }
}

/// Cumulative share of eigenvalue mass and the smallest number of components
/// whose share exceeds the threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplainedVariance {
    /// `ratios[k - 1] = I(k) = sum_{i<=k} lambda_i / sum_all lambda_i`
    pub ratios: Array1<f64>,
    /// Smallest `p'` with `I(p') > threshold`, or `p` when no prefix qualifies.
    pub min_components: usize,
    pub threshold: f64,
    /// `false` when `min_components` fell back to `p`.
    pub threshold_reached: bool,
}

impl ExplainedVariance {
    /// Builds the curve from eigenvalues sorted in descending order.
    ///
    /// # Errors
    /// - [`StatsError::InvalidParameter`] if `threshold` is outside `(0, 1]`, or the
    ///   eigenvalues are empty or sum to a non-positive or non-finite value.
    pub fn from_sorted_eigenvalues(eigenvalues: &Array1<f64>, threshold: f64) -> Result<Self> {
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(StatsError::invalid_parameter(
                "variance_threshold",
                format!("must lie in (0, 1], got {}", threshold),
            ));
        }
        if eigenvalues.is_empty() {
            return Err(StatsError::invalid_parameter("eigenvalues", "no eigenvalues given"));
        }
        let total = eigenvalues.sum();
        if !total.is_finite() || total <= 0.0 {
            return Err(StatsError::invalid_parameter(
                "eigenvalues",
                format!("total eigenvalue mass must be positive, got {}", total),
            ));
        }

        let ratios = Array1::from_iter(eigenvalues.iter().scan(0.0, |running, &lambda| {
            *running += lambda;
            Some(*running / total)
        }));

        let p = eigenvalues.len();
        let hit = ratios.iter().position(|&ratio| ratio > threshold);
        let (min_components, threshold_reached) = match hit {
            Some(index) => (index + 1, true),
            None => {
                warn!(
                    "Explained variance never exceeds {} within {} components; keeping all of them.",
                    threshold, p
                );
                (p, false)
            }
        };

        Ok(Self {
            ratios,
            min_components,
            threshold,
            threshold_reached,
        })
    }

    /// `I(k)` for `1 <= k <= p`.
    pub fn ratio(&self, k: usize) -> Option<f64> {
        k.checked_sub(1).and_then(|i| self.ratios.get(i).copied())
    }
}
