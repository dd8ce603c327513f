// src/standardize.rs

use log::debug;
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StatsError};
use crate::matrix::Matrix;

/// Per-feature mean and population variance (divisor N) of a data matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureStatistics {
    /// Column means. Shape: (n_features)
    pub means: Array1<f64>,
    /// Column population variances. Shape: (n_features)
    pub variances: Array1<f64>,
}

impl FeatureStatistics {
    /// Computes column means and population variances of an N x p matrix.
    ///
    /// # Errors
    /// Returns [`StatsError::Shape`] when the matrix has fewer than 2 rows or no columns.
    pub fn compute(data: &Matrix) -> Result<Self> {
        check_feature_matrix_shape(data)?;
        let x = data.as_array();
        let n = x.nrows() as f64;

        let means = x.sum_axis(Axis(0)) / n;
        let variances = Array1::from_iter(x.axis_iter(Axis(1)).zip(means.iter()).map(
            |(column, &mean)| column.iter().map(|&v| (v - mean) * (v - mean)).sum::<f64>() / n,
        ));

        Ok(Self { means, variances })
    }

    pub fn n_features(&self) -> usize {
        self.means.len()
    }

    /// Square roots of the variances.
    pub fn standard_deviations(&self) -> Array1<f64> {
        self.variances.mapv(f64::sqrt)
    }
}

pub(crate) fn check_feature_matrix_shape(data: &Matrix) -> Result<()> {
    let (n_samples, n_features) = data.dim();
    if n_samples < 2 {
        return Err(StatsError::Shape(format!(
            "feature matrix needs at least 2 rows, found {}",
            n_samples
        )));
    }
    if n_features == 0 {
        return Err(StatsError::Shape("feature matrix has no columns".to_string()));
    }
    Ok(())
}

/// Z-scores every column: `Z[i][j] = (X[i][j] - mean[j]) / sqrt(variance[j])`.
///
/// A column is degenerate when its variance is zero or all of its entries are
/// identical (rounding in the mean can leave a tiny non-zero variance for a
/// constant column).
///
/// # Errors
/// - [`StatsError::DimensionMismatch`] if `statistics` was computed for a different
///   number of features.
/// - [`StatsError::DegenerateFeature`] for the first degenerate column.
pub fn standardize(data: &Matrix, statistics: &FeatureStatistics) -> Result<Matrix> {
    check_feature_matrix_shape(data)?;
    if statistics.n_features() != data.cols() {
        return Err(StatsError::dimension_mismatch(
            format!("{} feature statistics", data.cols()),
            format!("{}", statistics.n_features()),
        ));
    }

    let x = data.as_array();
    for (j, column) in x.axis_iter(Axis(1)).enumerate() {
        let first = column[0];
        if statistics.variances[j] == 0.0 || column.iter().all(|&v| v == first) {
            return Err(StatsError::DegenerateFeature { column: j });
        }
    }

    let std_devs = statistics.standard_deviations();
    let mut z = x.to_owned();
    z -= &statistics.means;
    z /= &std_devs;

    debug!(
        "Standardized {}x{} feature matrix.",
        data.rows(),
        data.cols()
    );
    Ok(Matrix::from_array(z))
}

/// `C[i][j] = (1/N) * sum_k Z[k][i] * Z[k][j]` for a standardized N x p matrix.
///
/// Only the upper triangle is summed; the lower triangle is mirrored so the
/// result is exactly symmetric.
///
/// # Errors
/// Returns [`StatsError::Shape`] when the matrix has fewer than 2 rows or no columns.
pub fn correlation_matrix(standardized: &Matrix) -> Result<Matrix> {
    check_feature_matrix_shape(standardized)?;
    Ok(Matrix::from_array(cross_product_over_n(standardized.as_array())))
}

/// Population covariance of raw data:
/// `S[i][j] = (1/N) * sum_k (X[k][i] - mean[i]) * (X[k][j] - mean[j])`.
///
/// # Errors
/// Same shape checks as [`correlation_matrix`]; [`StatsError::DimensionMismatch`]
/// if `statistics` does not match the number of columns.
pub fn covariance_matrix(data: &Matrix, statistics: &FeatureStatistics) -> Result<Matrix> {
    check_feature_matrix_shape(data)?;
    if statistics.n_features() != data.cols() {
        return Err(StatsError::dimension_mismatch(
            format!("{} feature statistics", data.cols()),
            format!("{}", statistics.n_features()),
        ));
    }
    let centered = data.as_array() - &statistics.means;
    Ok(Matrix::from_array(cross_product_over_n(&centered)))
}

fn cross_product_over_n(x: &Array2<f64>) -> Array2<f64> {
    let (n_samples, n_features) = x.dim();
    let n = n_samples as f64;
    let mut out = Array2::<f64>::zeros((n_features, n_features));
    for i in 0..n_features {
        let col_i = x.column(i);
        for j in i..n_features {
            let value = col_i.dot(&x.column(j)) / n;
            out[[i, j]] = value;
            out[[j, i]] = value;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn sample() -> Matrix {
        Matrix::from_rows(&[
            vec![1.0, 10.0, 3.0],
            vec![2.0, 8.0, 3.5],
            vec![3.0, 6.0, 2.0],
            vec![4.0, 4.0, 5.0],
            vec![5.0, 2.0, 1.5],
        ])
        .unwrap()
    }

    #[test]
    fn statistics_use_population_variance() {
        let stats = FeatureStatistics::compute(&sample()).unwrap();
        assert_abs_diff_eq!(stats.means[0], 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(stats.means[1], 6.0, epsilon = 1e-12);
        // (4 + 1 + 0 + 1 + 4) / 5
        assert_abs_diff_eq!(stats.variances[0], 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(stats.variances[1], 8.0, epsilon = 1e-12);
    }

    #[test]
    fn standardized_columns_have_zero_mean_unit_variance() {
        let data = sample();
        let stats = FeatureStatistics::compute(&data).unwrap();
        let z = standardize(&data, &stats).unwrap();
        let z_stats = FeatureStatistics::compute(&z).unwrap();
        for j in 0..3 {
            assert_abs_diff_eq!(z_stats.means[j], 0.0, epsilon = 1e-12);
            assert_abs_diff_eq!(z_stats.variances[j], 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn correlation_has_unit_diagonal_and_is_symmetric() {
        let data = sample();
        let stats = FeatureStatistics::compute(&data).unwrap();
        let z = standardize(&data, &stats).unwrap();
        let c = correlation_matrix(&z).unwrap();
        assert!(c.is_symmetric(0.0));
        for i in 0..3 {
            assert_abs_diff_eq!(c.get(i, i).unwrap(), 1.0, epsilon = 1e-12);
        }
        // Columns 0 and 1 are perfectly anti-correlated.
        assert_abs_diff_eq!(c.get(0, 1).unwrap(), -1.0, epsilon = 1e-12);
        for value in c.as_array().iter() {
            assert!(value.abs() <= 1.0 + 1e-12);
        }
    }

    #[test]
    fn covariance_diagonal_equals_variances() {
        let data = sample();
        let stats = FeatureStatistics::compute(&data).unwrap();
        let s = covariance_matrix(&data, &stats).unwrap();
        for j in 0..3 {
            assert_abs_diff_eq!(s.get(j, j).unwrap(), stats.variances[j], epsilon = 1e-12);
        }
        assert_abs_diff_eq!(s.get(0, 1).unwrap(), -4.0, epsilon = 1e-12);
    }

    #[test]
    fn constant_column_is_degenerate() {
        let data = Matrix::from_rows(&[vec![1.0, 0.1], vec![2.0, 0.1], vec![4.0, 0.1]]).unwrap();
        let stats = FeatureStatistics::compute(&data).unwrap();
        let err = standardize(&data, &stats).unwrap_err();
        assert_eq!(err, StatsError::DegenerateFeature { column: 1 });
    }

    #[test]
    fn single_row_is_rejected() {
        let data = Matrix::from_rows(&[vec![1.0, 2.0]]).unwrap();
        assert!(matches!(FeatureStatistics::compute(&data), Err(StatsError::Shape(_))));
    }
}
