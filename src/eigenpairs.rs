// src/eigenpairs.rs

use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StatsError};
use crate::matrix::Matrix;

/// Eigenvalues paired with the columns of an eigenvector matrix.
///
/// `eigenvectors().column(i)` is the eigenvector for `eigenvalues()[i]`; every
/// reordering applies one permutation to both so the pairing survives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EigenDecomposition {
    /// Shape: (p, p), eigenvectors as columns.
    eigenvectors: Matrix,
    /// Shape: (p)
    eigenvalues: Array1<f64>,
    /// Sweeps the solver needed (0 for decompositions built by hand).
    sweeps: usize,
    /// Rotations the solver applied.
    rotations: usize,
}

impl EigenDecomposition {
    /// Pairs an eigenvector matrix with its eigenvalues.
    ///
    /// # Errors
    /// Returns [`StatsError::DimensionMismatch`] if the matrix is not square or its
    /// column count differs from the number of eigenvalues.
    pub fn new(eigenvectors: Matrix, eigenvalues: Array1<f64>) -> Result<Self> {
        if !eigenvectors.is_square() || eigenvectors.cols() != eigenvalues.len() {
            return Err(StatsError::dimension_mismatch(
                format!("{0}x{0} eigenvector matrix", eigenvalues.len()),
                format!("{}x{}", eigenvectors.rows(), eigenvectors.cols()),
            ));
        }
        Ok(Self {
            eigenvectors,
            eigenvalues,
            sweeps: 0,
            rotations: 0,
        })
    }

    pub(crate) fn with_iteration_counts(mut self, sweeps: usize, rotations: usize) -> Self {
        self.sweeps = sweeps;
        self.rotations = rotations;
        self
    }

    pub fn eigenvectors(&self) -> &Matrix {
        &self.eigenvectors
    }

    pub fn eigenvalues(&self) -> &Array1<f64> {
        &self.eigenvalues
    }

    /// Eigenvector `i` (column `i` of the eigenvector matrix).
    ///
    /// # Errors
    /// Returns [`StatsError::Index`] when `i >= len()`.
    pub fn eigenvector(&self, i: usize) -> Result<ArrayView1<'_, f64>> {
        self.eigenvectors.column(i)
    }

    pub fn len(&self) -> usize {
        self.eigenvalues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.eigenvalues.is_empty()
    }

    pub fn sweeps(&self) -> usize {
        self.sweeps
    }

    pub fn rotations(&self) -> usize {
        self.rotations
    }

    pub fn into_parts(self) -> (Matrix, Array1<f64>) {
        (self.eigenvectors, self.eigenvalues)
    }

    /// Returns the pairs reordered by descending eigenvalue.
    ///
    /// The sort is stable: equal eigenvalues keep their original relative
    /// order, so sorting an already sorted decomposition is a no-op.
    pub fn sorted_descending(&self) -> EigenDecomposition {
        let order = descending_order(self.eigenvalues.view());
        let eigenvalues = Array1::from_iter(order.iter().map(|&k| self.eigenvalues[k]));
        let eigenvectors = self.eigenvectors.as_array().select(Axis(1), &order);
        EigenDecomposition {
            eigenvectors: Matrix::from_array(eigenvectors),
            eigenvalues,
            sweeps: self.sweeps,
            rotations: self.rotations,
        }
    }

    pub fn is_sorted_descending(&self) -> bool {
        self.eigenvalues
            .windows(2)
            .into_iter()
            .all(|pair| pair[0] >= pair[1])
    }

    /// `V * diag(lambda) * V^T`
    pub fn reconstruct(&self) -> Matrix {
        let v = self.eigenvectors.as_array();
        let scaled: Array2<f64> = v * &self.eigenvalues;
        Matrix::from_array(scaled.dot(&v.t()))
    }
}

/// Permutation that orders `values` descending; ties keep ascending index order.
pub fn descending_order(values: ArrayView1<'_, f64>) -> Vec<usize> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[b].total_cmp(&values[a]));
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn unsorted() -> EigenDecomposition {
        let vectors = Matrix::from_array(array![
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0]
        ]);
        EigenDecomposition::new(vectors, array![0.5, 2.0, 0.5, 1.0]).unwrap()
    }

    #[test]
    fn sorts_descending_with_stable_ties() {
        let sorted = unsorted().sorted_descending();
        assert_eq!(sorted.eigenvalues().to_vec(), vec![2.0, 1.0, 0.5, 0.5]);
        // Ties at 0.5 keep index order 0 then 2.
        assert_eq!(descending_order(unsorted().eigenvalues().view()), vec![1, 3, 0, 2]);
        assert_eq!(sorted.eigenvector(0).unwrap().to_vec(), vec![0.0, 1.0, 0.0, 0.0]);
        assert_eq!(sorted.eigenvector(2).unwrap().to_vec(), vec![1.0, 0.0, 0.0, 0.0]);
        assert_eq!(sorted.eigenvector(3).unwrap().to_vec(), vec![0.0, 0.0, 1.0, 0.0]);
        assert!(sorted.is_sorted_descending());
    }

    #[test]
    fn nan_eigenvalues_still_give_a_total_order() {
        let values = array![1.0, f64::NAN, 2.0, 1.0, -3.0];
        // Positive NaN sorts above every number; ties stay in index order.
        assert_eq!(descending_order(values.view()), vec![1, 2, 0, 3, 4]);
    }

    #[test]
    fn sorting_is_idempotent() {
        let once = unsorted().sorted_descending();
        let twice = once.sorted_descending();
        assert_eq!(once, twice);
    }

    #[test]
    fn reconstruct_of_rotation_pair() {
        let h = std::f64::consts::FRAC_1_SQRT_2;
        let vectors = Matrix::from_array(array![[h, -h], [h, h]]);
        let decomposition = EigenDecomposition::new(vectors, array![3.0, 1.0]).unwrap();
        let a = decomposition.reconstruct();
        assert_abs_diff_eq!(a.get(0, 0).unwrap(), 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(a.get(0, 1).unwrap(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(a.get(1, 1).unwrap(), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let err = EigenDecomposition::new(Matrix::identity(3), array![1.0, 2.0]).unwrap_err();
        assert!(matches!(err, StatsError::DimensionMismatch { .. }));
    }
}
