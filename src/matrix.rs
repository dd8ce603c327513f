// src/matrix.rs

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StatsError};

/// Dense, row-major matrix of `f64` values with bounds-checked access.
///
/// This is a thin wrapper over [`ndarray::Array2`] that turns every shape
/// precondition into a [`StatsError`] instead of a panic. The underlying
/// array is available through [`Matrix::as_array`] for callers that want
/// the full ndarray API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    data: Array2<f64>,
}

impl Matrix {
    /// Builds a matrix from a sequence of rows.
    ///
    /// # Errors
    /// Returns [`StatsError::Shape`] if the rows do not all have the same length.
    ///
    /// # Examples
    ///
    /// ```
    /// use jacobi_pca::Matrix;
    ///
    /// let m = Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
    /// assert_eq!(m.get(1, 0).unwrap(), 3.0);
    /// assert!(Matrix::from_rows(&[vec![1.0], vec![2.0, 3.0]]).is_err());
    /// ```
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self> {
        let n_rows = rows.len();
        let n_cols = rows.first().map_or(0, |row| row.as_ref().len());

        let mut flat = Vec::with_capacity(n_rows * n_cols);
        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != n_cols {
                return Err(StatsError::Shape(format!(
                    "row {} has {} entries, expected {}",
                    i,
                    row.len(),
                    n_cols
                )));
            }
            flat.extend_from_slice(row);
        }

        let data = Array2::from_shape_vec((n_rows, n_cols), flat)
            .map_err(|e| StatsError::Shape(e.to_string()))?;
        Ok(Self { data })
    }

    /// Wraps an existing ndarray matrix.
    pub fn from_array(data: Array2<f64>) -> Self {
        Self { data }
    }

    /// A `rows x cols` matrix of zeros.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            data: Array2::zeros((rows, cols)),
        }
    }

    /// The `n x n` identity matrix.
    pub fn identity(n: usize) -> Self {
        Self {
            data: Array2::eye(n),
        }
    }

    /// A square matrix with `values` on the diagonal.
    pub fn from_diagonal(values: &[f64]) -> Self {
        Self {
            data: Array2::from_diag(&Array1::from(values.to_vec())),
        }
    }

    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    /// `(rows, cols)`
    pub fn dim(&self) -> (usize, usize) {
        self.data.dim()
    }

    pub fn is_square(&self) -> bool {
        self.rows() == self.cols()
    }

    /// Returns the element at `(i, j)`.
    ///
    /// # Errors
    /// Returns [`StatsError::Index`] when `(i, j)` lies outside the matrix.
    pub fn get(&self, i: usize, j: usize) -> Result<f64> {
        self.data
            .get((i, j))
            .copied()
            .ok_or_else(|| self.index_error(i, j))
    }

    /// Overwrites the element at `(i, j)`.
    ///
    /// # Errors
    /// Returns [`StatsError::Index`] when `(i, j)` lies outside the matrix.
    pub fn set(&mut self, i: usize, j: usize, value: f64) -> Result<()> {
        let err = self.index_error(i, j);
        let slot = self.data.get_mut((i, j)).ok_or(err)?;
        *slot = value;
        Ok(())
    }

    fn index_error(&self, row: usize, col: usize) -> StatsError {
        StatsError::Index {
            row,
            col,
            rows: self.rows(),
            cols: self.cols(),
        }
    }

    /// New matrix with rows and columns swapped.
    pub fn transpose(&self) -> Matrix {
        Matrix {
            data: self.data.t().to_owned(),
        }
    }

    /// Matrix product `self * other`.
    ///
    /// # Errors
    /// Returns [`StatsError::DimensionMismatch`] unless `self.cols() == other.rows()`.
    pub fn multiply(&self, other: &Matrix) -> Result<Matrix> {
        if self.cols() != other.rows() {
            return Err(StatsError::dimension_mismatch(
                format!("left operand columns == right operand rows ({})", self.cols()),
                format!("{}x{} * {}x{}", self.rows(), self.cols(), other.rows(), other.cols()),
            ));
        }
        Ok(Matrix {
            data: self.data.dot(&other.data),
        })
    }

    /// Main diagonal (length `min(rows, cols)`).
    pub fn diagonal(&self) -> Array1<f64> {
        self.data.diag().to_owned()
    }

    /// Sum of the main diagonal.
    pub fn trace(&self) -> f64 {
        self.data.diag().sum()
    }

    /// View of column `j`.
    ///
    /// # Errors
    /// Returns [`StatsError::Index`] when `j >= cols()`.
    pub fn column(&self, j: usize) -> Result<ArrayView1<'_, f64>> {
        if j >= self.cols() {
            return Err(self.index_error(0, j));
        }
        Ok(self.data.column(j))
    }

    /// View of row `i`.
    ///
    /// # Errors
    /// Returns [`StatsError::Index`] when `i >= rows()`.
    pub fn row(&self, i: usize) -> Result<ArrayView1<'_, f64>> {
        if i >= self.rows() {
            return Err(self.index_error(i, 0));
        }
        Ok(self.data.row(i))
    }

    /// `true` when the matrix is square and `|A[i][j] - A[j][i]| <= tolerance`
    /// for every pair.
    pub fn is_symmetric(&self, tolerance: f64) -> bool {
        if !self.is_square() {
            return false;
        }
        let n = self.rows();
        (0..n).all(|i| {
            (i + 1..n).all(|j| (self.data[[i, j]] - self.data[[j, i]]).abs() <= tolerance)
        })
    }

    /// Largest absolute entry-wise difference between two matrices of the same shape.
    ///
    /// # Errors
    /// Returns [`StatsError::DimensionMismatch`] if the shapes differ.
    pub fn max_abs_diff(&self, other: &Matrix) -> Result<f64> {
        if self.dim() != other.dim() {
            return Err(StatsError::dimension_mismatch(
                format!("{}x{}", self.rows(), self.cols()),
                format!("{}x{}", other.rows(), other.cols()),
            ));
        }
        Ok(self
            .data
            .iter()
            .zip(other.data.iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max))
    }

    /// Copies the contents into nested row vectors.
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.data
            .axis_iter(Axis(0))
            .map(|row| row.to_vec())
            .collect()
    }

    pub fn as_array(&self) -> &Array2<f64> {
        &self.data
    }

    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.data.view()
    }

    pub fn into_array(self) -> Array2<f64> {
        self.data
    }
}

impl From<Array2<f64>> for Matrix {
    fn from(data: Array2<f64>) -> Self {
        Matrix::from_array(data)
    }
}

impl From<Matrix> for Array2<f64> {
    fn from(matrix: Matrix) -> Self {
        matrix.data
    }
}
