// src/error.rs

use thiserror::Error;

/// Errors raised by the matrix, PCA and descriptive statistics routines.
///
/// Every variant describes a precondition that was violated at the point
/// where it was detected. None of them is transient, so callers should not
/// retry the operation with the same input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StatsError {
    /// Rows of unequal length, too few rows/columns, or a matrix that was
    /// required to be symmetric and is not.
    #[error("shape error: {0}")]
    Shape(String),

    /// Element access outside of the matrix.
    #[error("index ({row}, {col}) is out of bounds for a {rows}x{cols} matrix")]
    Index {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    /// Operands whose dimensions are incompatible for the requested operation.
    #[error("dimension mismatch: expected {expected}, found {actual}")]
    DimensionMismatch { expected: String, actual: String },

    /// A feature column has zero variance, so it cannot be standardized.
    #[error("feature column {column} has zero variance and cannot be standardized")]
    DegenerateFeature { column: usize },

    /// The eigensolver exhausted its sweep budget.
    #[error(
        "Jacobi eigensolver did not converge within {sweeps} sweeps \
         (largest remaining off-diagonal magnitude {max_off_diagonal:e})"
    )]
    Convergence { sweeps: usize, max_off_diagonal: f64 },

    /// A tolerance, threshold or other scalar argument is out of range.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, StatsError>;

impl StatsError {
    pub(crate) fn dimension_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        StatsError::DimensionMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub(crate) fn invalid_parameter(name: &'static str, reason: impl Into<String>) -> Self {
        StatsError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}
