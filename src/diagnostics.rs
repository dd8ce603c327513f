// src/diagnostics.rs

use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::eigenpairs::EigenDecomposition;
use crate::matrix::Matrix;

/// Numerical quality of one eigendecomposition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecompositionDiagnostics {
    pub matrix_dims: Option<(usize, usize)>,
    pub matrix_fro_norm: Option<f64>,

    // --- Eigenvector basis ---
    pub orthogonality_error: Option<f64>,         // ||I - V^T V||_F

    // --- Reconstruction V diag(lambda) V^T ---
    pub reconstruction_error_abs: Option<f64>,    // ||A - V L V^T||_F
    pub reconstruction_error_rel: Option<f64>,    // ||A - V L V^T||_F / ||A||_F
    pub reconstruction_error_max: Option<f64>,    // max |A - V L V^T|

    // --- Eigenvalues ---
    pub trace_minus_eigenvalue_sum: Option<f64>,

    pub sweeps: usize,
    pub rotations: usize,

    pub notes: String,
}

impl DecompositionDiagnostics {
    /// Measures how well `decomposition` reproduces `matrix`.
    pub fn evaluate(matrix: &Matrix, decomposition: &EigenDecomposition) -> Self {
        let mut diag = DecompositionDiagnostics {
            matrix_dims: Some(matrix.dim()),
            matrix_fro_norm: Some(compute_frob_norm(&matrix.view())),
            sweeps: decomposition.sweeps(),
            rotations: decomposition.rotations(),
            ..Default::default()
        };

        if matrix.dim() != decomposition.eigenvectors().dim() {
            diag.notes = format!(
                "matrix is {}x{} but the decomposition has {} eigenpairs",
                matrix.rows(),
                matrix.cols(),
                decomposition.len()
            );
            return diag;
        }

        diag.orthogonality_error = Some(compute_orthogonality_error(&decomposition.eigenvectors().view()));

        let reconstructed = decomposition.reconstruct();
        let residual = matrix.as_array() - reconstructed.as_array();
        let residual_norm = compute_frob_norm(&residual.view());
        diag.reconstruction_error_abs = Some(residual_norm);
        diag.reconstruction_error_rel = diag
            .matrix_fro_norm
            .filter(|&norm| norm > 1e-12)
            .map(|norm| residual_norm / norm);
        diag.reconstruction_error_max = Some(residual.iter().fold(0.0, |acc: f64, v| acc.max(v.abs())));
        diag.trace_minus_eigenvalue_sum = Some(matrix.trace() - decomposition.eigenvalues().sum());

        diag
    }
}

/// Computes the Frobenius norm of a matrix.
pub fn compute_frob_norm(matrix: &ArrayView2<f64>) -> f64 {
    if matrix.is_empty() {
        return 0.0;
    }
    matrix.iter().map(|&x| x * x).sum::<f64>().sqrt()
}

/// `||I - V^T V||_F`; zero for a matrix with orthonormal columns.
pub fn compute_orthogonality_error(v: &ArrayView2<f64>) -> f64 {
    if v.is_empty() {
        return 0.0;
    }
    let gram = v.t().dot(v);
    let deviation = Array2::<f64>::eye(gram.nrows()) - &gram;
    compute_frob_norm(&deviation.view())
}

/// `sqrt(sum_{i != j} a_ij^2)`
pub fn compute_off_diagonal_norm(matrix: &ArrayView2<f64>) -> f64 {
    matrix
        .indexed_iter()
        .filter(|((i, j), _)| i != j)
        .map(|(_, &v)| v * v)
        .sum::<f64>()
        .sqrt()
}
