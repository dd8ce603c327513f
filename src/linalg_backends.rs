// src/linalg_backends.rs

use crate::eigenpairs::EigenDecomposition;
use crate::error::Result;
use crate::jacobi::JacobiEigensolver;
use crate::matrix::Matrix;

/// Symmetric eigendecomposition used by the PCA pipeline.
///
/// Implementers receive a symmetric matrix and return its eigenpairs in any
/// order; `eigenvectors().column(i)` must correspond to `eigenvalues()[i]`.
/// The pipeline sorts the pairs itself.
pub trait SymmetricEigenBackend: Send + Sync {
    fn decompose_symmetric(&self, matrix: &Matrix) -> Result<EigenDecomposition>;

    /// Short name used in log messages.
    fn name(&self) -> &'static str;
}

impl SymmetricEigenBackend for JacobiEigensolver {
    fn decompose_symmetric(&self, matrix: &Matrix) -> Result<EigenDecomposition> {
        self.decompose(matrix)
    }

    fn name(&self) -> &'static str {
        "threshold-jacobi"
    }
}

impl<B: SymmetricEigenBackend + ?Sized> SymmetricEigenBackend for &B {
    fn decompose_symmetric(&self, matrix: &Matrix) -> Result<EigenDecomposition> {
        (**self).decompose_symmetric(matrix)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}
