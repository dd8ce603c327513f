// src/jacobi.rs

//! Threshold Jacobi eigensolver for small dense symmetric matrices.
//!
//! Every sweep searches the strict upper triangle for the largest entry
//! whose magnitude exceeds the current barrier `ak`, annihilates it with a
//! plane rotation, and divides the barrier by `p^2`. The iteration stops once
//! every off-diagonal entry is at most `eps * a0`, where `a0` is the initial
//! barrier `sqrt(2 * sum_{i<j} a_ij^2) / p`.

use log::{debug, trace};
use ndarray::{Array1, Array2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::eigenpairs::EigenDecomposition;
use crate::error::{Result, StatsError};
use crate::matrix::Matrix;

/// Default relative tolerance; loose, but enough for two or three
/// significant digits in the eigenvalues of a correlation matrix.
pub const DEFAULT_TOLERANCE: f64 = 1e-2;

/// Default absolute asymmetry (scaled by the largest entry) accepted on input.
pub const DEFAULT_SYMMETRY_TOLERANCE: f64 = 1e-9;

/// Settings for [`JacobiEigensolver`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JacobiConfig {
    /// Convergence tolerance relative to the initial barrier `a0`.
    pub tolerance: f64,
    /// Hard cap on sweeps. `None` derives a cap from the matrix size and tolerance.
    pub max_sweeps: Option<usize>,
    /// Inputs with `|a_ij - a_ji| > symmetry_tolerance * max(1, max|a|)` are rejected.
    pub symmetry_tolerance: f64,
}

impl Default for JacobiConfig {
    fn default() -> Self {
        JacobiConfig {
            tolerance: DEFAULT_TOLERANCE,
            max_sweeps: None,
            symmetry_tolerance: DEFAULT_SYMMETRY_TOLERANCE,
        }
    }
}

impl JacobiConfig {
    /// Default settings with a different relative tolerance.
    pub fn with_tolerance(tolerance: f64) -> Self {
        JacobiConfig {
            tolerance,
            ..Default::default()
        }
    }

    fn validate(&self) -> Result<()> {
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(StatsError::invalid_parameter(
                "tolerance",
                format!("must be finite and positive, got {}", self.tolerance),
            ));
        }
        if !self.symmetry_tolerance.is_finite() || self.symmetry_tolerance < 0.0 {
            return Err(StatsError::invalid_parameter(
                "symmetry_tolerance",
                format!("must be finite and non-negative, got {}", self.symmetry_tolerance),
            ));
        }
        if self.max_sweeps == Some(0) {
            return Err(StatsError::invalid_parameter("max_sweeps", "must be at least 1"));
        }
        Ok(())
    }

    /// Sweep budget for a `p x p` matrix.
    ///
    /// Each rotation shrinks the off-diagonal energy by at least a factor
    /// `1 - 1/P` with `P = p(p-1)/2`, so about `2 P ln(p / eps)` rotations are
    /// enough; the budget leaves a wide margin on top of that.
    pub fn sweep_limit(&self, p: usize) -> usize {
        if let Some(limit) = self.max_sweeps {
            return limit;
        }
        let pairs = (p * p.saturating_sub(1) / 2).max(1);
        let log_factor = ((p.max(2) as f64) / self.tolerance).ln().ceil().max(1.0) as usize;
        8 * pairs * log_factor + 100
    }
}

/// Cyclic-with-threshold Jacobi eigensolver.
///
/// The solver never mutates its input: it works on a private copy `A'` of the
/// matrix and a private rotation accumulator `T`, and returns fresh values.
///
/// # Examples
///
/// ```
/// use jacobi_pca::{JacobiConfig, JacobiEigensolver, Matrix};
///
/// let a = Matrix::from_rows(&[vec![2.0, 1.0], vec![1.0, 2.0]]).unwrap();
/// let solver = JacobiEigensolver::new(JacobiConfig::with_tolerance(1e-12)).unwrap();
/// let eig = solver.decompose(&a).unwrap().sorted_descending();
/// assert!((eig.eigenvalues()[0] - 3.0).abs() < 1e-9);
/// assert!((eig.eigenvalues()[1] - 1.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct JacobiEigensolver {
    config: JacobiConfig,
}

/// Rotation parameters `(s, c)` for the pivot `(p, q)`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct PlaneRotation {
    p: usize,
    q: usize,
    s: f64,
    c: f64,
}

impl JacobiEigensolver {
    /// # Errors
    /// Returns [`StatsError::InvalidParameter`] for a non-positive or non-finite
    /// tolerance, a negative symmetry tolerance, or a zero sweep cap.
    pub fn new(config: JacobiConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &JacobiConfig {
        &self.config
    }

    /// Diagonalizes a symmetric matrix.
    ///
    /// The returned eigenpairs are in the order the rotations leave them on
    /// the diagonal; use [`EigenDecomposition::sorted_descending`] to rank them.
    ///
    /// # Errors
    /// - [`StatsError::DimensionMismatch`] if the matrix is not square.
    /// - [`StatsError::InvalidParameter`] if it contains NaN or infinite entries.
    /// - [`StatsError::Shape`] if it is not symmetric.
    /// - [`StatsError::Convergence`] if the sweep budget runs out.
    pub fn decompose(&self, matrix: &Matrix) -> Result<EigenDecomposition> {
        self.check_input(matrix)?;
        let n = matrix.rows();
        if n == 0 {
            return EigenDecomposition::new(Matrix::zeros(0, 0), Array1::zeros(0));
        }

        let mut a = matrix.as_array().to_owned();
        let mut t = Array2::<f64>::eye(n);

        let a0 = upper_triangle_norm(&a) / n as f64 * std::f64::consts::SQRT_2;
        let threshold = self.config.tolerance * a0;
        let shrink = (n * n) as f64;
        let max_sweeps = self.config.sweep_limit(n);
        let mut barrier = a0;
        let mut sweeps = 0usize;
        let mut rotations = 0usize;

        debug!(
            "Jacobi: {}x{} matrix, a0 = {:e}, stop threshold = {:e}, sweep cap = {}.",
            n, n, a0, threshold, max_sweeps
        );

        while !off_diagonal_within(&a, threshold) {
            if sweeps == max_sweeps {
                return Err(StatsError::Convergence {
                    sweeps,
                    max_off_diagonal: max_off_diagonal(&a),
                });
            }
            sweeps += 1;

            if let Some((p, q)) = find_pivot(&a, barrier) {
                let rotation = rotation_for(&a, p, q);
                apply_rotation(&mut a, &mut t, rotation);
                rotations += 1;
                trace!(
                    "sweep {}: rotated ({}, {}) with s = {:.6}, c = {:.6}",
                    sweeps,
                    p,
                    q,
                    rotation.s,
                    rotation.c
                );
            } else {
                trace!("sweep {}: no entry above barrier {:e}", sweeps, barrier);
            }

            barrier /= shrink;
        }

        debug!(
            "Jacobi converged after {} sweeps ({} rotations).",
            sweeps, rotations
        );

        let eigenvalues = a.diag().to_owned();
        Ok(EigenDecomposition::new(Matrix::from_array(t), eigenvalues)?
            .with_iteration_counts(sweeps, rotations))
    }

    /// Decomposes independent matrices in parallel. Results keep the input order.
    pub fn decompose_many(&self, matrices: &[Matrix]) -> Vec<Result<EigenDecomposition>> {
        matrices.par_iter().map(|m| self.decompose(m)).collect()
    }

    fn check_input(&self, matrix: &Matrix) -> Result<()> {
        if !matrix.is_square() {
            return Err(StatsError::dimension_mismatch(
                "square matrix",
                format!("{}x{}", matrix.rows(), matrix.cols()),
            ));
        }
        if matrix.as_array().iter().any(|v| !v.is_finite()) {
            return Err(StatsError::invalid_parameter(
                "matrix",
                "contains NaN or infinite entries",
            ));
        }
        let scale = matrix.as_array().iter().fold(1.0f64, |acc, v| acc.max(v.abs()));
        if !matrix.is_symmetric(self.config.symmetry_tolerance * scale) {
            return Err(StatsError::Shape("matrix is not symmetric".to_string()));
        }
        Ok(())
    }
}

/// `sqrt(sum_{i<j} a_ij^2)`, accumulated with `hypot` so that neither
/// huge nor tiny entries overflow or underflow.
fn upper_triangle_norm(a: &Array2<f64>) -> f64 {
    let n = a.nrows();
    let mut norm = 0.0f64;
    for i in 0..n {
        for j in i + 1..n {
            norm = norm.hypot(a[[i, j]]);
        }
    }
    norm
}

fn off_diagonal_within(a: &Array2<f64>, threshold: f64) -> bool {
    let n = a.nrows();
    (0..n).all(|i| (i + 1..n).all(|j| a[[i, j]].abs() <= threshold))
}

/// Largest strictly-upper magnitude; NaN if any entry is NaN.
fn max_off_diagonal(a: &Array2<f64>) -> f64 {
    let n = a.nrows();
    let mut max = 0.0f64;
    for i in 0..n {
        for j in i + 1..n {
            let magnitude = a[[i, j]].abs();
            if magnitude.is_nan() {
                return f64::NAN;
            }
            max = max.max(magnitude);
        }
    }
    max
}

/// Largest `|a_ij|`, `i < j`, strictly above `barrier`. Ties keep the first
/// pair in row-major order.
fn find_pivot(a: &Array2<f64>, barrier: f64) -> Option<(usize, usize)> {
    let n = a.nrows();
    let mut best: Option<(usize, usize, f64)> = None;
    for i in 0..n {
        for j in i + 1..n {
            let magnitude = a[[i, j]].abs();
            if magnitude <= barrier {
                continue;
            }
            match best {
                Some((_, _, current)) if magnitude <= current => {}
                _ => best = Some((i, j, magnitude)),
            }
        }
    }
    best.map(|(i, j, _)| (i, j))
}

fn rotation_for(a: &Array2<f64>, p: usize, q: usize) -> PlaneRotation {
    let apq = a[[p, q]];
    let y = (a[[p, p]] - a[[q, q]]) / 2.0;
    let x = if y == 0.0 {
        -1.0
    } else {
        let sign = if y >= 0.0 { 1.0 } else { -1.0 };
        -sign * apq / apq.hypot(y)
    };
    // |x| <= 1 up to rounding.
    let s = x / (2.0 * (1.0 + (1.0 - x * x).max(0.0).sqrt())).sqrt();
    let c = (1.0 - s * s).sqrt();
    PlaneRotation { p, q, s, c }
}

fn apply_rotation(a: &mut Array2<f64>, t: &mut Array2<f64>, rotation: PlaneRotation) {
    let PlaneRotation { p, q, s, c } = rotation;
    let n = a.nrows();

    for i in 0..n {
        if i == p || i == q {
            continue;
        }
        let aip = a[[i, p]];
        let aiq = a[[i, q]];
        let new_ip = c * aip - s * aiq;
        let new_iq = s * aip + c * aiq;
        a[[i, p]] = new_ip;
        a[[p, i]] = new_ip;
        a[[i, q]] = new_iq;
        a[[q, i]] = new_iq;
    }

    let v1 = a[[p, p]];
    let v2 = a[[p, q]];
    let v3 = a[[q, q]];
    let (ss, cc, sc) = (s * s, c * c, s * c);
    a[[p, p]] = cc * v1 + ss * v3 - 2.0 * sc * v2;
    a[[q, q]] = ss * v1 + cc * v3 + 2.0 * sc * v2;
    let apq = (v1 - v3) * sc + v2 * (cc - ss);
    a[[p, q]] = apq;
    a[[q, p]] = apq;

    for i in 0..n {
        let tip = t[[i, p]];
        let tiq = t[[i, q]];
        t[[i, p]] = c * tip - s * tiq;
        t[[i, q]] = s * tip + c * tiq;
    }
}
