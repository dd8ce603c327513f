// Principal component analysis on the correlation matrix

use log::{debug, info};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::diagnostics::DecompositionDiagnostics;
use crate::eigenpairs::EigenDecomposition;
use crate::error::{Result, StatsError};
use crate::gate::{GateDecision, IndependenceGate, DEFAULT_CRITICAL_VALUE};
use crate::jacobi::{JacobiConfig, JacobiEigensolver};
use crate::linalg_backends::SymmetricEigenBackend;
use crate::matrix::Matrix;
use crate::projection::{project, ExplainedVariance, VarianceComparison, DEFAULT_VARIANCE_THRESHOLD};
use crate::standardize::{check_feature_matrix_shape, correlation_matrix, standardize, FeatureStatistics};

/// An N x p table of observations with one name per feature column.
///
/// The names are carried through to the report for presentation only; no
/// computation looks at them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureTable {
    feature_names: Vec<String>,
    data: Matrix,
}

impl FeatureTable {
    /// # Errors
    /// - [`StatsError::Shape`] if the matrix has fewer than 2 rows or no columns.
    /// - [`StatsError::DimensionMismatch`] if the number of names differs from the
    ///   number of columns.
    pub fn new(feature_names: Vec<String>, data: Matrix) -> Result<Self> {
        check_feature_matrix_shape(&data)?;
        if feature_names.len() != data.cols() {
            return Err(StatsError::dimension_mismatch(
                format!("{} feature names", data.cols()),
                format!("{}", feature_names.len()),
            ));
        }
        Ok(Self { feature_names, data })
    }

    /// Names the columns `x1`, `x2`, ...
    ///
    /// # Errors
    /// Same shape checks as [`FeatureTable::new`].
    pub fn from_matrix(data: Matrix) -> Result<Self> {
        let names = (1..=data.cols()).map(|j| format!("x{}", j)).collect();
        Self::new(names, data)
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn data(&self) -> &Matrix {
        &self.data
    }

    pub fn n_samples(&self) -> usize {
        self.data.rows()
    }

    pub fn n_features(&self) -> usize {
        self.data.cols()
    }
}

/// Settings for a [`CorrelationPca`] run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PcaConfig {
    pub jacobi: JacobiConfig,
    /// `d_max` for the independence gate.
    pub critical_value: f64,
    /// Share of total variance the retained components must exceed.
    pub variance_threshold: f64,
}

impl Default for PcaConfig {
    fn default() -> Self {
        PcaConfig {
            jacobi: JacobiConfig::default(),
            critical_value: DEFAULT_CRITICAL_VALUE,
            variance_threshold: DEFAULT_VARIANCE_THRESHOLD,
        }
    }
}

/// Everything a completed analysis produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PcaReport {
    pub feature_names: Vec<String>,
    /// Means and population variances of the raw features.
    pub statistics: FeatureStatistics,
    pub standardized: Matrix,
    pub correlation: Matrix,
    /// Independence statistic `d` and the critical value it beat.
    pub gate_statistic: f64,
    pub critical_value: f64,
    /// Eigenpairs in descending eigenvalue order.
    pub decomposition: EigenDecomposition,
    /// Principal-component scores, N x p.
    pub scores: Matrix,
    pub variance: VarianceComparison,
    pub explained: ExplainedVariance,
    pub diagnostics: DecompositionDiagnostics,
    /// Name of the eigensolver that produced `decomposition`.
    pub backend: String,
}

impl PcaReport {
    pub fn eigenvalues(&self) -> &Array1<f64> {
        self.decomposition.eigenvalues()
    }

    /// Smallest number of components whose explained variance exceeds the threshold.
    pub fn min_components(&self) -> usize {
        self.explained.min_components
    }

    /// Coefficients of component `k` (0-based) on the standardized features,
    /// paired with the feature names.
    ///
    /// # Errors
    /// Returns [`StatsError::Index`] if `k` is not a component index.
    pub fn loadings(&self, k: usize) -> Result<Vec<(&str, f64)>> {
        let column = self.decomposition.eigenvector(k)?;
        Ok(self
            .feature_names
            .iter()
            .map(String::as_str)
            .zip(column.iter().copied())
            .collect())
    }

    /// Projects new observations with the fitted means, scales and eigenvectors.
    ///
    /// # Errors
    /// Returns [`StatsError::DimensionMismatch`] if `data` has the wrong number of columns.
    pub fn transform(&self, data: &Matrix) -> Result<Matrix> {
        if data.cols() != self.statistics.n_features() {
            return Err(StatsError::dimension_mismatch(
                format!("{} feature columns", self.statistics.n_features()),
                format!("{}", data.cols()),
            ));
        }
        let mut z = data.as_array().to_owned();
        z -= &self.statistics.means;
        z /= &self.statistics.standard_deviations();
        Matrix::from_array(z).multiply(self.decomposition.eigenvectors())
    }
}

/// Result of [`CorrelationPca::run`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PcaOutcome {
    /// The gate found no significant correlation; the eigensolver was not run.
    Insignificant {
        statistic: f64,
        critical_value: f64,
        statistics: FeatureStatistics,
        correlation: Matrix,
    },
    Decomposed(Box<PcaReport>),
}

impl PcaOutcome {
    pub fn report(&self) -> Option<&PcaReport> {
        match self {
            PcaOutcome::Decomposed(report) => Some(report.as_ref()),
            PcaOutcome::Insignificant { .. } => None,
        }
    }

    pub fn into_report(self) -> Option<PcaReport> {
        match self {
            PcaOutcome::Decomposed(report) => Some(*report),
            PcaOutcome::Insignificant { .. } => None,
        }
    }

    pub fn is_decomposed(&self) -> bool {
        matches!(self, PcaOutcome::Decomposed(_))
    }
}

/// Correlation-matrix PCA pipeline:
/// standardize → correlate → gate → eigendecompose → sort → project.
///
/// # Examples
///
/// ```
/// use jacobi_pca::{CorrelationPca, FeatureTable, Matrix, PcaConfig};
///
/// let data = Matrix::from_rows(&[
///     vec![1.0, 2.1, 0.9],
///     vec![2.0, 3.9, 2.2],
///     vec![3.0, 6.2, 2.8],
///     vec![4.0, 7.8, 4.1],
///     vec![5.0, 10.1, 5.0],
/// ]).unwrap();
/// let table = FeatureTable::from_matrix(data).unwrap();
/// let pca = CorrelationPca::new(PcaConfig::default()).unwrap();
/// let report = pca.run(&table).unwrap().into_report().unwrap();
/// assert_eq!(report.min_components(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct CorrelationPca<B: SymmetricEigenBackend = JacobiEigensolver> {
    config: PcaConfig,
    gate: IndependenceGate,
    backend: B,
}

impl CorrelationPca<JacobiEigensolver> {
    /// Pipeline backed by the threshold Jacobi solver configured from `config.jacobi`.
    ///
    /// # Errors
    /// Returns [`StatsError::InvalidParameter`] for an invalid solver tolerance,
    /// critical value or variance threshold.
    pub fn new(config: PcaConfig) -> Result<Self> {
        let solver = JacobiEigensolver::new(config.jacobi)?;
        Self::with_backend(config, solver)
    }
}

impl<B: SymmetricEigenBackend> CorrelationPca<B> {
    /// Pipeline driven by a custom eigensolver. `config.jacobi` is ignored.
    ///
    /// # Errors
    /// Returns [`StatsError::InvalidParameter`] for an invalid critical value or
    /// variance threshold.
    pub fn with_backend(config: PcaConfig, backend: B) -> Result<Self> {
        let gate = IndependenceGate::new(config.critical_value)?;
        if !(config.variance_threshold > 0.0 && config.variance_threshold <= 1.0) {
            return Err(StatsError::invalid_parameter(
                "variance_threshold",
                format!("must lie in (0, 1], got {}", config.variance_threshold),
            ));
        }
        Ok(Self { config, gate, backend })
    }

    pub fn config(&self) -> &PcaConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Eigenpairs of a correlation (or any symmetric) matrix, sorted descending.
    ///
    /// # Errors
    /// Propagates the backend's errors.
    pub fn decompose_correlation(&self, correlation: &Matrix) -> Result<EigenDecomposition> {
        let unsorted = self.backend.decompose_symmetric(correlation)?;
        Ok(unsorted.sorted_descending())
    }

    /// Runs the full analysis on a feature table.
    ///
    /// # Errors
    /// - [`StatsError::DegenerateFeature`] if a feature has zero variance.
    /// - [`StatsError::Convergence`] (or another backend error) if the decomposition fails.
    /// - [`StatsError::InvalidParameter`] if the eigenvalues carry no positive mass.
    pub fn run(&self, table: &FeatureTable) -> Result<PcaOutcome> {
        let n_samples = table.n_samples();
        info!(
            "Correlation PCA on {} samples x {} features using {}.",
            n_samples,
            table.n_features(),
            self.backend.name()
        );

        let statistics = FeatureStatistics::compute(table.data())?;
        let standardized = standardize(table.data(), &statistics)?;
        let correlation = correlation_matrix(&standardized)?;

        let (gate_statistic, critical_value) = match self.gate.evaluate(&correlation, n_samples)? {
            GateDecision::Insignificant {
                statistic,
                critical_value,
            } => {
                info!(
                    "No significant inter-feature correlation (d = {:.4} <= {:.4}); skipping decomposition.",
                    statistic, critical_value
                );
                return Ok(PcaOutcome::Insignificant {
                    statistic,
                    critical_value,
                    statistics,
                    correlation,
                });
            }
            GateDecision::Significant {
                statistic,
                critical_value,
            } => (statistic, critical_value),
        };

        let unsorted = self.backend.decompose_symmetric(&correlation)?;
        let diagnostics = DecompositionDiagnostics::evaluate(&correlation, &unsorted);
        let decomposition = unsorted.sorted_descending();
        debug!(
            "Eigenvalues (descending): {:?}",
            decomposition.eigenvalues().to_vec()
        );

        let scores = project(&standardized, &decomposition)?;
        let variance = VarianceComparison::compute(&standardized, &scores);
        debug!(
            "Total variance: standardized {:.7}, projected {:.7}.",
            variance.standardized_total, variance.projected_total
        );

        let explained =
            ExplainedVariance::from_sorted_eigenvalues(decomposition.eigenvalues(), self.config.variance_threshold)?;
        info!(
            "{} of {} components explain more than {:.0}% of the variance.",
            explained.min_components,
            decomposition.len(),
            explained.threshold * 100.0
        );

        Ok(PcaOutcome::Decomposed(Box::new(PcaReport {
            feature_names: table.feature_names().to_vec(),
            statistics,
            standardized,
            correlation,
            gate_statistic,
            critical_value,
            decomposition,
            scores,
            variance,
            explained,
            diagnostics,
            backend: self.backend.name().to_string(),
        })))
    }
}
