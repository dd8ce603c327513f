use crate::eigenpairs::EigenDecomposition;
use crate::error::{Result, StatsError};
use crate::jacobi::{JacobiConfig, JacobiEigensolver};
use crate::linalg_backends::SymmetricEigenBackend;
use crate::matrix::Matrix;
use crate::pca::{CorrelationPca, FeatureTable, PcaConfig, PcaOutcome};
use crate::projection::column_variances;

use approx::assert_abs_diff_eq;
use ndarray::Array2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use std::error::Error;
use std::sync::atomic::{AtomicUsize, Ordering};

/// `n_samples` observations of features driven by one latent factor; `loadings[j]`
/// controls how strongly feature j follows the factor.
fn generate_factor_data(n_samples: usize, loadings: &[f64], seed: u64) -> Matrix {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let normal = Normal::new(0.0, 1.0).unwrap();
    let n_features = loadings.len();
    let mut data = Array2::<f64>::zeros((n_samples, n_features));
    for i in 0..n_samples {
        let factor = normal.sample(&mut rng);
        for (j, &loading) in loadings.iter().enumerate() {
            data[[i, j]] = 10.0 * (j as f64 + 1.0) + loading * factor + normal.sample(&mut rng);
        }
    }
    Matrix::from_array(data)
}

fn precise_config() -> PcaConfig {
    PcaConfig {
        jacobi: JacobiConfig::with_tolerance(1e-12),
        ..Default::default()
    }
}

/// Wraps a backend and counts how often the pipeline asks it for a decomposition.
struct CountingBackend {
    inner: JacobiEigensolver,
    calls: AtomicUsize,
}

impl CountingBackend {
    fn new() -> Self {
        Self {
            inner: JacobiEigensolver::default(),
            calls: AtomicUsize::new(0),
        }
    }
}

impl SymmetricEigenBackend for CountingBackend {
    fn decompose_symmetric(&self, matrix: &Matrix) -> Result<EigenDecomposition> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.decompose(matrix)
    }

    fn name(&self) -> &'static str {
        "counting"
    }
}

#[test]
fn test_pipeline_on_correlated_features() -> std::result::Result<(), Box<dyn Error>> {
    let data = generate_factor_data(200, &[3.0, 2.5, 2.0, 0.5, 1.5], 2025);
    let table = FeatureTable::from_matrix(data)?;
    let pca = CorrelationPca::new(precise_config())?;
    let report = pca.run(&table)?.into_report().ok_or("expected a decomposition")?;

    let p = 5;
    assert_eq!(report.decomposition.len(), p);
    assert_eq!(report.scores.dim(), (200, p));
    assert!(report.decomposition.is_sorted_descending());
    assert!(report.gate_statistic > report.critical_value);
    assert_eq!(report.backend, "threshold-jacobi");

    // Eigenvalues of a correlation matrix sum to p.
    assert_abs_diff_eq!(report.eigenvalues().sum(), p as f64, epsilon = 1e-9);
    // One latent factor dominates.
    assert!(report.eigenvalues()[0] > 1.0);

    // Total variance survives the change of basis.
    assert_abs_diff_eq!(report.variance.standardized_total, p as f64, epsilon = 1e-9);
    assert!(report.variance.is_conserved(1e-9));

    // Score column variances are the eigenvalues.
    let score_variances = column_variances(&report.scores);
    for (k, &lambda) in report.eigenvalues().iter().enumerate() {
        assert_abs_diff_eq!(score_variances[k], lambda, epsilon = 1e-8);
    }

    // The explained-variance curve is non-decreasing and ends at 1.
    let ratios = &report.explained.ratios;
    for k in 1..ratios.len() {
        assert!(ratios[k] >= ratios[k - 1] - 1e-15);
    }
    assert_abs_diff_eq!(ratios[p - 1], 1.0, epsilon = 1e-12);
    let m = report.min_components();
    assert!(ratios[m - 1] > 0.95);
    if m > 1 {
        assert!(ratios[m - 2] <= 0.95);
    }

    let diag = &report.diagnostics;
    assert!(diag.orthogonality_error.unwrap() < 1e-10);
    assert!(diag.reconstruction_error_max.unwrap() < 1e-9);
    Ok(())
}

#[test]
fn test_default_tolerance_still_conserves_trace() -> std::result::Result<(), Box<dyn Error>> {
    let data = generate_factor_data(60, &[2.0, 2.0, 1.0, 0.0], 7);
    let table = FeatureTable::from_matrix(data)?;
    let report = CorrelationPca::new(PcaConfig::default())?
        .run(&table)?
        .into_report()
        .ok_or("expected a decomposition")?;
    assert_abs_diff_eq!(report.eigenvalues().sum(), 4.0, epsilon = 1e-9);
    assert!(report.diagnostics.orthogonality_error.unwrap() < 1e-9);
    Ok(())
}

#[test]
fn test_gate_skips_decomposition_for_uncorrelated_features() -> std::result::Result<(), Box<dyn Error>> {
    // Columns are exactly orthogonal after centering, so every correlation is 0.
    let data = Matrix::from_rows(&[
        vec![1.0, 1.0, 1.0],
        vec![-1.0, 1.0, -1.0],
        vec![1.0, -1.0, -1.0],
        vec![-1.0, -1.0, 1.0],
    ])?;
    let table = FeatureTable::from_matrix(data)?;
    let backend = CountingBackend::new();
    let pca = CorrelationPca::with_backend(PcaConfig::default(), &backend)?;

    match pca.run(&table)? {
        PcaOutcome::Insignificant {
            statistic,
            critical_value,
            correlation,
            ..
        } => {
            assert_abs_diff_eq!(statistic, 0.0, epsilon = 1e-12);
            assert_eq!(critical_value, 2.009);
            assert_eq!(correlation.dim(), (3, 3));
        }
        PcaOutcome::Decomposed(_) => panic!("uncorrelated features must not be decomposed"),
    }
    assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    Ok(())
}

#[test]
fn test_gate_passes_through_to_backend() -> std::result::Result<(), Box<dyn Error>> {
    let data = generate_factor_data(50, &[2.0, 2.0, 2.0], 11);
    let table = FeatureTable::from_matrix(data)?;
    let backend = CountingBackend::new();
    let pca = CorrelationPca::with_backend(PcaConfig::default(), &backend)?;
    let outcome = pca.run(&table)?;
    assert!(outcome.is_decomposed());
    assert_eq!(outcome.report().map(|r| r.backend.as_str()), Some("counting"));
    assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    Ok(())
}

#[test]
fn test_zero_variance_feature_is_reported() {
    let data = Matrix::from_rows(&[
        vec![1.0, 5.0, 2.0],
        vec![2.0, 5.0, 1.0],
        vec![3.0, 5.0, 4.0],
    ])
    .unwrap();
    let table = FeatureTable::from_matrix(data).unwrap();
    let pca = CorrelationPca::new(PcaConfig::default()).unwrap();
    assert_eq!(
        pca.run(&table).unwrap_err(),
        StatsError::DegenerateFeature { column: 1 }
    );
}

#[test]
fn test_reference_correlation_matrix() -> std::result::Result<(), Box<dyn Error>> {
    let correlation = Matrix::from_rows(&[
        vec![1.00, 0.42, 0.54, 0.66],
        vec![0.42, 1.00, 0.32, 0.44],
        vec![0.54, 0.32, 1.00, 0.22],
        vec![0.66, 0.44, 0.22, 1.00],
    ])?;
    let pca = CorrelationPca::new(PcaConfig::default())?;
    let eig = pca.decompose_correlation(&correlation)?;
    assert_abs_diff_eq!(eig.eigenvalues().sum(), 4.0, epsilon = 1e-9);
    assert!(eig.eigenvalues()[0] > 1.0);
    assert!(eig.is_sorted_descending());
    Ok(())
}

#[test]
fn test_transform_reproduces_training_scores() -> std::result::Result<(), Box<dyn Error>> {
    let data = generate_factor_data(40, &[1.5, 1.0, 2.0], 3);
    let table = FeatureTable::from_matrix(data.clone())?;
    let report = CorrelationPca::new(precise_config())?
        .run(&table)?
        .into_report()
        .ok_or("expected a decomposition")?;
    let rescored = report.transform(&data)?;
    assert!(rescored.max_abs_diff(&report.scores)? < 1e-10);
    assert!(matches!(
        report.transform(&Matrix::zeros(2, 2)),
        Err(StatsError::DimensionMismatch { .. })
    ));
    Ok(())
}

#[test]
fn test_loadings_carry_feature_names() -> std::result::Result<(), Box<dyn Error>> {
    let data = generate_factor_data(30, &[2.0, 1.0], 5);
    let table = FeatureTable::new(vec!["height".to_string(), "weight".to_string()], data)?;
    let report = CorrelationPca::new(precise_config())?
        .run(&table)?
        .into_report()
        .ok_or("expected a decomposition")?;
    let loadings = report.loadings(0)?;
    assert_eq!(loadings.len(), 2);
    assert_eq!(loadings[0].0, "height");
    assert_eq!(loadings[1].0, "weight");
    let norm: f64 = loadings.iter().map(|(_, v)| v * v).sum();
    assert_abs_diff_eq!(norm, 1.0, epsilon = 1e-10);
    assert!(matches!(report.loadings(2), Err(StatsError::Index { .. })));
    Ok(())
}

#[test]
fn test_feature_table_validation() {
    assert!(matches!(
        FeatureTable::from_matrix(Matrix::zeros(1, 3)),
        Err(StatsError::Shape(_))
    ));
    assert!(matches!(
        FeatureTable::new(vec!["a".to_string()], Matrix::zeros(3, 2)),
        Err(StatsError::DimensionMismatch { .. })
    ));
    let table = FeatureTable::from_matrix(Matrix::zeros(3, 2)).unwrap();
    assert_eq!(table.feature_names(), &["x1".to_string(), "x2".to_string()]);
}

#[test]
fn test_invalid_pipeline_configuration() {
    let bad_threshold = PcaConfig {
        variance_threshold: 0.0,
        ..Default::default()
    };
    assert!(CorrelationPca::new(bad_threshold).is_err());
    let bad_critical = PcaConfig {
        critical_value: -1.0,
        ..Default::default()
    };
    assert!(CorrelationPca::new(bad_critical).is_err());
    let bad_tolerance = PcaConfig {
        jacobi: JacobiConfig::with_tolerance(-1e-3),
        ..Default::default()
    };
    assert!(CorrelationPca::new(bad_tolerance).is_err());
}

#[test]
fn test_report_serializes_for_presentation() -> std::result::Result<(), Box<dyn Error>> {
    let data = generate_factor_data(25, &[2.0, 2.0], 9);
    let table = FeatureTable::from_matrix(data)?;
    let outcome = CorrelationPca::new(PcaConfig::default())?.run(&table)?;
    let json = serde_json::to_string(&outcome)?;
    assert!(json.contains("Decomposed"));
    assert!(json.contains("eigenvalues"));
    Ok(())
}
