// Principal component analysis (PCA) on the correlation matrix, with a threshold Jacobi eigensolver

#![doc = include_str!("../README.md")]

pub mod descriptive;
pub mod diagnostics;
pub mod eigenpairs;
pub mod error;
pub mod gate;
pub mod jacobi;
pub mod linalg_backends;
pub mod matrix;
pub mod pca;
pub mod projection;
pub mod standardize;

#[cfg(test)]
mod pca_tests;

pub use descriptive::{DescriptiveSummary, Interval, IntervalSeries};
pub use diagnostics::DecompositionDiagnostics;
pub use eigenpairs::EigenDecomposition;
pub use error::{Result, StatsError};
pub use gate::{GateDecision, IndependenceGate};
pub use jacobi::{JacobiConfig, JacobiEigensolver};
pub use linalg_backends::SymmetricEigenBackend;
pub use matrix::Matrix;
pub use pca::{CorrelationPca, FeatureTable, PcaConfig, PcaOutcome, PcaReport};
pub use projection::{ExplainedVariance, VarianceComparison};
pub use standardize::FeatureStatistics;
