// src/gate.rs

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StatsError};
use crate::matrix::Matrix;

/// Default critical value `d_max` of the independence gate. Callers analysing a
/// different number of features should supply their own table value.
pub const DEFAULT_CRITICAL_VALUE: f64 = 2.009;

/// Outcome of the independence check on a correlation matrix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GateDecision {
    /// Off-diagonal correlation energy exceeds the critical value; decomposing is worthwhile.
    Significant { statistic: f64, critical_value: f64 },
    /// Features look mutually uncorrelated; further decomposition is not warranted.
    Insignificant { statistic: f64, critical_value: f64 },
}

impl GateDecision {
    pub fn statistic(&self) -> f64 {
        match *self {
            GateDecision::Significant { statistic, .. } | GateDecision::Insignificant { statistic, .. } => statistic,
        }
    }

    pub fn is_significant(&self) -> bool {
        matches!(self, GateDecision::Significant { .. })
    }
}

/// Tests whether the correlations between features are large enough to justify PCA.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndependenceGate {
    critical_value: f64,
}

impl Default for IndependenceGate {
    fn default() -> Self {
        Self {
            critical_value: DEFAULT_CRITICAL_VALUE,
        }
    }
}

impl IndependenceGate {
    /// # Errors
    /// Returns [`StatsError::InvalidParameter`] if `critical_value` is negative or not finite.
    pub fn new(critical_value: f64) -> Result<Self> {
        if !critical_value.is_finite() || critical_value < 0.0 {
            return Err(StatsError::invalid_parameter(
                "critical_value",
                format!("must be finite and non-negative, got {}", critical_value),
            ));
        }
        Ok(Self { critical_value })
    }

    pub fn critical_value(&self) -> f64 {
        self.critical_value
    }

    /// `d = N * sum_{i != j} C[i][j]^2`
    ///
    /// # Errors
    /// Returns [`StatsError::DimensionMismatch`] if `correlation` is not square.
    pub fn statistic(correlation: &Matrix, n_samples: usize) -> Result<f64> {
        if !correlation.is_square() {
            return Err(StatsError::dimension_mismatch(
                "square correlation matrix",
                format!("{}x{}", correlation.rows(), correlation.cols()),
            ));
        }
        let c = correlation.as_array();
        let off_diagonal_energy: f64 = c
            .indexed_iter()
            .filter(|((i, j), _)| i != j)
            .map(|(_, &value)| value * value)
            .sum();
        Ok(n_samples as f64 * off_diagonal_energy)
    }

    /// Compares the statistic with the critical value; `d <= d_max` is insignificant.
    ///
    /// # Errors
    /// Propagates the shape check of [`IndependenceGate::statistic`].
    pub fn evaluate(&self, correlation: &Matrix, n_samples: usize) -> Result<GateDecision> {
        let statistic = Self::statistic(correlation, n_samples)?;
        let critical_value = self.critical_value;
        debug!(
            "Independence statistic d = {:.6} (critical value {:.6}).",
            statistic, critical_value
        );
        if statistic <= critical_value {
            Ok(GateDecision::Insignificant {
                statistic,
                critical_value,
            })
        } else {
            Ok(GateDecision::Significant {
                statistic,
                critical_value,
            })
        }
    }
}
