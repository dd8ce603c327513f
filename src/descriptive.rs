// src/descriptive.rs

//! Interval series (histogram) and grouped descriptive statistics for a
//! single sample.

use log::debug;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StatsError};

/// Student t value for a 95% interval on ~50 observations.
pub const DEFAULT_T_VALUE: f64 = 1.67;

/// One class of an interval series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub lower: f64,
    pub upper: f64,
}

impl Interval {
    pub fn midpoint(&self) -> f64 {
        (self.lower + self.upper) / 2.0
    }

    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

/// Sample grouped into equal-width classes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalSeries {
    /// Sample size n.
    pub n: usize,
    /// Unrounded Sturges estimate `1 + 3.322 * log10(n)`.
    pub sturges_k: f64,
    /// Class width after rounding.
    pub width: f64,
    pub intervals: Vec<Interval>,
    /// Absolute frequencies n_i.
    pub frequencies: Vec<usize>,
    /// m_i = n_i / n
    pub relative_frequencies: Array1<f64>,
    /// Running sum of n_i.
    pub cumulative_frequencies: Array1<f64>,
    /// Empirical distribution function at the upper bounds, F(c_i).
    pub distribution: Array1<f64>,
    /// Density estimate at the midpoints, f(l_i) = m_i / width.
    pub density: Array1<f64>,
}

impl IntervalSeries {
    /// Groups `data` with Sturges' rule.
    ///
    /// The classes start at `floor(min)`; their width is
    /// `round((ceil(max) - floor(min)) / k)` (at least 1). There are `ceil(k)`
    /// classes, plus as many more as needed to reach `ceil(max)`. Each class is
    /// half-open `[lower, upper)` except the last, which also holds its upper
    /// bound, so every observation is counted exactly once.
    ///
    /// # Errors
    /// - [`StatsError::Shape`] if `data` is empty.
    /// - [`StatsError::InvalidParameter`] if `data` contains NaN or infinite values.
    pub fn sturges(data: &[f64]) -> Result<Self> {
        check_sample(data)?;
        let n = data.len();
        let (min, max) = min_max(data);

        let sturges_k = 1.0 + 3.322 * (n as f64).log10();
        let lower = min.floor();
        let upper = max.ceil();
        let width = ((upper - lower) / sturges_k).round().max(1.0);
        let needed = ((upper - lower) / width).ceil() as usize;
        let count = (sturges_k.ceil() as usize).max(needed).max(1);

        let intervals: Vec<Interval> = (0..count)
            .map(|i| Interval {
                lower: lower + i as f64 * width,
                upper: lower + (i + 1) as f64 * width,
            })
            .collect();

        let mut frequencies = vec![0usize; count];
        for &value in data {
            let slot = (((value - lower) / width).floor() as usize).min(count - 1);
            frequencies[slot] += 1;
        }

        let n_f = n as f64;
        let relative_frequencies = Array1::from_iter(frequencies.iter().map(|&f| f as f64 / n_f));
        let cumulative_frequencies = running_sum(frequencies.iter().map(|&f| f as f64));
        let distribution = running_sum(relative_frequencies.iter().copied());
        let density = relative_frequencies.mapv(|m| m / width);

        debug!(
            "Interval series: n = {}, k = {:.3}, {} classes of width {}.",
            n, sturges_k, count, width
        );

        Ok(Self {
            n,
            sturges_k,
            width,
            intervals,
            frequencies,
            relative_frequencies,
            cumulative_frequencies,
            distribution,
            density,
        })
    }

    pub fn midpoints(&self) -> Array1<f64> {
        Array1::from_iter(self.intervals.iter().map(Interval::midpoint))
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }
}

/// Point and interval estimates computed from an interval series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DescriptiveSummary {
    /// Grouped mean `sum l_i * m_i`.
    pub mean: f64,
    /// Grouped population variance `(1/n) sum (l_i - mean)^2 * n_i`.
    pub variance: f64,
    pub std_dev: f64,
    /// Half-width of the confidence interval, `t * sigma / sqrt(n - 1)`.
    pub margin_of_error: f64,
    pub confidence_interval: (f64, f64),
    /// `margin_of_error / mean`
    pub relative_accuracy: f64,
    /// `max - min` of the raw sample.
    pub range: f64,
    /// `std_dev / mean`
    pub coefficient_of_variation: f64,
}

impl DescriptiveSummary {
    /// # Errors
    /// - [`StatsError::Shape`] if the sample has fewer than 2 observations.
    /// - [`StatsError::DimensionMismatch`] if `series` was built from a sample of another size.
    /// - [`StatsError::InvalidParameter`] for a non-finite or non-positive `t_value`,
    ///   or a zero grouped mean (the relative measures divide by it).
    pub fn compute(data: &[f64], series: &IntervalSeries, t_value: f64) -> Result<Self> {
        check_sample(data)?;
        if data.len() < 2 {
            return Err(StatsError::Shape(
                "a confidence interval needs at least 2 observations".to_string(),
            ));
        }
        if series.n != data.len() {
            return Err(StatsError::dimension_mismatch(
                format!("interval series over {} observations", data.len()),
                format!("{}", series.n),
            ));
        }
        if !t_value.is_finite() || t_value <= 0.0 {
            return Err(StatsError::invalid_parameter(
                "t_value",
                format!("must be finite and positive, got {}", t_value),
            ));
        }

        let midpoints = series.midpoints();
        let mean = midpoints.dot(&series.relative_frequencies);
        let variance = midpoints
            .iter()
            .zip(&series.frequencies)
            .map(|(&l, &f)| (l - mean) * (l - mean) * f as f64)
            .sum::<f64>()
            / series.n as f64;
        let std_dev = variance.sqrt();

        let margin_of_error = t_value * std_dev / ((series.n - 1) as f64).sqrt();
        if mean == 0.0 {
            return Err(StatsError::invalid_parameter(
                "mean",
                "grouped mean is zero; relative accuracy and coefficient of variation are undefined",
            ));
        }

        let (min, max) = min_max(data);
        Ok(Self {
            mean,
            variance,
            std_dev,
            margin_of_error,
            confidence_interval: (mean - margin_of_error, mean + margin_of_error),
            relative_accuracy: margin_of_error / mean,
            range: max - min,
            coefficient_of_variation: std_dev / mean,
        })
    }
}

fn check_sample(data: &[f64]) -> Result<()> {
    if data.is_empty() {
        return Err(StatsError::Shape("sample is empty".to_string()));
    }
    if data.iter().any(|v| !v.is_finite()) {
        return Err(StatsError::invalid_parameter(
            "data",
            "sample contains NaN or infinite values",
        ));
    }
    Ok(())
}

fn min_max(data: &[f64]) -> (f64, f64) {
    data.iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
}

fn running_sum(values: impl Iterator<Item = f64>) -> Array1<f64> {
    Array1::from_iter(values.scan(0.0, |acc, v| {
        *acc += v;
        Some(*acc)
    }))
}
