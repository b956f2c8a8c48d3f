//! Distribution comparison configuration.
//!
//! This module provides configuration for the distribution comparator,
//! including binning resolution, the per-column distance measure and the
//! weighting of sub-metrics in the aggregate quality score.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::score::MetricWeights;
use crate::VitalCertError;
use crate::stats::binning::MAX_BIN_COUNT;

/// Upper bound on `quantile_points`
pub const MAX_QUANTILE_POINTS: usize = 10_001;

/// Per-column distance measure between real and synthetic distributions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// Two-sample Kolmogorov-Smirnov statistic, in [0, 1]
    #[default]
    #[serde(alias = "ks")]
    KolmogorovSmirnov,
    /// 1-Wasserstein distance normalized by the real column's range
    Wasserstein,
}

impl DistanceMetric {
    /// Stable short name used in reports and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            DistanceMetric::KolmogorovSmirnov => "ks",
            DistanceMetric::Wasserstein => "wasserstein",
        }
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DistanceMetric {
    type Err = ConfigValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ks" | "kolmogorov_smirnov" | "kolmogorov-smirnov" => {
                Ok(DistanceMetric::KolmogorovSmirnov)
            }
            "wasserstein" | "emd" => Ok(DistanceMetric::Wasserstein),
            other => Err(ConfigValidationError::UnknownDistanceMetric(other.to_string())),
        }
    }
}

/// Validation errors for quality configuration.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigValidationError {
    #[error("bin_count must be within [1, 10000], got {0}")]
    InvalidBinCount(usize),
    #[error("quantile_points must be within [2, 10001], got {0}")]
    InvalidQuantilePoints(usize),
    #[error("max_concurrency must be at least 1, got {0}")]
    InvalidConcurrency(usize),
    #[error("unknown distance metric '{0}' (expected ks or wasserstein)")]
    UnknownDistanceMetric(String),
    #[error(
        "unknown quality metric weight key '{0}' (expected distance, correlation, reconstruction or imputation)"
    )]
    UnknownMetric(String),
    #[error("weight for '{metric}' must be finite and non-negative, got {weight}")]
    InvalidWeight { metric: String, weight: f64 },
    #[error("at least one quality metric weight must be positive")]
    ZeroWeights,
    #[error("columns list must not be empty when provided")]
    EmptyColumns,
}

impl From<ConfigValidationError> for VitalCertError {
    fn from(error: ConfigValidationError) -> Self {
        VitalCertError::configuration(error.to_string())
    }
}

/// Distribution comparison configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    /// Number of shared histogram bins per column profile
    pub bin_count: usize,
    /// Per-column distance measure
    pub distance_metric: DistanceMetric,
    /// Sub-metric weights keyed by metric name; `None` means equal weighting
    pub weights: Option<BTreeMap<String, f64>>,
    /// Number of evenly spaced quantiles used for reconstruction error
    pub quantile_points: usize,
    /// Restrict the comparison to these columns
    pub columns: Option<Vec<String>>,
    /// Upper bound on columns analysed in parallel
    pub max_concurrency: usize,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            bin_count: 20,
            distance_metric: DistanceMetric::KolmogorovSmirnov,
            weights: None,
            quantile_points: 101,
            columns: None,
            max_concurrency: 4,
        }
    }
}

impl QualityConfig {
    /// Creates a new quality config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the histogram bin count.
    pub fn with_bin_count(mut self, bin_count: usize) -> Self {
        self.bin_count = bin_count;
        self
    }

    /// Builder method to set the distance metric.
    pub fn with_distance_metric(mut self, metric: DistanceMetric) -> Self {
        self.distance_metric = metric;
        self
    }

    /// Builder method to set a single sub-metric weight.
    pub fn with_weight(mut self, metric: impl Into<String>, weight: f64) -> Self {
        self.weights
            .get_or_insert_with(BTreeMap::new)
            .insert(metric.into(), weight);
        self
    }

    /// Builder method to set the quantile resolution.
    pub fn with_quantile_points(mut self, points: usize) -> Self {
        self.quantile_points = points;
        self
    }

    /// Builder method to restrict the analysed columns.
    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Builder method to set the parallelism bound.
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        if max_concurrency == 0 {
            tracing::warn!("max_concurrency 0 raised to 1");
        }
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Resolves the configured weights into typed metric weights.
    pub fn metric_weights(&self) -> Result<MetricWeights, ConfigValidationError> {
        match &self.weights {
            None => Ok(MetricWeights::equal()),
            Some(map) => MetricWeights::from_map(map),
        }
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.bin_count == 0 || self.bin_count > MAX_BIN_COUNT {
            return Err(ConfigValidationError::InvalidBinCount(self.bin_count));
        }
        if !(2..=MAX_QUANTILE_POINTS).contains(&self.quantile_points) {
            return Err(ConfigValidationError::InvalidQuantilePoints(
                self.quantile_points,
            ));
        }
        if self.max_concurrency == 0 {
            return Err(ConfigValidationError::InvalidConcurrency(
                self.max_concurrency,
            ));
        }
        if self.columns.as_ref().is_some_and(Vec::is_empty) {
            return Err(ConfigValidationError::EmptyColumns);
        }
        self.metric_weights()?;
        Ok(())
    }
}
