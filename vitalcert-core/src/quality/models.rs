//! Distribution comparison result models.
//!
//! Reports carry aggregate statistics (means, quantiles, bin densities)
//! and never whole records or subject identifiers. Quartiles and whiskers
//! are order statistics of the data; real-side box plots are trimmed to
//! their whiskers so isolated extreme values are not reported, and the
//! shared bin edges span the pooled range of both datasets.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::config::DistanceMetric;
use super::correlation::CorrelationPair;
use super::diff::diff_percent;
use super::score::{MetricWeights, SubMetrics};
use crate::stats::descriptive::{mean, std_dev};
use crate::stats::{BinSet, BoxPlotStats, SummaryStats};

/// Mean comparison for one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnComparison {
    /// Column name
    pub column: String,
    /// Number of usable real values
    pub real_count: usize,
    /// Number of usable synthetic values
    pub synthetic_count: usize,
    pub real_mean: f64,
    pub synthetic_mean: f64,
    pub real_std: f64,
    pub synthetic_std: f64,
    /// Percentage difference of the synthetic mean; may be infinite
    #[serde(with = "non_finite_f64")]
    pub diff_percent: f64,
}

impl ColumnComparison {
    /// Compares the finite values of one column.
    pub fn new(column: impl Into<String>, real: &[f64], synthetic: &[f64]) -> Self {
        let real_mean = mean(real);
        let synthetic_mean = mean(synthetic);
        Self {
            column: column.into(),
            real_count: real.len(),
            synthetic_count: synthetic.len(),
            real_mean,
            synthetic_mean,
            real_std: std_dev(real),
            synthetic_std: std_dev(synthetic),
            diff_percent: diff_percent(synthetic_mean, real_mean),
        }
    }
}

/// Chart-ready profile of one column: shared bins, densities and box plots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub column: String,
    /// Edges shared by both densities
    pub bins: BinSet,
    pub real_density: Vec<f64>,
    pub synthetic_density: Vec<f64>,
    /// Trimmed to the whiskers; see [`BoxPlotStats::trimmed_to_whiskers`]
    pub real_box_plot: BoxPlotStats,
    /// Real values beyond the whiskers, counted but not reported
    pub real_outlier_count: usize,
    pub synthetic_box_plot: BoxPlotStats,
}

/// Coarse quality grade derived from the aggregate score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityGrade {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl QualityGrade {
    /// Grades a score in `[0, 1]`.
    pub fn from_score(score: f64) -> Self {
        if score >= 0.9 {
            QualityGrade::Excellent
        } else if score >= 0.8 {
            QualityGrade::Good
        } else if score >= 0.6 {
            QualityGrade::Fair
        } else {
            QualityGrade::Poor
        }
    }

    /// Lowercase label.
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityGrade::Excellent => "excellent",
            QualityGrade::Good => "good",
            QualityGrade::Fair => "fair",
            QualityGrade::Poor => "poor",
        }
    }
}

/// Complete distribution comparison result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityReport {
    /// Number of real records
    pub real_records: usize,
    /// Number of synthetic records
    pub synthetic_records: usize,
    /// Columns analysed, sorted
    pub columns: Vec<String>,
    /// Distance measure used for `distances`
    pub distance_metric: DistanceMetric,
    /// Per-column distance
    pub distances: BTreeMap<String, f64>,
    /// Summary of the per-column distances
    pub distance_summary: SummaryStats,
    /// Correlation preservation in `[0, 1]`
    pub correlation_preservation: f64,
    /// Per-pair correlation changes
    pub correlation_pairs: Vec<CorrelationPair>,
    /// Per-column reconstruction error
    pub reconstruction_errors: BTreeMap<String, f64>,
    /// Imputation utility in `[0, 1]`
    pub imputation_utility: f64,
    /// Weights used for the aggregate score
    pub weights: MetricWeights,
    /// Aggregate score in `[0, 1]`
    pub quality_score: f64,
    /// Grade for the aggregate score
    pub grade: QualityGrade,
    /// Per-column mean comparisons
    pub comparisons: BTreeMap<String, ColumnComparison>,
    /// Per-column chart profiles
    pub profiles: BTreeMap<String, ColumnProfile>,
    /// Human-readable summary
    pub summary: String,
    /// When the comparison ran
    pub analyzed_at: DateTime<Utc>,
}

impl QualityReport {
    /// Sub-metrics the aggregate score was computed from.
    pub fn sub_metrics(&self) -> SubMetrics {
        SubMetrics {
            distances: self.distances.clone(),
            correlation_preservation: self.correlation_preservation,
            reconstruction_errors: self.reconstruction_errors.clone(),
            imputation_utility: self.imputation_utility,
        }
    }

    /// Columns whose mean drifted by more than `threshold_percent`.
    pub fn drifted_columns(&self, threshold_percent: f64) -> Vec<&str> {
        self.comparisons
            .values()
            .filter(|c| c.diff_percent.abs() > threshold_percent)
            .map(|c| c.column.as_str())
            .collect()
    }
}

/// Builds the one-line report summary.
pub(crate) fn summarize(
    score: f64,
    grade: QualityGrade,
    columns: usize,
    metric: DistanceMetric,
    mean_distance: f64,
) -> String {
    format!(
        "Quality score {:.1}% ({}) across {} column(s); mean {} distance {:.3}",
        score * 100.0,
        grade.as_str(),
        columns,
        metric,
        mean_distance
    )
}

/// Serializes non-finite floats as strings so reports stay valid JSON.
mod non_finite_f64 {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else if value.is_nan() {
            serializer.serialize_str("NaN")
        } else if value.is_sign_positive() {
            serializer.serialize_str("Infinity")
        } else {
            serializer.serialize_str("-Infinity")
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Text(String),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Repr::deserialize(deserializer)? {
            Repr::Number(value) => Ok(value),
            Repr::Text(text) => match text.as_str() {
                "Infinity" => Ok(f64::INFINITY),
                "-Infinity" => Ok(f64::NEG_INFINITY),
                "NaN" => Ok(f64::NAN),
                other => Err(serde::de::Error::custom(format!(
                    "expected a number or Infinity, got '{}'",
                    other
                ))),
            },
        }
    }
}
