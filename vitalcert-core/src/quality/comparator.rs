//! Distribution comparator facade.
//!
//! This module provides the `DistributionComparator` that runs every
//! per-column metric over a real/synthetic dataset pair and assembles
//! the `QualityReport`.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;
use futures::stream::{self, StreamExt};

use super::config::{DistanceMetric, QualityConfig};
use super::correlation::compare_correlations;
use super::distance::column_distance;
use super::models::{ColumnComparison, ColumnProfile, QualityGrade, QualityReport, summarize};
use super::score::{MetricWeights, SubMetrics, aggregate_quality_score};
use super::utility::{column_imputation_utility, imputation_utility, reconstruction_error};
use crate::models::{RecordSet, SUBJECT_ID_COLUMN};
use crate::stats::{SummaryStats, calculate_box_plot_stats, hist_density, make_bins};
use crate::{Result, VitalCertError};

/// Per-column parameters copied into worker tasks.
#[derive(Debug, Clone, Copy)]
struct ColumnSettings {
    bin_count: usize,
    distance_metric: DistanceMetric,
    quantile_points: usize,
}

/// Everything computed for a single column.
#[derive(Debug, Clone)]
struct ColumnAnalysis {
    column: String,
    distance: f64,
    reconstruction_error: f64,
    imputation_utility: f64,
    comparison: ColumnComparison,
    profile: ColumnProfile,
}

fn analyze_column(
    column: &str,
    real: &[f64],
    synthetic: &[f64],
    settings: ColumnSettings,
) -> Result<ColumnAnalysis> {
    let bins = make_bins(&[real, synthetic], settings.bin_count)?;
    let (real_box_plot, real_outlier_count) =
        calculate_box_plot_stats(real).trimmed_to_whiskers();
    let profile = ColumnProfile {
        column: column.to_string(),
        real_density: hist_density(real, &bins.edges),
        synthetic_density: hist_density(synthetic, &bins.edges),
        real_box_plot,
        real_outlier_count,
        synthetic_box_plot: calculate_box_plot_stats(synthetic),
        bins,
    };

    let analysis = ColumnAnalysis {
        column: column.to_string(),
        distance: column_distance(settings.distance_metric, real, synthetic),
        reconstruction_error: reconstruction_error(real, synthetic, settings.quantile_points),
        imputation_utility: column_imputation_utility(real, synthetic),
        comparison: ColumnComparison::new(column, real, synthetic),
        profile,
    };

    tracing::debug!(
        column = %analysis.column,
        real_values = real.len(),
        synthetic_values = synthetic.len(),
        distance = analysis.distance,
        reconstruction_error = analysis.reconstruction_error,
        "Column comparison completed"
    );

    Ok(analysis)
}

/// Compares real and synthetic clinical datasets column by column.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use vitalcert_core::models::RecordSet;
/// use vitalcert_core::quality::DistributionComparator;
///
/// let real = RecordSet::new("real", vec![
///     json!({"heart_rate": 60, "systolic_bp": 118}),
///     json!({"heart_rate": 72, "systolic_bp": 126}),
///     json!({"heart_rate": 80, "systolic_bp": 131}),
/// ]);
/// let comparator = DistributionComparator::with_defaults();
/// let report = comparator.compare(&real, &real).unwrap();
///
/// assert_eq!(report.columns, vec!["heart_rate", "systolic_bp"]);
/// assert!((report.quality_score - 1.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct DistributionComparator {
    config: QualityConfig,
    weights: MetricWeights,
}

impl DistributionComparator {
    /// Creates a comparator after validating the configuration.
    ///
    /// # Errors
    /// Returns a configuration error for invalid bin counts, quantile
    /// resolution, concurrency or metric weights.
    pub fn new(config: QualityConfig) -> Result<Self> {
        config.validate()?;
        let weights = config.metric_weights()?;
        Ok(Self { config, weights })
    }

    /// Creates a comparator with default configuration.
    pub fn with_defaults() -> Self {
        Self {
            config: QualityConfig::default(),
            weights: MetricWeights::equal(),
        }
    }

    /// Returns a reference to the comparator configuration.
    pub fn config(&self) -> &QualityConfig {
        &self.config
    }

    /// Returns the resolved metric weights.
    pub fn weights(&self) -> &MetricWeights {
        &self.weights
    }

    fn settings(&self) -> ColumnSettings {
        ColumnSettings {
            bin_count: self.config.bin_count,
            distance_metric: self.config.distance_metric,
            quantile_points: self.config.quantile_points,
        }
    }

    /// Resolves the sorted list of columns to analyse.
    ///
    /// Without a configured list, every column numeric in both datasets is
    /// used. A configured column missing from either dataset, or naming
    /// the subject identifier, is a configuration error; configured
    /// columns that are not numeric are skipped with a warning.
    ///
    /// # Errors
    /// Returns an invalid-input error when no column can be compared.
    pub fn resolve_columns(&self, real: &RecordSet, synthetic: &RecordSet) -> Result<Vec<String>> {
        let real_numeric: BTreeSet<String> = real.numeric_column_names().into_iter().collect();
        let synthetic_numeric: BTreeSet<String> =
            synthetic.numeric_column_names().into_iter().collect();
        let shared: BTreeSet<String> = real_numeric
            .intersection(&synthetic_numeric)
            .cloned()
            .collect();

        let columns: BTreeSet<String> = match &self.config.columns {
            None => shared,
            Some(requested) => {
                let mut selected = BTreeSet::new();
                for column in requested {
                    if column == SUBJECT_ID_COLUMN {
                        return Err(VitalCertError::configuration(format!(
                            "column '{}' is an identifier and cannot be compared",
                            column
                        )));
                    }
                    if !real.has_column(column) || !synthetic.has_column(column) {
                        return Err(VitalCertError::configuration(format!(
                            "unknown column '{}': not present in both datasets",
                            column
                        )));
                    }
                    if shared.contains(column) {
                        selected.insert(column.clone());
                    } else {
                        tracing::warn!("Skipping non-numeric column '{}'", column);
                    }
                }
                selected
            }
        };

        if columns.is_empty() {
            return Err(VitalCertError::invalid_input(format!(
                "no numeric columns shared by datasets '{}' and '{}'",
                real.name, synthetic.name
            )));
        }
        Ok(columns.into_iter().collect())
    }

    /// Compares the datasets sequentially.
    ///
    /// # Errors
    /// Returns an error if the columns cannot be resolved.
    pub fn compare(&self, real: &RecordSet, synthetic: &RecordSet) -> Result<QualityReport> {
        let columns = self.resolve_columns(real, synthetic)?;
        let settings = self.settings();

        let analyses = columns
            .iter()
            .map(|column| {
                analyze_column(
                    column,
                    &real.numeric_column(column),
                    &synthetic.numeric_column(column),
                    settings,
                )
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(self.build_report(real, synthetic, columns, analyses))
    }

    /// Compares the datasets with columns analysed on the blocking pool,
    /// at most `max_concurrency` at a time.
    ///
    /// The report is identical to [`compare`](Self::compare) regardless of
    /// completion order.
    ///
    /// # Errors
    /// Returns an error if the columns cannot be resolved or a worker task
    /// fails.
    pub async fn compare_concurrent(
        &self,
        real: &RecordSet,
        synthetic: &RecordSet,
    ) -> Result<QualityReport> {
        let columns = self.resolve_columns(real, synthetic)?;
        let settings = self.settings();

        // Tasks own their inputs so `columns` is free to move into the report
        let tasks: Vec<_> = columns
            .iter()
            .map(|column| {
                let column = column.clone();
                let real_values = real.numeric_column(&column);
                let synthetic_values = synthetic.numeric_column(&column);
                async move {
                    tokio::task::spawn_blocking(move || {
                        analyze_column(&column, &real_values, &synthetic_values, settings)
                    })
                    .await
                    .map_err(|e| VitalCertError::worker(format!("column analysis task: {}", e)))?
                }
            })
            .collect();

        let mut analyses = Vec::with_capacity(tasks.len());
        {
            let mut stream = stream::iter(tasks).buffer_unordered(self.config.max_concurrency);
            while let Some(result) = stream.next().await {
                analyses.push(result?);
            }
        }

        Ok(self.build_report(real, synthetic, columns, analyses))
    }

    fn build_report(
        &self,
        real: &RecordSet,
        synthetic: &RecordSet,
        columns: Vec<String>,
        analyses: Vec<ColumnAnalysis>,
    ) -> QualityReport {
        let mut distances = BTreeMap::new();
        let mut reconstruction_errors = BTreeMap::new();
        let mut utilities = BTreeMap::new();
        let mut comparisons = BTreeMap::new();
        let mut profiles = BTreeMap::new();

        for analysis in analyses {
            distances.insert(analysis.column.clone(), analysis.distance);
            reconstruction_errors.insert(analysis.column.clone(), analysis.reconstruction_error);
            utilities.insert(analysis.column.clone(), analysis.imputation_utility);
            comparisons.insert(analysis.column.clone(), analysis.comparison);
            profiles.insert(analysis.column, analysis.profile);
        }

        let correlation = compare_correlations(real, synthetic, &columns);
        let sub_metrics = SubMetrics {
            distances,
            correlation_preservation: correlation.preservation,
            reconstruction_errors,
            imputation_utility: imputation_utility(utilities.values()),
        };

        let quality_score = aggregate_quality_score(&sub_metrics, &self.weights);
        let grade = QualityGrade::from_score(quality_score);
        let distance_values: Vec<f64> = sub_metrics.distances.values().copied().collect();
        let distance_summary = SummaryStats::from_values(&distance_values);
        let summary = summarize(
            quality_score,
            grade,
            columns.len(),
            self.config.distance_metric,
            distance_summary.mean,
        );

        tracing::info!(
            columns = columns.len(),
            real_records = real.len(),
            synthetic_records = synthetic.len(),
            quality_score,
            "Distribution comparison completed"
        );

        QualityReport {
            real_records: real.len(),
            synthetic_records: synthetic.len(),
            columns,
            distance_metric: self.config.distance_metric,
            distances: sub_metrics.distances,
            distance_summary,
            correlation_preservation: sub_metrics.correlation_preservation,
            correlation_pairs: correlation.pairs,
            reconstruction_errors: sub_metrics.reconstruction_errors,
            imputation_utility: sub_metrics.imputation_utility,
            weights: self.weights,
            quality_score,
            grade,
            comparisons,
            profiles,
            summary,
            analyzed_at: Utc::now(),
        }
    }
}
