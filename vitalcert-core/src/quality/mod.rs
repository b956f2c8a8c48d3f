//! Synthetic data quality assessment module.
//!
//! This module compares a synthetic dataset against the real one it was
//! generated from:
//! - **Mean drift**: percentage difference of column means
//! - **Distance**: per-column Kolmogorov-Smirnov or normalized Wasserstein
//! - **Correlation preservation**: change in pairwise Pearson correlations
//! - **Reconstruction error**: quantile RMSE scaled by the real spread
//! - **Imputation utility**: usefulness of synthetic means for imputation
//!
//! The sub-metrics are combined into a weighted aggregate score in
//! `[0, 1]`.
//!
//! # Security Guarantees
//! - Reports expose aggregates (means, quantiles, densities) only
//! - No subject identifiers in outputs; the identifier column is never
//!   analysed
//!
//! # Example
//! ```rust,ignore
//! use vitalcert_core::quality::{DistributionComparator, QualityConfig};
//!
//! let comparator = DistributionComparator::new(QualityConfig::default())?;
//! let report = comparator.compare(&real, &synthetic)?;
//! println!("Quality score: {:.2}%", report.quality_score * 100.0);
//! ```

mod comparator;
mod config;
mod correlation;
mod diff;
mod distance;
mod models;
mod score;
mod utility;

// Re-export public API
pub use comparator::DistributionComparator;
pub use config::{ConfigValidationError, DistanceMetric, MAX_QUANTILE_POINTS, QualityConfig};
pub use correlation::{CorrelationComparison, CorrelationPair, compare_correlations};
pub use diff::diff_percent;
pub use distance::{column_distance, ks_statistic, wasserstein};
pub use models::{ColumnComparison, ColumnProfile, QualityGrade, QualityReport};
pub use score::{MetricWeights, QualityMetric, SubMetrics, aggregate_quality_score};
pub use utility::{column_imputation_utility, imputation_utility, reconstruction_error};
