//! Box-plot statistics with Tukey fences.
//!
//! Quartiles use the nearest-rank estimator (`sorted[floor(p * n)]`, no
//! interpolation) so that results match the dashboard's rendering.

use serde::{Deserialize, Serialize};

use super::descriptive::{median_sorted, quantile_sorted, sorted_finite};

/// Tukey fence multiplier.
const FENCE_FACTOR: f64 = 1.5;

/// Five-number summary plus whiskers and outliers for one series.
///
/// Invariant: `min <= lower_whisker <= q1 <= median <= q3 <= upper_whisker <= max`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BoxPlotStats {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub lower_whisker: f64,
    pub upper_whisker: f64,
    /// Values strictly outside the fences, ascending
    pub outliers: Vec<f64>,
}

impl BoxPlotStats {
    /// Interquartile range.
    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }

    /// Lower and upper Tukey fences.
    pub fn fences(&self) -> (f64, f64) {
        let iqr = self.iqr();
        (self.q1 - FENCE_FACTOR * iqr, self.q3 + FENCE_FACTOR * iqr)
    }

    /// Drops values beyond the whiskers: `min`/`max` collapse onto the
    /// whiskers and `outliers` is emptied. Returns the trimmed stats and
    /// the number of outliers removed.
    pub fn trimmed_to_whiskers(mut self) -> (Self, usize) {
        let removed = self.outliers.len();
        self.outliers.clear();
        self.min = self.lower_whisker;
        self.max = self.upper_whisker;
        (self, removed)
    }
}

/// Computes box-plot statistics for a series.
///
/// Empty input (or input without finite values) returns all-zero stats
/// and no outliers.
///
/// # Example
/// ```
/// use vitalcert_core::stats::boxplot::calculate_box_plot_stats;
///
/// let stats = calculate_box_plot_stats(&[1.0, 2.0, 3.0, 4.0, 5.0, 100.0]);
/// assert_eq!(stats.outliers, vec![100.0]);
/// assert_eq!(stats.upper_whisker, 5.0);
/// ```
pub fn calculate_box_plot_stats(series: &[f64]) -> BoxPlotStats {
    let sorted = sorted_finite(series);
    let (Some(&min), Some(&max)) = (sorted.first(), sorted.last()) else {
        return BoxPlotStats::default();
    };

    let q1 = quantile_sorted(&sorted, 0.25);
    let q3 = quantile_sorted(&sorted, 0.75);
    let median = median_sorted(&sorted);

    let iqr = q3 - q1;
    let lower_bound = q1 - FENCE_FACTOR * iqr;
    let upper_bound = q3 + FENCE_FACTOR * iqr;

    let lower_whisker = sorted
        .iter()
        .copied()
        .find(|&v| v >= lower_bound)
        .unwrap_or(min);
    let upper_whisker = sorted
        .iter()
        .rev()
        .copied()
        .find(|&v| v <= upper_bound)
        .unwrap_or(max);

    let outliers = sorted
        .iter()
        .copied()
        .filter(|&v| v < lower_bound || v > upper_bound)
        .collect();

    BoxPlotStats {
        min,
        q1,
        median,
        q3,
        max,
        lower_whisker,
        upper_whisker,
        outliers,
    }
}
