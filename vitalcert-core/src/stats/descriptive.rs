//! Descriptive statistics over `f64` series.
//!
//! All helpers ignore non-finite values so that a single malformed cell
//! cannot poison an aggregate. Empty input yields `0.0`.

use serde::{Deserialize, Serialize};

/// Returns the finite values of a series in their original order.
pub fn finite_values(values: &[f64]) -> Vec<f64> {
    values.iter().copied().filter(|v| v.is_finite()).collect()
}

/// Returns the finite values of a series sorted ascending.
pub fn sorted_finite(values: &[f64]) -> Vec<f64> {
    let mut sorted = finite_values(values);
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// Arithmetic mean; `0.0` for empty input.
pub fn mean(values: &[f64]) -> f64 {
    let finite = finite_values(values);
    if finite.is_empty() {
        return 0.0;
    }
    finite.iter().sum::<f64>() / finite.len() as f64
}

/// Population variance (divides by n); `0.0` for empty input.
pub fn variance(values: &[f64]) -> f64 {
    let finite = finite_values(values);
    if finite.is_empty() {
        return 0.0;
    }
    let n = finite.len() as f64;
    let mean = finite.iter().sum::<f64>() / n;
    finite.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n
}

/// Population standard deviation; `0.0` for empty input.
pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// Median of pre-sorted values: mean of the two central elements when the
/// length is even.
pub fn median_sorted(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    }
}

/// Median of unsorted values.
pub fn median(values: &[f64]) -> f64 {
    median_sorted(&sorted_finite(values))
}

/// Nearest-rank quantile of pre-sorted values: `sorted[floor(p * n)]`,
/// clamped to the last index. No interpolation.
pub fn quantile_sorted(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let last = sorted.len() - 1;
    let rank = (p.clamp(0.0, 1.0) * sorted.len() as f64).floor() as usize;
    sorted[rank.min(last)]
}

/// Pearson correlation of two paired series.
///
/// Pairs where either side is non-finite are dropped. Fewer than two
/// pairs or a constant side yields the sentinel `0.0`.
pub fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    let pairs: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys.iter())
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .map(|(x, y)| (*x, *y))
        .collect();

    if pairs.len() < 2 {
        return 0.0;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let denom = (var_x * var_y).sqrt();
    if denom < 1e-12 {
        return 0.0;
    }
    (cov / denom).clamp(-1.0, 1.0)
}

/// Summary statistics reported for a set of metric values.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SummaryStats {
    /// Arithmetic mean
    pub mean: f64,
    /// Median
    pub median: f64,
    /// Minimum
    pub min: f64,
    /// Maximum
    pub max: f64,
    /// Population standard deviation
    pub std: f64,
}

impl SummaryStats {
    /// Summarizes a series; all fields are zero for empty input.
    pub fn from_values(values: &[f64]) -> Self {
        let sorted = sorted_finite(values);
        let (Some(&min), Some(&max)) = (sorted.first(), sorted.last()) else {
            return Self::default();
        };

        Self {
            mean: mean(&sorted),
            median: median_sorted(&sorted),
            min,
            max,
            std: std_dev(&sorted),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_std() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((mean(&values) - 5.0).abs() < 1e-12);
        assert!((std_dev(&values) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_series_is_zero() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(variance(&[]), 0.0);
        assert_eq!(median(&[]), 0.0);
        assert_eq!(quantile_sorted(&[], 0.5), 0.0);
    }

    #[test]
    fn test_non_finite_values_ignored() {
        let values = [1.0, f64::NAN, 3.0, f64::INFINITY];
        assert!((mean(&values) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_median_even_and_odd() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
    }

    #[test]
    fn test_quantile_nearest_rank() {
        let sorted: Vec<f64> = (1..=10).map(f64::from).collect();
        assert_eq!(quantile_sorted(&sorted, 0.25), 3.0);
        assert_eq!(quantile_sorted(&sorted, 0.75), 8.0);
        assert_eq!(quantile_sorted(&sorted, 1.0), 10.0);
        assert_eq!(quantile_sorted(&sorted, 0.0), 1.0);
    }

    #[test]
    fn test_pearson() {
        let xs = [1.0, 2.0, 3.0, 4.0];
        assert!((pearson(&xs, &[2.0, 4.0, 6.0, 8.0]) - 1.0).abs() < 1e-12);
        assert!((pearson(&xs, &[8.0, 6.0, 4.0, 2.0]) + 1.0).abs() < 1e-12);
        // constant side
        assert_eq!(pearson(&xs, &[1.0, 1.0, 1.0, 1.0]), 0.0);
        assert_eq!(pearson(&[1.0], &[1.0]), 0.0);
    }

    #[test]
    fn test_summary_stats() {
        let summary = SummaryStats::from_values(&[0.1, 0.3, 0.2]);
        assert!((summary.mean - 0.2).abs() < 1e-12);
        assert_eq!(summary.median, 0.2);
        assert_eq!(summary.min, 0.1);
        assert_eq!(summary.max, 0.3);

        assert_eq!(SummaryStats::from_values(&[]), SummaryStats::default());
    }
}
