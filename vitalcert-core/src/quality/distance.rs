//! Per-column distribution distances.

use super::config::DistanceMetric;
use crate::stats::descriptive::sorted_finite;

/// Distance between the real and synthetic values of one column using
/// the selected metric.
///
/// Both sides empty yields `0.0`; exactly one side empty yields `1.0`.
pub fn column_distance(metric: DistanceMetric, real: &[f64], synthetic: &[f64]) -> f64 {
    let real = sorted_finite(real);
    let synthetic = sorted_finite(synthetic);

    match (real.is_empty(), synthetic.is_empty()) {
        (true, true) => return 0.0,
        (true, false) | (false, true) => return 1.0,
        (false, false) => {}
    }

    match metric {
        DistanceMetric::KolmogorovSmirnov => ks_statistic_sorted(&real, &synthetic),
        DistanceMetric::Wasserstein => normalized_wasserstein_sorted(&real, &synthetic),
    }
}

/// Two-sample Kolmogorov-Smirnov statistic: the largest vertical gap
/// between the two empirical CDFs.
pub fn ks_statistic(a: &[f64], b: &[f64]) -> f64 {
    column_distance(DistanceMetric::KolmogorovSmirnov, a, b)
}

fn ks_statistic_sorted(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len() as f64;
    let m = b.len() as f64;
    let (mut i, mut j) = (0usize, 0usize);
    let mut max_gap: f64 = 0.0;

    while i < a.len() && j < b.len() {
        let v = a[i].min(b[j]);
        while i < a.len() && a[i] <= v {
            i += 1;
        }
        while j < b.len() && b[j] <= v {
            j += 1;
        }
        max_gap = max_gap.max((i as f64 / n - j as f64 / m).abs());
    }
    max_gap
}

/// 1-Wasserstein (earth mover's) distance between two samples.
pub fn wasserstein(a: &[f64], b: &[f64]) -> f64 {
    let a = sorted_finite(a);
    let b = sorted_finite(b);
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    wasserstein_sorted(&a, &b)
}

fn wasserstein_sorted(a: &[f64], b: &[f64]) -> f64 {
    let mut support: Vec<f64> = a.iter().chain(b.iter()).copied().collect();
    support.sort_by(f64::total_cmp);

    let n = a.len() as f64;
    let m = b.len() as f64;

    support
        .windows(2)
        .map(|pair| {
            let (x, next) = (pair[0], pair[1]);
            let cdf_a = a.partition_point(|&v| v <= x) as f64 / n;
            let cdf_b = b.partition_point(|&v| v <= x) as f64 / m;
            (cdf_a - cdf_b).abs() * (next - x)
        })
        .sum()
}

/// Wasserstein distance divided by the real sample's range.
///
/// A constant real column yields `0.0` when the synthetic sample matches
/// it exactly and `1.0` otherwise.
fn normalized_wasserstein_sorted(real: &[f64], synthetic: &[f64]) -> f64 {
    let distance = wasserstein_sorted(real, synthetic);
    let range = match (real.first(), real.last()) {
        (Some(min), Some(max)) => max - min,
        _ => 0.0,
    };

    if range > 0.0 {
        distance / range
    } else if distance == 0.0 {
        0.0
    } else {
        1.0
    }
}
