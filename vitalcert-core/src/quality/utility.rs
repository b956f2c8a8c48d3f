//! Reconstruction error and imputation utility.

use crate::stats::descriptive::{mean, quantile_sorted, sorted_finite, std_dev, variance};

/// Normalized quantile reconstruction error for one column.
///
/// RMSE between real and synthetic nearest-rank quantiles at
/// `quantile_points` evenly spaced probabilities in `[0, 1]`, divided by
/// the real column's population standard deviation. A constant real
/// column yields `0.0` for an exact match and `1.0` otherwise. Either side
/// empty yields `1.0` unless both are.
pub fn reconstruction_error(real: &[f64], synthetic: &[f64], quantile_points: usize) -> f64 {
    let real_sorted = sorted_finite(real);
    let syn_sorted = sorted_finite(synthetic);

    match (real_sorted.is_empty(), syn_sorted.is_empty()) {
        (true, true) => return 0.0,
        (true, false) | (false, true) => return 1.0,
        (false, false) => {}
    }

    let points = quantile_points.max(2);
    let step = 1.0 / (points - 1) as f64;
    let mse = (0..points)
        .map(|k| {
            let p = k as f64 * step;
            let diff = quantile_sorted(&real_sorted, p) - quantile_sorted(&syn_sorted, p);
            diff * diff
        })
        .sum::<f64>()
        / points as f64;
    let rmse = mse.sqrt();

    let spread = std_dev(&real_sorted);
    if spread > 0.0 {
        rmse / spread
    } else if rmse == 0.0 {
        0.0
    } else {
        1.0
    }
}

/// Utility of the synthetic mean as an imputation value for one column.
///
/// `var_r / (var_r + (mean_s - mean_r)^2)`: the mean squared error of
/// imputing with the real mean over that of imputing with the synthetic
/// mean. Either side empty yields `0.0`.
pub fn column_imputation_utility(real: &[f64], synthetic: &[f64]) -> f64 {
    let real_sorted = sorted_finite(real);
    let syn_sorted = sorted_finite(synthetic);
    if real_sorted.is_empty() || syn_sorted.is_empty() {
        return 0.0;
    }

    let var_r = variance(&real_sorted);
    let shift = mean(&syn_sorted) - mean(&real_sorted);
    let bias = shift * shift;

    if var_r > 0.0 {
        var_r / (var_r + bias)
    } else if bias == 0.0 {
        1.0
    } else {
        0.0
    }
}

/// Mean imputation utility across columns; `1.0` when there are none.
pub fn imputation_utility<'a, I>(utilities: I) -> f64
where
    I: IntoIterator<Item = &'a f64>,
{
    let values: Vec<f64> = utilities.into_iter().copied().collect();
    if values.is_empty() {
        return 1.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
