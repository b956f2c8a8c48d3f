//! Mean-difference percentages.

/// Percentage difference of a synthetic mean relative to a real mean.
///
/// Returns `100 * (synthetic - real) / real`. When the real mean is zero
/// the result is `0.0` if the synthetic mean is also zero and
/// `f64::INFINITY` otherwise, whatever the sign of the synthetic mean.
///
/// # Example
/// ```
/// use vitalcert_core::quality::diff_percent;
///
/// assert_eq!(diff_percent(110.0, 100.0), 10.0);
/// assert_eq!(diff_percent(90.0, 100.0), -10.0);
/// assert_eq!(diff_percent(0.0, 0.0), 0.0);
/// ```
pub fn diff_percent(synthetic_mean: f64, real_mean: f64) -> f64 {
    if real_mean == 0.0 {
        return if synthetic_mean == 0.0 {
            0.0
        } else {
            f64::INFINITY
        };
    }
    100.0 * (synthetic_mean - real_mean) / real_mean
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diff_percent_basic() {
        assert!((diff_percent(110.0, 100.0) - 10.0).abs() < 1e-12);
        assert!((diff_percent(90.0, 100.0) + 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_diff_percent_zero_real_mean() {
        assert_eq!(diff_percent(0.0, 0.0), 0.0);
        assert_eq!(diff_percent(5.0, 0.0), f64::INFINITY);
        assert_eq!(diff_percent(-5.0, 0.0), f64::INFINITY);
    }

    #[test]
    fn test_diff_percent_negative_real_mean() {
        // Relative to a negative baseline the sign follows the formula
        assert!((diff_percent(-110.0, -100.0) - 10.0).abs() < 1e-12);
    }
}
