//! k-anonymity over equivalence classes.

use super::equivalence::EquivalenceClass;
use super::models::KAnonymityResult;
use crate::stats::descriptive::median;

/// Computes k-anonymity from equivalence class sizes.
///
/// An empty input yields `k = 0`, no classes and `safe = false`.
///
/// # Example
/// ```
/// use vitalcert_core::privacy::k_anonymity_from_sizes;
///
/// let result = k_anonymity_from_sizes(&[5, 5, 3], 5);
/// assert_eq!(result.k, 3);
/// assert!(!result.safe);
/// assert!((result.risky_percentage - 23.08).abs() < 0.01);
/// ```
pub fn k_anonymity_from_sizes(sizes: &[usize], threshold: usize) -> KAnonymityResult {
    let total: usize = sizes.iter().sum();
    let Some(&k) = sizes.iter().min() else {
        return KAnonymityResult {
            k: 0,
            mean_class_size: 0.0,
            median_class_size: 0.0,
            equivalence_classes: 0,
            records_at_risk: 0,
            risky_percentage: 0.0,
            threshold,
            safe: false,
            recommendation: "No records to assess; k-anonymity cannot be established".to_string(),
        };
    };

    let as_f64: Vec<f64> = sizes.iter().map(|&s| s as f64).collect();
    let records_at_risk: usize = sizes.iter().filter(|&&s| s < threshold).sum();
    let risky_percentage = if total == 0 {
        0.0
    } else {
        100.0 * records_at_risk as f64 / total as f64
    };
    let safe = k >= threshold;

    let recommendation = if safe {
        format!(
            "Every equivalence class has at least {} records; k-anonymity holds",
            threshold
        )
    } else {
        format!(
            "Generalize or suppress quasi-identifiers: {} record(s) ({:.2}%) sit in classes smaller than {}",
            records_at_risk, risky_percentage, threshold
        )
    };

    tracing::debug!(
        k,
        classes = sizes.len(),
        records_at_risk,
        "k-anonymity computed"
    );

    KAnonymityResult {
        k,
        mean_class_size: total as f64 / sizes.len() as f64,
        median_class_size: median(&as_f64),
        equivalence_classes: sizes.len(),
        records_at_risk,
        risky_percentage,
        threshold,
        safe,
        recommendation,
    }
}

/// Computes k-anonymity over partitioned classes.
pub fn k_anonymity(classes: &[EquivalenceClass], threshold: usize) -> KAnonymityResult {
    let sizes: Vec<usize> = classes.iter().map(|c| c.size).collect();
    k_anonymity_from_sizes(&sizes, threshold)
}
