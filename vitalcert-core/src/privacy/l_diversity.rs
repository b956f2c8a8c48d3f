//! l-diversity of sensitive attributes within equivalence classes.

use std::collections::BTreeMap;

use super::equivalence::EquivalenceClass;
use super::models::{AttributeDiversity, LDiversityResult};

/// Computes l-diversity for the given sensitive attributes.
///
/// `classes[i].sensitive_values` must be ordered like `attributes`. With
/// no attributes or no classes the result is `l = 0` and unsafe.
pub fn l_diversity(
    classes: &[EquivalenceClass],
    attributes: &[String],
    threshold: usize,
) -> LDiversityResult {
    if attributes.is_empty() || classes.is_empty() {
        tracing::warn!(
            attributes = attributes.len(),
            classes = classes.len(),
            "l-diversity cannot be established without sensitive attributes and classes"
        );
        let recommendation = if attributes.is_empty() {
            "Configure at least one sensitive attribute to assess l-diversity"
        } else {
            "No records to assess; l-diversity cannot be established"
        };
        return LDiversityResult {
            l: 0,
            mean_diversity: 0.0,
            threshold,
            per_attribute: BTreeMap::new(),
            safe: false,
            recommendation: recommendation.to_string(),
        };
    }

    let mut per_attribute = BTreeMap::new();
    let mut all_counts = Vec::with_capacity(classes.len() * attributes.len());

    for (slot, attribute) in attributes.iter().enumerate() {
        let counts: Vec<usize> = classes.iter().map(|c| c.distinct_count(slot)).collect();
        let min_distinct = counts.iter().copied().min().unwrap_or(0);
        let mean_distinct = counts.iter().sum::<usize>() as f64 / counts.len() as f64;
        let classes_below_threshold = counts.iter().filter(|&&c| c < threshold).count();

        per_attribute.insert(
            attribute.clone(),
            AttributeDiversity {
                min_distinct,
                mean_distinct,
                classes_below_threshold,
            },
        );
        all_counts.extend(counts);
    }

    let l = all_counts.iter().copied().min().unwrap_or(0);
    let mean_diversity = all_counts.iter().sum::<usize>() as f64 / all_counts.len() as f64;
    let safe = l >= threshold;

    let recommendation = if safe {
        format!(
            "Every class has at least {} distinct value(s) per sensitive attribute",
            threshold
        )
    } else {
        let weakest: Vec<&str> = per_attribute
            .iter()
            .filter(|(_, d)| d.min_distinct < threshold)
            .map(|(name, _)| name.as_str())
            .collect();
        format!(
            "Increase diversity of {} or coarsen quasi-identifiers to reach l={}",
            weakest.join(", "),
            threshold
        )
    };

    tracing::debug!(l, mean_diversity, "l-diversity computed");

    LDiversityResult {
        l,
        mean_diversity,
        threshold,
        per_attribute,
        safe,
        recommendation,
    }
}
