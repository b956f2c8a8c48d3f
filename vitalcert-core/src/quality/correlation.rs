//! Correlation preservation between real and synthetic datasets.

use serde::{Deserialize, Serialize};

use crate::models::RecordSet;
use crate::stats::descriptive::pearson;

/// Pearson correlations of one column pair in both datasets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationPair {
    pub left: String,
    pub right: String,
    pub real: f64,
    pub synthetic: f64,
}

impl CorrelationPair {
    /// Absolute change in correlation, in `[0, 2]`.
    pub fn delta(&self) -> f64 {
        (self.real - self.synthetic).abs()
    }
}

/// Pairwise correlation comparison across the analysed columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationComparison {
    pub pairs: Vec<CorrelationPair>,
    /// `1 - mean(|delta|) / 2`, in `[0, 1]`
    pub preservation: f64,
}

/// Row-aligned column values with missing cells as NaN, which
/// [`pearson`] drops pairwise.
fn aligned(records: &RecordSet, column: &str) -> Vec<f64> {
    records
        .numeric_column_aligned(column)
        .into_iter()
        .map(|cell| cell.unwrap_or(f64::NAN))
        .collect()
}

/// Compares pairwise Pearson correlations of `columns` in both datasets.
///
/// Fewer than two columns yields preservation `1.0` and no pairs.
pub fn compare_correlations(
    real: &RecordSet,
    synthetic: &RecordSet,
    columns: &[String],
) -> CorrelationComparison {
    let real_cols: Vec<Vec<f64>> = columns.iter().map(|c| aligned(real, c)).collect();
    let syn_cols: Vec<Vec<f64>> = columns.iter().map(|c| aligned(synthetic, c)).collect();

    let mut pairs = Vec::new();
    for i in 0..columns.len() {
        for j in (i + 1)..columns.len() {
            pairs.push(CorrelationPair {
                left: columns[i].clone(),
                right: columns[j].clone(),
                real: pearson(&real_cols[i], &real_cols[j]),
                synthetic: pearson(&syn_cols[i], &syn_cols[j]),
            });
        }
    }

    let preservation = if pairs.is_empty() {
        1.0
    } else {
        let mean_delta = pairs.iter().map(CorrelationPair::delta).sum::<f64>() / pairs.len() as f64;
        (1.0 - mean_delta / 2.0).clamp(0.0, 1.0)
    };

    tracing::debug!(
        pairs = pairs.len(),
        preservation,
        "Correlation comparison completed"
    );

    CorrelationComparison {
        pairs,
        preservation,
    }
}
