//! Aggregate quality scoring.
//!
//! Each sub-metric is turned into a similarity term in `[0, 1]` (higher is
//! better) and the terms are combined as a weighted mean.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::config::ConfigValidationError;

/// Sub-metric families that contribute to the aggregate score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityMetric {
    Distance,
    Correlation,
    Reconstruction,
    Imputation,
}

impl QualityMetric {
    /// All metrics in reporting order.
    pub const ALL: [QualityMetric; 4] = [
        QualityMetric::Distance,
        QualityMetric::Correlation,
        QualityMetric::Reconstruction,
        QualityMetric::Imputation,
    ];

    /// Configuration key for this metric.
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityMetric::Distance => "distance",
            QualityMetric::Correlation => "correlation",
            QualityMetric::Reconstruction => "reconstruction",
            QualityMetric::Imputation => "imputation",
        }
    }
}

impl fmt::Display for QualityMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QualityMetric {
    type Err = ConfigValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QualityMetric::ALL
            .into_iter()
            .find(|metric| metric.as_str() == s.trim())
            .ok_or_else(|| ConfigValidationError::UnknownMetric(s.to_string()))
    }
}

/// Validated sub-metric weights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricWeights {
    pub distance: f64,
    pub correlation: f64,
    pub reconstruction: f64,
    pub imputation: f64,
}

impl Default for MetricWeights {
    fn default() -> Self {
        Self::equal()
    }
}

impl MetricWeights {
    /// Equal weighting of all four metrics.
    pub fn equal() -> Self {
        Self {
            distance: 1.0,
            correlation: 1.0,
            reconstruction: 1.0,
            imputation: 1.0,
        }
    }

    /// Builds weights from a `{metric_name: weight}` map.
    ///
    /// Keys absent from the map weigh zero.
    ///
    /// # Errors
    /// Unknown keys, negative or non-finite weights, and maps where every
    /// weight is zero are rejected.
    pub fn from_map(map: &BTreeMap<String, f64>) -> Result<Self, ConfigValidationError> {
        let mut weights = Self {
            distance: 0.0,
            correlation: 0.0,
            reconstruction: 0.0,
            imputation: 0.0,
        };

        for (key, &weight) in map {
            let metric: QualityMetric = key.parse()?;
            if !weight.is_finite() || weight < 0.0 {
                return Err(ConfigValidationError::InvalidWeight {
                    metric: key.clone(),
                    weight,
                });
            }
            *weights.slot_mut(metric) = weight;
        }

        if weights.total() <= 0.0 {
            return Err(ConfigValidationError::ZeroWeights);
        }
        Ok(weights)
    }

    /// Weight assigned to a metric.
    pub fn get(&self, metric: QualityMetric) -> f64 {
        match metric {
            QualityMetric::Distance => self.distance,
            QualityMetric::Correlation => self.correlation,
            QualityMetric::Reconstruction => self.reconstruction,
            QualityMetric::Imputation => self.imputation,
        }
    }

    fn slot_mut(&mut self, metric: QualityMetric) -> &mut f64 {
        match metric {
            QualityMetric::Distance => &mut self.distance,
            QualityMetric::Correlation => &mut self.correlation,
            QualityMetric::Reconstruction => &mut self.reconstruction,
            QualityMetric::Imputation => &mut self.imputation,
        }
    }

    /// Sum of all weights.
    pub fn total(&self) -> f64 {
        QualityMetric::ALL.iter().map(|&m| self.get(m)).sum()
    }
}

/// Raw sub-metric results feeding the aggregate score.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubMetrics {
    /// Per-column distance (lower is better)
    pub distances: BTreeMap<String, f64>,
    /// Correlation preservation in `[0, 1]`
    pub correlation_preservation: f64,
    /// Per-column reconstruction error (lower is better)
    pub reconstruction_errors: BTreeMap<String, f64>,
    /// Imputation utility in `[0, 1]`
    pub imputation_utility: f64,
}

impl SubMetrics {
    /// Similarity term for a metric, in `[0, 1]`.
    ///
    /// Distances and errors are capped at 1 before averaging; an empty
    /// per-column map contributes a perfect term.
    pub fn similarity(&self, metric: QualityMetric) -> f64 {
        match metric {
            QualityMetric::Distance => 1.0 - capped_mean(&self.distances),
            QualityMetric::Correlation => clamp_unit(self.correlation_preservation),
            QualityMetric::Reconstruction => 1.0 - capped_mean(&self.reconstruction_errors),
            QualityMetric::Imputation => clamp_unit(self.imputation_utility),
        }
    }
}

fn capped_mean(values: &BTreeMap<String, f64>) -> f64 {
    let capped: Vec<f64> = values
        .values()
        .map(|&v| if v.is_nan() { 1.0 } else { v.clamp(0.0, 1.0) })
        .collect();
    if capped.is_empty() {
        return 0.0;
    }
    capped.iter().sum::<f64>() / capped.len() as f64
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Combines sub-metrics into a single score in `[0, 1]`.
///
/// # Example
/// ```
/// use std::collections::BTreeMap;
/// use vitalcert_core::quality::{aggregate_quality_score, MetricWeights, SubMetrics};
///
/// let metrics = SubMetrics {
///     distances: BTreeMap::from([("heart_rate".to_string(), 0.2)]),
///     correlation_preservation: 1.0,
///     reconstruction_errors: BTreeMap::from([("heart_rate".to_string(), 0.0)]),
///     imputation_utility: 1.0,
/// };
/// let score = aggregate_quality_score(&metrics, &MetricWeights::equal());
/// assert!((score - 0.95).abs() < 1e-12);
/// ```
pub fn aggregate_quality_score(metrics: &SubMetrics, weights: &MetricWeights) -> f64 {
    let total = weights.total();
    if total <= 0.0 {
        return 0.0;
    }

    let weighted: f64 = QualityMetric::ALL
        .iter()
        .map(|&metric| weights.get(metric) * metrics.similarity(metric))
        .sum();

    (weighted / total).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(distance: f64, correlation: f64, error: f64, imputation: f64) -> SubMetrics {
        SubMetrics {
            distances: BTreeMap::from([("a".to_string(), distance)]),
            correlation_preservation: correlation,
            reconstruction_errors: BTreeMap::from([("a".to_string(), error)]),
            imputation_utility: imputation,
        }
    }

    #[test]
    fn test_perfect_metrics_score_one() {
        let score = aggregate_quality_score(&metrics(0.0, 1.0, 0.0, 1.0), &MetricWeights::equal());
        assert_eq!(score, 1.0);
    }

    #[test]
    fn test_worst_metrics_score_zero() {
        let score = aggregate_quality_score(&metrics(3.0, 0.0, 7.5, 0.0), &MetricWeights::equal());
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_weighting_shifts_score() {
        let m = metrics(0.5, 1.0, 0.0, 1.0);
        let equal = aggregate_quality_score(&m, &MetricWeights::equal());
        assert!((equal - 0.875).abs() < 1e-12);

        let map = BTreeMap::from([("distance".to_string(), 1.0)]);
        let distance_only = MetricWeights::from_map(&map).unwrap();
        let score = aggregate_quality_score(&m, &distance_only);
        assert!((score - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_from_map_rejects_bad_weights() {
        let unknown = BTreeMap::from([("fidelity".to_string(), 1.0)]);
        assert_eq!(
            MetricWeights::from_map(&unknown),
            Err(ConfigValidationError::UnknownMetric("fidelity".to_string()))
        );

        let negative = BTreeMap::from([("distance".to_string(), -1.0)]);
        assert!(matches!(
            MetricWeights::from_map(&negative),
            Err(ConfigValidationError::InvalidWeight { .. })
        ));

        let zeros = BTreeMap::from([
            ("distance".to_string(), 0.0),
            ("imputation".to_string(), 0.0),
        ]);
        assert_eq!(
            MetricWeights::from_map(&zeros),
            Err(ConfigValidationError::ZeroWeights)
        );
    }

    #[test]
    fn test_empty_column_maps_are_perfect_terms() {
        let m = SubMetrics {
            correlation_preservation: 1.0,
            imputation_utility: 1.0,
            ..SubMetrics::default()
        };
        assert_eq!(aggregate_quality_score(&m, &MetricWeights::equal()), 1.0);
    }

    #[test]
    fn test_metric_parsing() {
        assert_eq!("correlation".parse(), Ok(QualityMetric::Correlation));
        assert!("Distance".parse::<QualityMetric>().is_err());
    }
}
