//! Combined quality and privacy certification.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::config::CertificationConfig;
use crate::models::RecordSet;
use crate::privacy::{BudgetLedger, PrivacyInputs, PrivacyReport, PrivacyRiskEngine};
use crate::quality::{DistributionComparator, QualityReport};

/// Outcome of certifying a synthetic release.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificationReport {
    pub quality: QualityReport,
    pub privacy: PrivacyReport,
    pub min_quality_score: f64,
    /// Safe for release and at or above the minimum quality score
    pub certified: bool,
    pub certified_at: DateTime<Utc>,
}

/// Runs both engines against one dataset pair.
#[derive(Debug, Clone)]
pub struct Certifier {
    comparator: DistributionComparator,
    privacy: PrivacyRiskEngine,
    min_quality_score: f64,
}

impl Certifier {
    /// Creates a certifier with a fresh in-memory budget ledger.
    ///
    /// # Errors
    /// Returns a configuration error if any section is invalid.
    pub fn new(config: CertificationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            comparator: DistributionComparator::new(config.quality)?,
            privacy: PrivacyRiskEngine::with_in_memory_ledger(config.privacy)?,
            min_quality_score: config.min_quality_score,
        })
    }

    /// Creates a certifier charging queries to a shared ledger.
    ///
    /// # Errors
    /// Returns a configuration error if any section is invalid.
    pub fn with_ledger(config: CertificationConfig, ledger: Arc<dyn BudgetLedger>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            comparator: DistributionComparator::new(config.quality)?,
            privacy: PrivacyRiskEngine::new(config.privacy, ledger)?,
            min_quality_score: config.min_quality_score,
        })
    }

    /// Returns the distribution comparator.
    pub fn comparator(&self) -> &DistributionComparator {
        &self.comparator
    }

    /// Returns the privacy engine.
    pub fn privacy_engine(&self) -> &PrivacyRiskEngine {
        &self.privacy
    }

    /// Certifies a synthetic dataset against the real one.
    ///
    /// The quality comparison runs first so that a quality failure never
    /// spends privacy budget.
    ///
    /// # Errors
    /// Propagates errors from either engine, including `BudgetExceeded`.
    pub async fn certify(
        &self,
        real: &RecordSet,
        synthetic: &RecordSet,
        inputs: &PrivacyInputs,
    ) -> Result<CertificationReport> {
        let quality = self.comparator.compare_concurrent(real, synthetic).await?;
        let privacy = self.privacy.assess(real, synthetic, inputs)?;

        let certified = privacy.overall.safe_for_release
            && quality.quality_score >= self.min_quality_score;

        tracing::info!(
            quality_score = quality.quality_score,
            safe_for_release = privacy.overall.safe_for_release,
            certified,
            "Certification completed"
        );

        Ok(CertificationReport {
            quality,
            privacy,
            min_quality_score: self.min_quality_score,
            certified,
            certified_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::privacy::{AttackInputs, AttackObservation, InMemoryBudgetLedger, QueryCost};
    use serde_json::{Value, json};

    fn rows(offset: f64) -> Vec<Value> {
        let mut rows = Vec::new();
        for (n, arm) in ["A", "B"].into_iter().enumerate() {
            for i in 0..10 {
                let diagnosis = if i % 3 == 0 { "htn" } else { "none" };
                let value = f64::from(i) + offset + n as f64;
                rows.push(json!({
                    "arm": arm,
                    "visit": "baseline",
                    "diagnosis": diagnosis,
                    "heart_rate": 65.0 + value,
                    "systolic_bp": 115.0 + 2.0 * value,
                }));
            }
        }
        rows
    }

    fn inputs() -> PrivacyInputs {
        let low = AttackObservation::new(0.02, 0.01);
        PrivacyInputs {
            attacks: AttackInputs {
                singling_out: low,
                linkability: low,
                attribute_inference: low,
            },
            queries: vec![QueryCost::new("release-1", 0.2)],
        }
    }

    fn config() -> CertificationConfig {
        CertificationConfig::new().with_privacy(
            crate::privacy::PrivacyConfig::new().with_sensitive_attributes(["diagnosis"]),
        )
    }

    #[tokio::test]
    async fn test_matching_release_is_certified() {
        let certifier = Certifier::new(config()).unwrap();
        let real = RecordSet::new("real", rows(0.0));
        let synthetic = RecordSet::new("synthetic", rows(0.0));

        let report = certifier.certify(&real, &synthetic, &inputs()).await.unwrap();
        assert!(report.certified);
        assert!(report.quality.quality_score >= 0.99);
    }

    #[tokio::test]
    async fn test_poor_quality_blocks_certification() {
        let certifier = Certifier::new(config()).unwrap();
        let real = RecordSet::new("real", rows(0.0));
        let synthetic = RecordSet::new("synthetic", rows(40.0));

        let report = certifier.certify(&real, &synthetic, &inputs()).await.unwrap();
        assert!(report.privacy.overall.safe_for_release);
        assert!(!report.certified);
    }

    #[tokio::test]
    async fn test_shared_ledger_accumulates_across_certifications() {
        let ledger: Arc<dyn BudgetLedger> = Arc::new(InMemoryBudgetLedger::new(0.3).unwrap());
        let certifier = Certifier::with_ledger(config(), Arc::clone(&ledger)).unwrap();
        let real = RecordSet::new("real", rows(0.0));

        certifier.certify(&real, &real, &inputs()).await.unwrap();
        // Same query id again is free
        certifier.certify(&real, &real, &inputs()).await.unwrap();

        let mut next = inputs();
        next.queries = vec![QueryCost::new("release-2", 0.2)];
        let err = certifier.certify(&real, &real, &next).await.unwrap_err();
        assert!(err.is_budget_exhaustion());
    }
}
