//! Privacy risk engine facade.
//!
//! This module provides the `PrivacyRiskEngine` that partitions the
//! released dataset, runs the disclosure checks and charges the
//! assessment's queries to the budget ledger.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use super::budget::{BudgetLedger, EPSILON_TOLERANCE, InMemoryBudgetLedger};
use super::config::PrivacyConfig;
use super::dp::charge_queries;
use super::equivalence::{EquivalenceClass, EquivalenceClassIndex};
use super::k_anonymity::k_anonymity;
use super::l_diversity::l_diversity;
use super::models::{DatasetInfo, OverallAssessment, PrivacyInputs, PrivacyReport};
use super::reidentification::assess_reidentification;
use crate::models::RecordSet;
use crate::{Result, VitalCertError};

/// Privacy risk engine for synthetic dataset releases.
///
/// k-anonymity, l-diversity and re-identification are pure computations
/// over the inputs. The shared ledger is touched only by the final debit
/// step, so an assessment that fails earlier leaves the budget unchanged.
///
/// # Example
///
/// ```rust,ignore
/// use vitalcert_core::privacy::{PrivacyConfig, PrivacyRiskEngine};
///
/// let engine = PrivacyRiskEngine::with_in_memory_ledger(config)?;
/// let report = engine.assess(&real, &synthetic, &inputs)?;
/// println!("Safe for release: {}", report.overall.safe_for_release);
/// ```
#[derive(Debug, Clone)]
pub struct PrivacyRiskEngine {
    config: PrivacyConfig,
    ledger: Arc<dyn BudgetLedger>,
}

impl PrivacyRiskEngine {
    /// Creates an engine over a shared ledger.
    ///
    /// The ledger's own total budget governs every debit; a differing
    /// `total_epsilon_budget` in `config` is logged and otherwise ignored.
    ///
    /// # Errors
    /// Returns a configuration error if the configuration is invalid.
    pub fn new(config: PrivacyConfig, ledger: Arc<dyn BudgetLedger>) -> Result<Self> {
        config.validate()?;
        let ledger_total = ledger.snapshot().total_budget;
        if (ledger_total - config.total_epsilon_budget).abs() > EPSILON_TOLERANCE {
            tracing::warn!(
                "Configured epsilon budget {:.4} differs from the shared ledger total {:.4}; using the ledger total",
                config.total_epsilon_budget,
                ledger_total
            );
        }
        Ok(Self { config, ledger })
    }

    /// Creates an engine with a fresh in-memory ledger sized from the
    /// configured total epsilon budget.
    ///
    /// # Errors
    /// Returns a configuration error if the configuration is invalid.
    pub fn with_in_memory_ledger(config: PrivacyConfig) -> Result<Self> {
        config.validate()?;
        let ledger = Arc::new(InMemoryBudgetLedger::new(config.total_epsilon_budget)?);
        Ok(Self { config, ledger })
    }

    /// Returns a reference to the engine configuration.
    pub fn config(&self) -> &PrivacyConfig {
        &self.config
    }

    /// Returns the shared ledger.
    pub fn ledger(&self) -> &Arc<dyn BudgetLedger> {
        &self.ledger
    }

    fn ensure_columns_present(&self, target: &RecordSet) -> Result<()> {
        for column in self
            .config
            .quasi_identifiers
            .iter()
            .chain(self.config.sensitive_attributes.iter())
        {
            if !target.has_column(column) {
                return Err(VitalCertError::configuration(format!(
                    "column '{}' is not present in any record of dataset '{}'",
                    column, target.name
                )));
            }
        }
        Ok(())
    }

    /// Partitions a dataset into equivalence classes, `chunk_size` rows at
    /// a time.
    ///
    /// # Errors
    /// Returns a configuration error if a configured column is absent from
    /// every record.
    pub fn partition(&self, target: &RecordSet) -> Result<Vec<EquivalenceClass>> {
        self.ensure_columns_present(target)?;

        let mut index = EquivalenceClassIndex::new(
            self.config.quasi_identifiers.clone(),
            self.config.sensitive_attributes.clone(),
        );
        for chunk in target.rows.chunks(self.config.chunk_size.max(1)) {
            index.ingest(chunk);
        }
        Ok(index.finish())
    }

    /// Assesses the disclosure risk of releasing `synthetic`.
    ///
    /// An empty synthetic dataset is reported as unsafe rather than
    /// rejected; its configured columns are then checked against `real`.
    ///
    /// # Errors
    /// Returns a configuration error for columns missing from the synthetic
    /// dataset (or from a non-empty `real` one when `synthetic` is empty),
    /// and `BudgetExceeded` if the queries do not fit in the remaining
    /// budget.
    pub fn assess(
        &self,
        real: &RecordSet,
        synthetic: &RecordSet,
        inputs: &PrivacyInputs,
    ) -> Result<PrivacyReport> {
        let classes = if synthetic.is_empty() {
            tracing::warn!("Dataset '{}' is empty", synthetic.name);
            if !real.is_empty() {
                self.ensure_columns_present(real)?;
            }
            Vec::new()
        } else {
            self.partition(synthetic)?
        };

        let k_result = k_anonymity(&classes, self.config.k_threshold);
        let l_result = l_diversity(
            &classes,
            &self.config.sensitive_attributes,
            self.config.l_threshold,
        );
        let reid_result =
            assess_reidentification(&inputs.attacks, self.config.reid_risk_threshold);

        let dp_result = charge_queries(self.ledger.as_ref(), &inputs.queries, self.config.delta)?;

        let overall =
            OverallAssessment::from_checks(k_result.safe, l_result.safe, reid_result.overall.safe);

        tracing::info!(
            k = k_result.k,
            l = l_result.l,
            max_reid_risk = reid_result.overall.max_risk,
            cumulative_epsilon = dp_result.cumulative_epsilon,
            safe_for_release = overall.safe_for_release,
            "Privacy assessment completed"
        );

        Ok(PrivacyReport {
            assessment_id: Uuid::new_v4(),
            dataset_info: DatasetInfo {
                real_records: real.len(),
                synthetic_records: synthetic.len(),
                quasi_identifiers: self.config.quasi_identifiers.clone(),
                sensitive_attributes: self.config.sensitive_attributes.clone(),
            },
            k_anonymity: k_result,
            l_diversity: l_result,
            reidentification: reid_result,
            differential_privacy: dp_result,
            overall,
            assessed_at: Utc::now(),
        })
    }
}
