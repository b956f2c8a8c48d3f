//! Privacy risk assessment models.
//!
//! Result blocks report class sizes, counts and rates only. Quasi-identifier
//! values and sensitive values never leave the engine.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// k-anonymity result over the target dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KAnonymityResult {
    /// Smallest equivalence class size; 0 for an empty dataset
    pub k: usize,
    pub mean_class_size: f64,
    pub median_class_size: f64,
    pub equivalence_classes: usize,
    /// Records in classes smaller than the threshold
    pub records_at_risk: usize,
    /// Percentage of records in classes smaller than the threshold
    pub risky_percentage: f64,
    pub threshold: usize,
    pub safe: bool,
    pub recommendation: String,
}

/// l-diversity result for one sensitive attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeDiversity {
    /// Fewest distinct values in any class
    pub min_distinct: usize,
    /// Mean distinct values per class
    pub mean_distinct: f64,
    /// Classes below the l threshold
    pub classes_below_threshold: usize,
}

/// l-diversity result across all sensitive attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LDiversityResult {
    /// Minimum distinct count over (class, attribute) pairs
    pub l: usize,
    /// Mean distinct count over (class, attribute) pairs
    pub mean_diversity: f64,
    pub threshold: usize,
    pub per_attribute: BTreeMap<String, AttributeDiversity>,
    pub safe: bool,
    pub recommendation: String,
}

/// Attack families evaluated by the external attack harness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackFamily {
    SinglingOut,
    Linkability,
    AttributeInference,
}

impl AttackFamily {
    /// All families in reporting order.
    pub const ALL: [AttackFamily; 3] = [
        AttackFamily::SinglingOut,
        AttackFamily::Linkability,
        AttackFamily::AttributeInference,
    ];

    /// Snake-case label.
    pub fn as_str(&self) -> &'static str {
        match self {
            AttackFamily::SinglingOut => "singling_out",
            AttackFamily::Linkability => "linkability",
            AttackFamily::AttributeInference => "attribute_inference",
        }
    }
}

impl fmt::Display for AttackFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Success rates reported for one attack family.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttackObservation {
    pub attack_success_rate: f64,
    pub baseline_success_rate: f64,
}

impl AttackObservation {
    /// Creates an observation.
    pub fn new(attack_success_rate: f64, baseline_success_rate: f64) -> Self {
        Self {
            attack_success_rate,
            baseline_success_rate,
        }
    }
}

/// Attack observations for every family.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttackInputs {
    pub singling_out: AttackObservation,
    pub linkability: AttackObservation,
    pub attribute_inference: AttackObservation,
}

impl AttackInputs {
    /// Observation for a family.
    pub fn get(&self, family: AttackFamily) -> AttackObservation {
        match family {
            AttackFamily::SinglingOut => self.singling_out,
            AttackFamily::Linkability => self.linkability,
            AttackFamily::AttributeInference => self.attribute_inference,
        }
    }
}

/// Risk for one attack family.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FamilyRisk {
    pub attack_success_rate: f64,
    pub baseline_success_rate: f64,
    /// `max(0, attack - baseline)`
    pub risk: f64,
    pub safe: bool,
}

/// Risk level label for a re-identification risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    VeryLow,
    Low,
    Medium,
    High,
    VeryHigh,
}

impl RiskLevel {
    /// Labels a risk in `[0, 1]`.
    pub fn from_risk(risk: f64) -> Self {
        if risk < 0.05 {
            RiskLevel::VeryLow
        } else if risk < 0.1 {
            RiskLevel::Low
        } else if risk < 0.2 {
            RiskLevel::Medium
        } else if risk < 0.5 {
            RiskLevel::High
        } else {
            RiskLevel::VeryHigh
        }
    }
}

/// Aggregate over all attack families.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverallReidentification {
    pub max_risk: f64,
    pub mean_risk: f64,
    pub risk_level: RiskLevel,
    /// True only if every family is below the threshold
    pub safe: bool,
}

/// Re-identification risk result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReidentificationResult {
    pub singling_out: FamilyRisk,
    pub linkability: FamilyRisk,
    pub attribute_inference: FamilyRisk,
    pub threshold: f64,
    pub overall: OverallReidentification,
}

/// Strength label for cumulative epsilon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrivacyLevel {
    VeryStrong,
    Strong,
    Moderate,
    Weak,
    Minimal,
}

impl PrivacyLevel {
    /// Labels a cumulative epsilon.
    pub fn from_epsilon(epsilon: f64) -> Self {
        if epsilon <= 0.1 {
            PrivacyLevel::VeryStrong
        } else if epsilon <= 1.0 {
            PrivacyLevel::Strong
        } else if epsilon <= 3.0 {
            PrivacyLevel::Moderate
        } else if epsilon <= 10.0 {
            PrivacyLevel::Weak
        } else {
            PrivacyLevel::Minimal
        }
    }
}

/// A query whose epsilon cost is charged to the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryCost {
    /// Idempotency key; retries with the same id are charged once
    pub query_id: String,
    pub epsilon_cost: f64,
}

impl QueryCost {
    /// Creates a query cost.
    pub fn new(query_id: impl Into<String>, epsilon_cost: f64) -> Self {
        Self {
            query_id: query_id.into(),
            epsilon_cost,
        }
    }
}

/// Externally computed inputs for a privacy assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrivacyInputs {
    pub attacks: AttackInputs,
    #[serde(default)]
    pub queries: Vec<QueryCost>,
}

/// Differential-privacy accounting block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifferentialPrivacyResult {
    /// Epsilon newly debited by this assessment; replayed query ids add nothing
    pub epsilon: f64,
    pub delta: f64,
    /// Queries recorded in the ledger
    pub query_count: usize,
    /// Total epsilon spent in the ledger
    pub cumulative_epsilon: f64,
    pub privacy_level: PrivacyLevel,
    pub remaining_budget: f64,
    pub recommendation: String,
}

/// Checks that make up the release decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrivacyCheck {
    KAnonymity,
    LDiversity,
    Reidentification,
}

/// Release decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallAssessment {
    pub safe_for_release: bool,
    pub failed_checks: Vec<PrivacyCheck>,
}

impl OverallAssessment {
    /// Combines the three check outcomes.
    pub fn from_checks(k_safe: bool, l_safe: bool, reid_safe: bool) -> Self {
        let failed_checks: Vec<PrivacyCheck> = [
            (k_safe, PrivacyCheck::KAnonymity),
            (l_safe, PrivacyCheck::LDiversity),
            (reid_safe, PrivacyCheck::Reidentification),
        ]
        .into_iter()
        .filter(|(safe, _)| !safe)
        .map(|(_, check)| check)
        .collect();

        Self {
            safe_for_release: failed_checks.is_empty(),
            failed_checks,
        }
    }
}

/// Shape of the assessed datasets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetInfo {
    pub real_records: usize,
    pub synthetic_records: usize,
    pub quasi_identifiers: Vec<String>,
    pub sensitive_attributes: Vec<String>,
}

/// Complete privacy risk assessment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrivacyReport {
    pub assessment_id: Uuid,
    pub dataset_info: DatasetInfo,
    pub k_anonymity: KAnonymityResult,
    pub l_diversity: LDiversityResult,
    pub reidentification: ReidentificationResult,
    pub differential_privacy: DifferentialPrivacyResult,
    pub overall: OverallAssessment,
    pub assessed_at: DateTime<Utc>,
}
