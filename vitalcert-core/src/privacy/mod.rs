//! Privacy disclosure risk assessment module.
//!
//! This module decides whether a synthetic dataset is safe to release:
//! - **k-anonymity**: smallest equivalence class over quasi-identifiers
//! - **l-diversity**: distinct sensitive values within each class
//! - **Re-identification**: attack advantage over baseline per family
//! - **Differential privacy**: epsilon budget accounting via a ledger
//!
//! # Security Guarantees
//! - Reports carry class sizes, counts and rates only
//! - Quasi-identifier and sensitive values never appear in outputs or logs
//! - Direct identifier columns cannot be configured as quasi-identifiers
//!
//! # Example
//! ```rust,ignore
//! use vitalcert_core::privacy::{PrivacyConfig, PrivacyRiskEngine};
//!
//! let engine = PrivacyRiskEngine::with_in_memory_ledger(PrivacyConfig::default())?;
//! let report = engine.assess(&real, &synthetic, &inputs)?;
//! println!("k = {}", report.k_anonymity.k);
//! ```

mod assessor;
mod budget;
mod config;
mod dp;
mod equivalence;
mod k_anonymity;
mod l_diversity;
mod models;
mod reidentification;

// Re-export public API
pub use assessor::PrivacyRiskEngine;
pub use budget::{
    BudgetLedger, DebitReceipt, EPSILON_TOLERANCE, InMemoryBudgetLedger, LedgerSnapshot,
    LedgerState,
};
pub use config::{PrivacyConfig, PrivacyConfigError};
pub use dp::charge_queries;
pub use equivalence::{EquivalenceClass, EquivalenceClassIndex};
pub use k_anonymity::{k_anonymity, k_anonymity_from_sizes};
pub use l_diversity::l_diversity;
pub use models::{
    AttackFamily, AttackInputs, AttackObservation, AttributeDiversity, DatasetInfo,
    DifferentialPrivacyResult, FamilyRisk, KAnonymityResult, LDiversityResult,
    OverallAssessment, OverallReidentification, PrivacyCheck, PrivacyInputs, PrivacyLevel,
    PrivacyReport, QueryCost, ReidentificationResult, RiskLevel,
};
pub use reidentification::{assess_reidentification, family_risk};
