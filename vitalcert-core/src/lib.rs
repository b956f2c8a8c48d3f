//! Core statistics and certification engines for VitalCert.
//!
//! This crate certifies synthetic clinical vitals datasets before release.
//! It compares a synthetic dataset to the real one it was generated from,
//! and measures the disclosure risk of releasing it.
//!
//! # Security Guarantees
//! - Reports carry aggregates: densities, quantiles, class sizes and rates;
//!   real-side box plots are trimmed to their whiskers
//! - Subject identifiers are never analysed, logged or reported
//! - Differential privacy budget is debited atomically and never overspent
//!
//! # Architecture
//! The core library follows these patterns:
//! - Pure statistics primitives in [`stats`]
//! - Facade engines ([`quality::DistributionComparator`],
//!   [`privacy::PrivacyRiskEngine`]) configured through validated builders
//! - Budget accounting behind the [`privacy::BudgetLedger`] trait so the
//!   service can share one ledger across requests
//! - Comprehensive error handling through [`VitalCertError`]

pub mod certification;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod privacy;
pub mod quality;
pub mod stats;
pub mod validation;

// Re-export commonly used types
pub use certification::{CertificationReport, Certifier};
pub use config::CertificationConfig;
pub use error::{Result, VitalCertError};
pub use logging::{LogFormat, init_logging, init_logging_with_format};
pub use models::{ClinicalRecord, RecordSet, SUBJECT_ID_COLUMN};
pub use privacy::{
    BudgetLedger, InMemoryBudgetLedger, PrivacyConfig, PrivacyInputs, PrivacyReport,
    PrivacyRiskEngine,
};
pub use quality::{DistributionComparator, QualityConfig, QualityReport};
pub use stats::{BinSet, BoxPlotStats, calculate_box_plot_stats, hist_counts, hist_density, make_bins};

pub use validation::{
    ValidationError, ensure_no_identifier_leakage, initialize_dataset_validator,
    validate_and_parse_dataset, validate_dataset_document,
};
