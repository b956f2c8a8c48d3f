//! Privacy risk assessment configuration.

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::VitalCertError;
use crate::models::{ARM_COLUMN, VISIT_COLUMN};

/// Default patterns for columns that directly identify a subject.
const DEFAULT_DIRECT_IDENTIFIER_PATTERNS: &[&str] = &[
    r"(?i)^(subject|patient|participant)_?id$",
    r"(?i)(^|_)(mrn|ssn|name|email|phone)($|_)",
];

/// Validation errors for privacy configuration.
#[derive(Debug, Error, PartialEq)]
pub enum PrivacyConfigError {
    #[error("at least one quasi-identifier is required")]
    NoQuasiIdentifiers,
    #[error("k_threshold must be at least 1, got {0}")]
    InvalidKThreshold(usize),
    #[error("l_threshold must be at least 1, got {0}")]
    InvalidLThreshold(usize),
    #[error("reid_risk_threshold must be within (0.0, 1.0], got {0}")]
    InvalidRiskThreshold(f64),
    #[error("total_epsilon_budget must be positive and finite, got {0}")]
    InvalidEpsilonBudget(f64),
    #[error("delta must be within [0.0, 1.0), got {0}")]
    InvalidDelta(f64),
    #[error("chunk_size must be at least 1")]
    InvalidChunkSize,
    #[error("invalid direct identifier pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
    #[error("column '{0}' is a direct identifier and cannot be used for privacy grouping")]
    DirectIdentifier(String),
    #[error("column '{0}' is listed as both quasi-identifier and sensitive attribute")]
    OverlappingColumn(String),
}

impl From<PrivacyConfigError> for VitalCertError {
    fn from(error: PrivacyConfigError) -> Self {
        VitalCertError::configuration(error.to_string())
    }
}

/// Privacy risk assessment configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrivacyConfig {
    /// Columns an attacker could link with outside knowledge
    pub quasi_identifiers: Vec<String>,
    /// Columns whose values must not be inferable within a class
    pub sensitive_attributes: Vec<String>,
    /// Minimum acceptable equivalence class size
    pub k_threshold: usize,
    /// Minimum acceptable distinct sensitive values per class
    pub l_threshold: usize,
    /// Maximum acceptable attack advantage over baseline
    pub reid_risk_threshold: f64,
    /// Total epsilon available to the budget ledger
    pub total_epsilon_budget: f64,
    /// Delta reported alongside epsilon
    pub delta: f64,
    /// Records ingested per partitioning step
    pub chunk_size: usize,
    /// Regular expressions matching direct identifier column names
    pub direct_identifier_patterns: Vec<String>,
}

impl Default for PrivacyConfig {
    fn default() -> Self {
        Self {
            quasi_identifiers: vec![ARM_COLUMN.to_string(), VISIT_COLUMN.to_string()],
            sensitive_attributes: Vec::new(),
            k_threshold: 5,
            l_threshold: 2,
            reid_risk_threshold: 0.1,
            total_epsilon_budget: 1.0,
            delta: 1e-5,
            chunk_size: 10_000,
            direct_identifier_patterns: DEFAULT_DIRECT_IDENTIFIER_PATTERNS
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }
}

impl PrivacyConfig {
    /// Creates a new privacy config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the quasi-identifier columns.
    pub fn with_quasi_identifiers<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.quasi_identifiers = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Builder method to set the sensitive attribute columns.
    pub fn with_sensitive_attributes<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sensitive_attributes = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Builder method to set the k-anonymity threshold.
    pub fn with_k_threshold(mut self, k: usize) -> Self {
        self.k_threshold = k;
        self
    }

    /// Builder method to set the l-diversity threshold.
    pub fn with_l_threshold(mut self, l: usize) -> Self {
        self.l_threshold = l;
        self
    }

    /// Builder method to set the re-identification risk threshold.
    ///
    /// Values are clamped to `[0.0, 1.0]`.
    pub fn with_reid_risk_threshold(mut self, threshold: f64) -> Self {
        if !(0.0..=1.0).contains(&threshold) {
            tracing::warn!(
                "reid_risk_threshold {} clamped to [0.0, 1.0]",
                threshold
            );
        }
        self.reid_risk_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Builder method to set the total epsilon budget.
    pub fn with_total_epsilon_budget(mut self, epsilon: f64) -> Self {
        self.total_epsilon_budget = epsilon;
        self
    }

    /// Builder method to set the reported delta.
    pub fn with_delta(mut self, delta: f64) -> Self {
        self.delta = delta;
        self
    }

    /// Builder method to set the ingestion chunk size.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        if chunk_size == 0 {
            tracing::warn!("chunk_size 0 raised to 1");
        }
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Builder method to add a direct identifier pattern.
    pub fn with_direct_identifier_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.direct_identifier_patterns.push(pattern.into());
        self
    }

    /// Compiles the direct identifier patterns.
    pub fn compiled_identifier_patterns(&self) -> Result<Vec<Regex>, PrivacyConfigError> {
        self.direct_identifier_patterns
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| PrivacyConfigError::InvalidPattern {
                    pattern: pattern.clone(),
                    message: e.to_string(),
                })
            })
            .collect()
    }

    /// Returns true if the column name matches a direct identifier pattern.
    pub fn is_direct_identifier(&self, column: &str) -> Result<bool, PrivacyConfigError> {
        Ok(self
            .compiled_identifier_patterns()?
            .iter()
            .any(|re| re.is_match(column)))
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), PrivacyConfigError> {
        if self.quasi_identifiers.is_empty() {
            return Err(PrivacyConfigError::NoQuasiIdentifiers);
        }
        if self.k_threshold == 0 {
            return Err(PrivacyConfigError::InvalidKThreshold(self.k_threshold));
        }
        if self.l_threshold == 0 {
            return Err(PrivacyConfigError::InvalidLThreshold(self.l_threshold));
        }
        if !(self.reid_risk_threshold > 0.0 && self.reid_risk_threshold <= 1.0) {
            return Err(PrivacyConfigError::InvalidRiskThreshold(
                self.reid_risk_threshold,
            ));
        }
        if !(self.total_epsilon_budget.is_finite() && self.total_epsilon_budget > 0.0) {
            return Err(PrivacyConfigError::InvalidEpsilonBudget(
                self.total_epsilon_budget,
            ));
        }
        if !(0.0..1.0).contains(&self.delta) {
            return Err(PrivacyConfigError::InvalidDelta(self.delta));
        }
        if self.chunk_size == 0 {
            return Err(PrivacyConfigError::InvalidChunkSize);
        }

        let patterns = self.compiled_identifier_patterns()?;
        for column in self
            .quasi_identifiers
            .iter()
            .chain(self.sensitive_attributes.iter())
        {
            if patterns.iter().any(|re| re.is_match(column)) {
                return Err(PrivacyConfigError::DirectIdentifier(column.clone()));
            }
        }

        if let Some(column) = self
            .sensitive_attributes
            .iter()
            .find(|c| self.quasi_identifiers.contains(c))
        {
            return Err(PrivacyConfigError::OverlappingColumn(column.clone()));
        }

        Ok(())
    }
}
