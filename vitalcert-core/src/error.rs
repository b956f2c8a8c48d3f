//! Error types for certification operations.
//!
//! Errors never carry record values or subject identifiers. Contexts name
//! columns, datasets and query ids only, so an error surfaced to the
//! dashboard cannot itself become a disclosure channel.

use thiserror::Error;

/// Main error type for vitalcert operations.
#[derive(Debug, Error)]
pub enum VitalCertError {
    /// Input data could not be interpreted at all
    #[error("Invalid input: {context}")]
    InvalidInput { context: String },

    /// Configuration or request parameters are invalid
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// The differential-privacy budget cannot cover the requested query
    #[error(
        "Privacy budget exceeded: query '{query_id}' requested epsilon={requested:.4}, remaining epsilon={remaining:.4}"
    )]
    BudgetExceeded {
        query_id: String,
        requested: f64,
        remaining: f64,
    },

    /// A background analysis task failed to complete
    #[error("Analysis task failed: {context}")]
    Worker { context: String },

    /// Dataset document or report failed validation
    #[error("Validation failed: {context}")]
    Validation {
        context: String,
        #[source]
        source: crate::validation::ValidationError,
    },

    /// I/O operation failed
    #[error("I/O operation failed: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Serialization or deserialization failed
    #[error("Serialization failed: {context}")]
    Serialization {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Convenience type alias for Results with VitalCertError
pub type Result<T> = std::result::Result<T, VitalCertError>;

impl VitalCertError {
    /// Creates a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates an invalid input error
    pub fn invalid_input(context: impl Into<String>) -> Self {
        Self::InvalidInput {
            context: context.into(),
        }
    }

    /// Creates a budget exceeded error
    pub fn budget_exceeded(query_id: impl Into<String>, requested: f64, remaining: f64) -> Self {
        Self::BudgetExceeded {
            query_id: query_id.into(),
            requested,
            remaining,
        }
    }

    /// Creates a worker failure error
    pub fn worker(context: impl Into<String>) -> Self {
        Self::Worker {
            context: context.into(),
        }
    }

    /// Creates a serialization error with context
    pub fn serialization(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Serialization {
            context: context.into(),
            source,
        }
    }

    /// Creates a validation error with context
    pub fn validation(
        context: impl Into<String>,
        source: crate::validation::ValidationError,
    ) -> Self {
        Self::Validation {
            context: context.into(),
            source,
        }
    }

    /// Returns true if retrying the same operation cannot succeed until an
    /// explicit ledger reset.
    pub fn is_budget_exhaustion(&self) -> bool {
        matches!(self, Self::BudgetExceeded { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let error = VitalCertError::configuration("bin_count must be at least 1");
        assert!(error.to_string().contains("bin_count must be at least 1"));

        let error = VitalCertError::invalid_input("dataset 'real' is not an array");
        assert!(error.to_string().contains("dataset 'real'"));
    }

    #[test]
    fn test_budget_exceeded_message() {
        let error = VitalCertError::budget_exceeded("q-11", 0.1, 0.0);
        let message = error.to_string();

        assert!(message.contains("q-11"));
        assert!(message.contains("0.1000"));
        assert!(error.is_budget_exhaustion());
        assert!(!VitalCertError::configuration("x").is_budget_exhaustion());
    }

    #[test]
    fn test_serialization_error_keeps_source() {
        let source = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let error = VitalCertError::serialization("parsing config", source);

        assert!(error.to_string().contains("parsing config"));
        assert!(std::error::Error::source(&error).is_some());
    }
}
