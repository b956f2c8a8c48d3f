//! JSON Schema validation for clinical dataset documents.
//!
//! This module validates dataset documents handed over by the surrounding
//! service before they reach the engines, and checks produced reports for
//! subject identifier leakage before they are released.
//!
//! # Security Guarantees
//! - Reports are rejected if any string equals a real subject identifier
//! - Violation messages name the JSON path only, never the leaked value
//! - Validates format version compatibility
//!
//! # Example
//! ```rust
//! use vitalcert_core::validation::validate_dataset_document;
//! use serde_json::json;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let document = json!({
//!     "format_version": "1.0",
//!     "name": "trial-042-real",
//!     "records": [{"subject_id": "S-001", "visit": "baseline", "arm": "A", "heart_rate": 72}]
//! });
//!
//! validate_dataset_document(&document)?;
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeSet;
use std::sync::OnceLock;

use jsonschema::Validator;
use serde_json::Value;
use thiserror::Error;

use crate::models::RecordSet;

/// JSON Schema validation errors with detailed field-level reporting
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Schema compilation failed during initialization
    #[error("JSON Schema compilation failed: {message}")]
    SchemaCompilation { message: String },

    /// Validation failed with specific field errors
    #[error("Schema validation failed with {error_count} errors: {errors:?}")]
    ValidationFailed {
        error_count: usize,
        errors: Vec<String>,
    },

    /// Unsupported format version detected
    #[error("Unsupported format version '{version}'. Supported versions: {supported:?}")]
    UnsupportedVersion {
        version: String,
        supported: Vec<String>,
    },

    /// A produced report would disclose a real subject identifier
    #[error("Disclosure check failed: {reason}")]
    DisclosureViolation { reason: String },

    /// JSON parsing error
    #[error("JSON parsing failed: {source}")]
    JsonParsing {
        #[from]
        source: serde_json::Error,
    },
}

/// Supported format versions for backward compatibility
const SUPPORTED_VERSIONS: &[&str] = &["1.0"];

/// Name given to datasets supplied as a bare array of records
pub const UNNAMED_DATASET: &str = "dataset";

/// Embedded JSON Schema for v1.0 dataset documents
const DATASET_SCHEMA_V1_0: &str = r#"{
  "$schema": "https://json-schema.org/draft/2020-12/schema",
  "title": "VitalCert Clinical Vitals Dataset Format v1.0",
  "type": "object",
  "required": ["format_version", "name", "records"],
  "properties": {
    "format_version": {
      "type": "string",
      "pattern": "^1\\.0$"
    },
    "name": { "type": "string", "minLength": 1 },
    "study_id": { "type": "string" },
    "generated_at": { "type": "string", "format": "date-time" },
    "records": {
      "type": "array",
      "items": {
        "type": "object",
        "properties": {
          "subject_id": { "type": ["string", "integer"] },
          "visit": { "type": "string" },
          "arm": { "type": "string" }
        },
        "additionalProperties": {
          "type": ["number", "string", "boolean", "null"]
        }
      }
    }
  }
}"#;

/// Compiled JSON Schema instance (initialized once)
static COMPILED_SCHEMA: OnceLock<Validator> = OnceLock::new();

/// Initialize and compile the dataset JSON Schema
///
/// The compiled schema is cached for reuse; calling this more than once
/// is harmless.
///
/// # Errors
/// Returns `ValidationError::SchemaCompilation` if the embedded schema is invalid.
pub fn initialize_dataset_validator() -> Result<(), ValidationError> {
    if COMPILED_SCHEMA.get().is_some() {
        return Ok(());
    }

    let schema_json = get_dataset_schema_definition()?;
    let compiled = jsonschema::validator_for(&schema_json).map_err(|e| {
        ValidationError::SchemaCompilation {
            message: format!("Schema compilation error: {}", e),
        }
    })?;

    // Another thread may have won the race; either instance is equivalent
    let _ = COMPILED_SCHEMA.set(compiled);

    Ok(())
}

fn compiled_validator() -> Result<&'static Validator, ValidationError> {
    initialize_dataset_validator()?;
    COMPILED_SCHEMA
        .get()
        .ok_or_else(|| ValidationError::SchemaCompilation {
            message: "Dataset schema validator unavailable".to_string(),
        })
}

/// Validate a dataset document against the JSON Schema
///
/// # Errors
/// Returns detailed validation errors if the document has an unsupported
/// version or does not conform to the schema.
pub fn validate_dataset_document(json_value: &Value) -> Result<(), ValidationError> {
    let schema = compiled_validator()?;

    // Check format version compatibility first
    validate_format_version(json_value)?;

    let errors: Vec<String> = schema
        .iter_errors(json_value)
        .map(|error| error.to_string())
        .collect();
    if !errors.is_empty() {
        return Err(ValidationError::ValidationFailed {
            error_count: errors.len(),
            errors,
        });
    }

    Ok(())
}

/// Validate format version compatibility
fn validate_format_version(json_value: &Value) -> Result<(), ValidationError> {
    let version = json_value
        .get("format_version")
        .and_then(|v| v.as_str())
        .ok_or_else(|| ValidationError::ValidationFailed {
            error_count: 1,
            errors: vec!["Missing required field 'format_version'".to_string()],
        })?;

    if !SUPPORTED_VERSIONS.contains(&version) {
        return Err(ValidationError::UnsupportedVersion {
            version: version.to_string(),
            supported: SUPPORTED_VERSIONS.iter().map(|s| s.to_string()).collect(),
        });
    }

    Ok(())
}

/// Validate and load a dataset from JSON
///
/// Accepts either a full dataset document or a bare array of record
/// objects; a bare array is validated as the `records` of an unnamed
/// document.
///
/// # Errors
/// Returns validation errors for malformed JSON or schema violations.
///
/// # Example
/// ```rust
/// use vitalcert_core::validation::validate_and_parse_dataset;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let records = validate_and_parse_dataset(r#"[{"arm": "A", "heart_rate": 70}]"#)?;
/// assert_eq!(records.len(), 1);
/// # Ok(())
/// # }
/// ```
pub fn validate_and_parse_dataset(json_str: &str) -> Result<RecordSet, ValidationError> {
    let json_value: Value = serde_json::from_str(json_str)?;

    let document = match json_value {
        Value::Array(records) => serde_json::json!({
            "format_version": SUPPORTED_VERSIONS[0],
            "name": UNNAMED_DATASET,
            "records": records,
        }),
        other => other,
    };

    validate_dataset_document(&document)?;

    let name = document
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or(UNNAMED_DATASET)
        .to_string();
    let rows = match document.get("records") {
        Some(Value::Array(rows)) => rows.clone(),
        _ => Vec::new(),
    };

    Ok(RecordSet::new(name, rows))
}

/// Get the embedded dataset JSON Schema as a parsed Value
pub fn get_dataset_schema_definition() -> Result<Value, ValidationError> {
    serde_json::from_str(DATASET_SCHEMA_V1_0).map_err(|e| ValidationError::SchemaCompilation {
        message: format!("Failed to parse embedded schema: {}", e),
    })
}

/// Ensure a produced report does not contain any real subject identifier
///
/// Every string value and object key is compared against `identifiers`.
///
/// # Errors
/// Returns `ValidationError::DisclosureViolation` naming the JSON path of
/// the first match.
pub fn ensure_no_identifier_leakage(
    report: &Value,
    identifiers: &BTreeSet<String>,
) -> Result<(), ValidationError> {
    if identifiers.is_empty() {
        return Ok(());
    }
    check_identifiers_recursive(report, identifiers, "$")
}

fn check_identifiers_recursive(
    value: &Value,
    identifiers: &BTreeSet<String>,
    path: &str,
) -> Result<(), ValidationError> {
    match value {
        Value::String(s) => {
            if identifiers.contains(s) {
                return Err(ValidationError::DisclosureViolation {
                    reason: format!("subject identifier found at path '{}'", path),
                });
            }
        }
        Value::Object(obj) => {
            for (key, val) in obj {
                let new_path = format!("{}.{}", path, key);
                if identifiers.contains(key) {
                    return Err(ValidationError::DisclosureViolation {
                        reason: format!("subject identifier used as field name at path '{}'", new_path),
                    });
                }
                check_identifiers_recursive(val, identifiers, &new_path)?;
            }
        }
        Value::Array(arr) => {
            for (index, item) in arr.iter().enumerate() {
                let new_path = format!("{}[{}]", path, index);
                check_identifiers_recursive(item, identifiers, &new_path)?;
            }
        }
        _ => {} // Numbers, booleans, null cannot match
    }

    Ok(())
}

#[cfg(test)]
mod tests;
