//! Tests for dataset schema validation and identifier leakage checks.

use super::*;
use serde_json::json;

/// Setup function to ensure validator is initialized for all tests
fn setup() {
    let _ = initialize_dataset_validator();
}

fn identifiers(ids: &[&str]) -> BTreeSet<String> {
    ids.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_schema_initialization_success() {
    assert!(initialize_dataset_validator().is_ok());
    assert!(initialize_dataset_validator().is_ok());
}

#[test]
fn test_valid_dataset_document_passes() {
    setup();

    let document = json!({
        "format_version": "1.0",
        "name": "trial-042-real",
        "study_id": "TRIAL-042",
        "records": [
            {"subject_id": "S-001", "visit": "baseline", "arm": "placebo", "systolic_bp": 121.5, "heart_rate": 72},
            {"subject_id": "S-002", "visit": "week_4", "arm": "active", "systolic_bp": null, "heart_rate": 80}
        ]
    });

    assert!(validate_dataset_document(&document).is_ok());
}

#[test]
fn test_empty_records_pass() {
    setup();

    let document = json!({"format_version": "1.0", "name": "empty", "records": []});
    assert!(validate_dataset_document(&document).is_ok());
}

#[test]
fn test_missing_records_fails() {
    setup();

    let document = json!({"format_version": "1.0", "name": "no-records"});
    match validate_dataset_document(&document) {
        Err(ValidationError::ValidationFailed { error_count, .. }) => assert!(error_count >= 1),
        other => panic!("expected ValidationFailed, got {:?}", other),
    }
}

#[test]
fn test_nested_record_values_fail() {
    setup();

    let document = json!({
        "format_version": "1.0",
        "name": "nested",
        "records": [{"subject_id": "S-1", "vitals": {"heart_rate": 70}}]
    });
    assert!(matches!(
        validate_dataset_document(&document),
        Err(ValidationError::ValidationFailed { .. })
    ));
}

#[test]
fn test_non_object_record_fails() {
    setup();

    let document = json!({"format_version": "1.0", "name": "bad", "records": [42]});
    assert!(validate_dataset_document(&document).is_err());
}

#[test]
fn test_unsupported_version_fails() {
    setup();

    let document = json!({"format_version": "2.0", "name": "future", "records": []});
    match validate_dataset_document(&document) {
        Err(ValidationError::UnsupportedVersion { version, supported }) => {
            assert_eq!(version, "2.0");
            assert_eq!(supported, vec!["1.0"]);
        }
        other => panic!("expected UnsupportedVersion, got {:?}", other),
    }
}

#[test]
fn test_missing_version_fails() {
    setup();

    let document = json!({"name": "unversioned", "records": []});
    assert!(matches!(
        validate_dataset_document(&document),
        Err(ValidationError::ValidationFailed { .. })
    ));
}

#[test]
fn test_parse_full_document() {
    let json_str = r#"{
        "format_version": "1.0",
        "name": "trial-042-synthetic",
        "records": [
            {"visit": "baseline", "arm": "A", "heart_rate": 70},
            {"visit": "baseline", "arm": "B", "heart_rate": 75}
        ]
    }"#;

    let records = validate_and_parse_dataset(json_str).unwrap();
    assert_eq!(records.name, "trial-042-synthetic");
    assert_eq!(records.len(), 2);
    assert_eq!(records.numeric_column("heart_rate"), vec![70.0, 75.0]);
}

#[test]
fn test_parse_bare_array() {
    let records = validate_and_parse_dataset(r#"[{"arm": "A", "heart_rate": 70}]"#).unwrap();
    assert_eq!(records.name, UNNAMED_DATASET);
    assert_eq!(records.len(), 1);
}

#[test]
fn test_parse_bare_array_with_non_objects_fails() {
    assert!(validate_and_parse_dataset(r#"[{"arm": "A"}, "oops"]"#).is_err());
}

#[test]
fn test_parse_malformed_json() {
    assert!(matches!(
        validate_and_parse_dataset("{not json"),
        Err(ValidationError::JsonParsing { .. })
    ));
}

#[test]
fn test_schema_definition_is_available() {
    let schema = get_dataset_schema_definition().unwrap();
    assert_eq!(
        schema["required"],
        json!(["format_version", "name", "records"])
    );
}

#[test]
fn test_identifier_leakage_detected() {
    let report = json!({
        "quality_score": 0.93,
        "comparisons": {"heart_rate": {"note": "S-017"}}
    });

    match ensure_no_identifier_leakage(&report, &identifiers(&["S-001", "S-017"])) {
        Err(ValidationError::DisclosureViolation { reason }) => {
            assert!(reason.contains("$.comparisons.heart_rate.note"));
            assert!(!reason.contains("S-017"));
        }
        other => panic!("expected DisclosureViolation, got {:?}", other),
    }
}

#[test]
fn test_identifier_as_key_detected() {
    let report = json!({"profiles": {"S-001": {}}});
    assert!(matches!(
        ensure_no_identifier_leakage(&report, &identifiers(&["S-001"])),
        Err(ValidationError::DisclosureViolation { .. })
    ));
}

#[test]
fn test_identifier_inside_array_detected() {
    let report = json!({"rows": [1, 2, ["S-9"]]});
    match ensure_no_identifier_leakage(&report, &identifiers(&["S-9"])) {
        Err(ValidationError::DisclosureViolation { reason }) => {
            assert!(reason.contains("$.rows[2][0]"));
        }
        other => panic!("expected DisclosureViolation, got {:?}", other),
    }
}

#[test]
fn test_clean_report_passes() {
    let report = json!({
        "quality_score": 0.93,
        "columns": ["heart_rate", "systolic_bp"],
        "summary": "Quality score 93.0% (excellent)"
    });

    assert!(ensure_no_identifier_leakage(&report, &identifiers(&["S-001"])).is_ok());
    assert!(ensure_no_identifier_leakage(&report, &BTreeSet::new()).is_ok());
}

#[test]
fn test_substring_is_not_a_leak() {
    // Only exact identifier matches count; "S-1" inside "S-10 cohort" is fine
    let report = json!({"summary": "S-10 cohort"});
    assert!(ensure_no_identifier_leakage(&report, &identifiers(&["S-1"])).is_ok());
}
