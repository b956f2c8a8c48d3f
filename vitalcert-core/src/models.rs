//! Input data model for certification requests.
//!
//! The surrounding service hands records over as JSON objects. A
//! [`RecordSet`] keeps them in that form so that malformed rows and
//! non-numeric cells degrade gracefully instead of rejecting the whole
//! request; [`ClinicalRecord`] is the typed shape produced by the
//! generation step and converts into a row losslessly.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Result, VitalCertError};

/// Column holding the subject identifier.
pub const SUBJECT_ID_COLUMN: &str = "subject_id";
/// Column holding the visit label.
pub const VISIT_COLUMN: &str = "visit";
/// Column holding the treatment arm label.
pub const ARM_COLUMN: &str = "arm";

/// Key of a missing or null cell; no string cell can encode to it.
pub(crate) const NULL_MARKER: &str = "null";

/// One vitals observation for a subject at a visit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicalRecord {
    /// Subject identifier
    pub subject_id: String,
    /// Visit label (e.g. "baseline", "week_4")
    pub visit: String,
    /// Treatment arm label
    pub arm: String,
    /// Numeric vital fields (e.g. "systolic_bp", "heart_rate")
    #[serde(flatten)]
    pub vitals: BTreeMap<String, f64>,
}

impl ClinicalRecord {
    /// Creates a record without vitals.
    pub fn new(
        subject_id: impl Into<String>,
        visit: impl Into<String>,
        arm: impl Into<String>,
    ) -> Self {
        Self {
            subject_id: subject_id.into(),
            visit: visit.into(),
            arm: arm.into(),
            vitals: BTreeMap::new(),
        }
    }

    /// Builder method to add a vital measurement.
    pub fn with_vital(mut self, name: impl Into<String>, value: f64) -> Self {
        self.vitals.insert(name.into(), value);
        self
    }
}

/// A named collection of record rows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordSet {
    /// Dataset label used in logs and reports ("real", "synthetic", ...)
    pub name: String,
    /// Record rows as JSON objects
    pub rows: Vec<Value>,
}

impl RecordSet {
    /// Creates a record set from raw rows.
    pub fn new(name: impl Into<String>, rows: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    /// Creates a record set from typed clinical records.
    pub fn from_records(name: impl Into<String>, records: &[ClinicalRecord]) -> Result<Self> {
        let name = name.into();
        let rows = records
            .iter()
            .map(serde_json::to_value)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| {
                VitalCertError::serialization(format!("converting records of '{}'", name), e)
            })?;
        Ok(Self { name, rows })
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the set holds no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Union of field names across all object rows, sorted.
    ///
    /// Non-object rows contribute nothing.
    pub fn column_names(&self) -> Vec<String> {
        let names: BTreeSet<&String> = self
            .rows
            .iter()
            .filter_map(Value::as_object)
            .flat_map(|obj| obj.keys())
            .collect();
        names.into_iter().cloned().collect()
    }

    /// Returns true if at least one row carries the column.
    pub fn has_column(&self, column: &str) -> bool {
        self.rows
            .iter()
            .filter_map(Value::as_object)
            .any(|obj| obj.contains_key(column))
    }

    /// Finite numeric values of a column, in row order.
    ///
    /// Missing cells, nulls, non-numeric strings and non-finite numbers
    /// are skipped.
    pub fn numeric_column(&self, column: &str) -> Vec<f64> {
        self.rows
            .iter()
            .filter_map(|row| row.as_object().and_then(|obj| obj.get(column)))
            .filter_map(extract_numeric)
            .collect()
    }

    /// Per-row numeric values of a column, `None` where a row has no
    /// usable number. Keeps row alignment for paired statistics.
    pub fn numeric_column_aligned(&self, column: &str) -> Vec<Option<f64>> {
        self.rows
            .iter()
            .map(|row| {
                row.as_object()
                    .and_then(|obj| obj.get(column))
                    .and_then(extract_numeric)
            })
            .collect()
    }

    /// Columns whose present, non-null cells are all numeric.
    ///
    /// The subject identifier column is never reported, even when the
    /// generator emitted numeric ids.
    pub fn numeric_column_names(&self) -> Vec<String> {
        self.column_names()
            .into_iter()
            .filter(|name| name != SUBJECT_ID_COLUMN)
            .filter(|name| self.is_numeric_column(name))
            .collect()
    }

    fn is_numeric_column(&self, column: &str) -> bool {
        let mut numeric = 0usize;
        for cell in self
            .rows
            .iter()
            .filter_map(|row| row.as_object().and_then(|obj| obj.get(column)))
        {
            match cell {
                Value::Null => {}
                Value::Number(_) => numeric += 1,
                _ => return false,
            }
        }
        numeric > 0
    }

    /// Projects a row onto the given columns as comparable strings.
    ///
    /// Missing cells and non-object rows project to a shared null marker
    /// so that they form their own equivalence class.
    pub fn project_row(row: &Value, columns: &[String]) -> Vec<String> {
        columns
            .iter()
            .map(|column| {
                row.as_object()
                    .and_then(|obj| obj.get(column))
                    .map_or_else(|| NULL_MARKER.to_string(), value_to_key)
            })
            .collect()
    }

    /// Distinct values of the subject identifier column, as they would
    /// appear in report text.
    pub fn subject_ids(&self) -> BTreeSet<String> {
        self.rows
            .iter()
            .filter_map(|row| row.as_object().and_then(|obj| obj.get(SUBJECT_ID_COLUMN)))
            .filter_map(|v| match v {
                Value::Null => None,
                Value::String(s) => Some(s.clone()),
                other => Some(other.to_string()),
            })
            .collect()
    }
}

/// Extracts a finite numeric value from a JSON cell.
///
/// Numeric strings are accepted; "NaN"/"inf" style strings are rejected so
/// they cannot poison aggregates.
pub fn extract_numeric(value: &Value) -> Option<f64> {
    let numeric = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match numeric {
        Some(v) if v.is_finite() => Some(v),
        _ => None,
    }
}

/// Converts a JSON cell to a comparable key.
///
/// Keys are the cell's compact JSON encoding, so `54` and `"54"` (or
/// `null` and `"null"`) never share a key.
pub fn value_to_key(value: &Value) -> String {
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_set() -> RecordSet {
        RecordSet::new(
            "real",
            vec![
                json!({"subject_id": "S-001", "visit": "baseline", "arm": "A", "heart_rate": 72, "note": "ok"}),
                json!({"subject_id": "S-002", "visit": "baseline", "arm": "B", "heart_rate": "80"}),
                json!({"subject_id": "S-003", "visit": "week_4", "arm": "A", "heart_rate": null, "temperature": 36.8}),
                json!([1, 2, 3]),
            ],
        )
    }

    #[test]
    fn test_clinical_record_flattens_vitals() {
        let record = ClinicalRecord::new("S-001", "baseline", "placebo")
            .with_vital("systolic_bp", 121.0)
            .with_vital("heart_rate", 70.0);

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["subject_id"], "S-001");
        assert_eq!(value["systolic_bp"], 121.0);

        let back: ClinicalRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_from_records() {
        let records = vec![
            ClinicalRecord::new("S-1", "baseline", "A").with_vital("heart_rate", 60.0),
            ClinicalRecord::new("S-2", "baseline", "B").with_vital("heart_rate", 75.0),
        ];
        let set = RecordSet::from_records("synthetic", &records).unwrap();

        assert_eq!(set.len(), 2);
        assert_eq!(set.numeric_column("heart_rate"), vec![60.0, 75.0]);
    }

    #[test]
    fn test_column_names_union() {
        let names = sample_set().column_names();
        assert_eq!(
            names,
            vec!["arm", "heart_rate", "note", "subject_id", "temperature", "visit"]
        );
    }

    #[test]
    fn test_numeric_column_skips_malformed() {
        let set = sample_set();
        assert_eq!(set.numeric_column("heart_rate"), vec![72.0, 80.0]);
        assert_eq!(
            set.numeric_column_aligned("heart_rate"),
            vec![Some(72.0), Some(80.0), None, None]
        );
    }

    #[test]
    fn test_numeric_column_names() {
        // heart_rate has a numeric string cell, so it is not a clean numeric column
        let names = sample_set().numeric_column_names();
        assert_eq!(names, vec!["temperature"]);

        let set = RecordSet::new(
            "ids",
            vec![json!({"subject_id": 1, "hr": 60}), json!({"subject_id": 2, "hr": 61})],
        );
        assert_eq!(set.numeric_column_names(), vec!["hr"]);
    }

    #[test]
    fn test_project_row() {
        let row = json!({"visit": "baseline", "arm": "A", "age": 54});
        let columns = vec!["arm".to_string(), "age".to_string(), "site".to_string()];

        assert_eq!(
            RecordSet::project_row(&row, &columns),
            vec!["\"A\"", "54", NULL_MARKER]
        );
        assert_eq!(
            RecordSet::project_row(&json!(42), &columns),
            vec![NULL_MARKER, NULL_MARKER, NULL_MARKER]
        );
    }

    #[test]
    fn test_keys_keep_cell_types_apart() {
        let columns = vec!["age".to_string()];
        let number = RecordSet::project_row(&json!({"age": 54}), &columns);
        let string = RecordSet::project_row(&json!({"age": "54"}), &columns);
        assert_ne!(number, string);

        let missing = RecordSet::project_row(&json!({}), &columns);
        let explicit_null = RecordSet::project_row(&json!({"age": null}), &columns);
        let null_text = RecordSet::project_row(&json!({"age": "null"}), &columns);
        let old_marker = RecordSet::project_row(&json!({"age": "__NULL__"}), &columns);
        assert_eq!(missing, explicit_null);
        assert_ne!(missing, null_text);
        assert_ne!(missing, old_marker);

        assert_ne!(value_to_key(&json!(true)), value_to_key(&json!("true")));
    }

    #[test]
    fn test_extract_numeric() {
        assert_eq!(extract_numeric(&json!(1.5)), Some(1.5));
        assert_eq!(extract_numeric(&json!(" 2 ")), Some(2.0));
        assert_eq!(extract_numeric(&json!("NaN")), None);
        assert_eq!(extract_numeric(&json!("inf")), None);
        assert_eq!(extract_numeric(&json!(true)), None);
        assert_eq!(extract_numeric(&json!(null)), None);
    }

    #[test]
    fn test_subject_ids() {
        let ids = sample_set().subject_ids();
        assert_eq!(ids.len(), 3);
        assert!(ids.contains("S-002"));
    }
}
