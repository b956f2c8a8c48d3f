//! Equivalence class partitioning over quasi-identifiers.
//!
//! Records are folded into the index chunk by chunk; the index owns all
//! partial state, so an assessment abandoned between chunks leaves nothing
//! behind.

use std::collections::{BTreeSet, HashMap};

use serde_json::Value;

use crate::models::{RecordSet, value_to_key};

/// Records sharing the same projected quasi-identifier values.
#[derive(Debug, Clone, PartialEq)]
pub struct EquivalenceClass {
    /// Projected quasi-identifier values
    pub key: Vec<String>,
    /// Number of records in the class
    pub size: usize,
    /// Distinct non-null values per sensitive attribute, in attribute order
    pub sensitive_values: Vec<BTreeSet<String>>,
}

impl EquivalenceClass {
    /// Distinct value count for the sensitive attribute at `index`.
    pub fn distinct_count(&self, index: usize) -> usize {
        self.sensitive_values.get(index).map_or(0, BTreeSet::len)
    }
}

/// Incremental equivalence class index.
#[derive(Debug, Clone)]
pub struct EquivalenceClassIndex {
    quasi_identifiers: Vec<String>,
    sensitive_attributes: Vec<String>,
    classes: HashMap<Vec<String>, EquivalenceClass>,
    records_seen: usize,
}

impl EquivalenceClassIndex {
    /// Creates an empty index.
    pub fn new(quasi_identifiers: Vec<String>, sensitive_attributes: Vec<String>) -> Self {
        Self {
            quasi_identifiers,
            sensitive_attributes,
            classes: HashMap::new(),
            records_seen: 0,
        }
    }

    /// Folds a chunk of record rows into the index.
    ///
    /// Null or missing sensitive cells do not count as a distinct value.
    pub fn ingest(&mut self, rows: &[Value]) {
        let attribute_count = self.sensitive_attributes.len();
        for row in rows {
            let key = RecordSet::project_row(row, &self.quasi_identifiers);
            let class = self
                .classes
                .entry(key)
                .or_insert_with_key(|key| EquivalenceClass {
                    key: key.clone(),
                    size: 0,
                    sensitive_values: vec![BTreeSet::new(); attribute_count],
                });
            class.size += 1;

            for (slot, attribute) in self.sensitive_attributes.iter().enumerate() {
                let cell = row.as_object().and_then(|obj| obj.get(attribute));
                if let Some(value) = cell.filter(|v| !v.is_null()) {
                    class.sensitive_values[slot].insert(value_to_key(value));
                }
            }
        }
        self.records_seen += rows.len();
    }

    /// Number of records ingested so far.
    pub fn records_seen(&self) -> usize {
        self.records_seen
    }

    /// Number of classes discovered so far.
    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    /// Sensitive attributes tracked by the index.
    pub fn sensitive_attributes(&self) -> &[String] {
        &self.sensitive_attributes
    }

    /// Consumes the index, returning classes ordered by key.
    pub fn finish(self) -> Vec<EquivalenceClass> {
        let mut classes: Vec<EquivalenceClass> = self.classes.into_values().collect();
        classes.sort_by(|a, b| a.key.cmp(&b.key));
        tracing::debug!(
            records = self.records_seen,
            classes = classes.len(),
            "Equivalence class partitioning completed"
        );
        classes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn index() -> EquivalenceClassIndex {
        EquivalenceClassIndex::new(
            vec!["arm".to_string(), "visit".to_string()],
            vec!["diagnosis".to_string()],
        )
    }

    #[test]
    fn test_partitions_by_projection() {
        let mut index = index();
        index.ingest(&[
            json!({"arm": "A", "visit": "baseline", "diagnosis": "htn"}),
            json!({"arm": "A", "visit": "baseline", "diagnosis": "dm"}),
            json!({"arm": "B", "visit": "baseline", "diagnosis": "htn"}),
        ]);

        assert_eq!(index.records_seen(), 3);
        let classes = index.finish();
        assert_eq!(classes.len(), 2);
        assert_eq!(classes[0].key, vec!["\"A\"", "\"baseline\""]);
        assert_eq!(classes[0].size, 2);
        assert_eq!(classes[0].distinct_count(0), 2);
        assert_eq!(classes[1].size, 1);
    }

    #[test]
    fn test_chunked_ingest_matches_single_pass() {
        let rows: Vec<Value> = (0..10)
            .map(|i| {
                let arm = if i % 2 == 0 { "A" } else { "B" };
                json!({"arm": arm, "visit": "w1", "diagnosis": i % 3})
            })
            .collect();

        let mut single = index();
        single.ingest(&rows);

        let mut chunked = index();
        for chunk in rows.chunks(3) {
            chunked.ingest(chunk);
        }

        assert_eq!(single.finish(), chunked.finish());
    }

    #[test]
    fn test_numeric_and_text_cells_form_separate_classes() {
        let mut index = index();
        index.ingest(&[
            json!({"arm": 1, "visit": "w1", "diagnosis": 3}),
            json!({"arm": "1", "visit": "w1", "diagnosis": "3"}),
        ]);

        let classes = index.finish();
        assert_eq!(classes.len(), 2);
        assert!(classes.iter().all(|c| c.size == 1));
    }

    #[test]
    fn test_missing_cells_and_malformed_rows() {
        let mut index = index();
        index.ingest(&[
            json!({"arm": "A", "diagnosis": null}),
            json!({"arm": "A"}),
            json!("not a record"),
        ]);

        let classes = index.finish();
        // rows missing visit share the null marker; the string row projects to all nulls
        assert_eq!(classes.len(), 2);
        assert!(classes.iter().all(|c| c.distinct_count(0) == 0));
        assert_eq!(classes.iter().map(|c| c.size).sum::<usize>(), 3);
    }
}
