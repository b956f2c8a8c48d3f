//! File output operations for certification reports.
//!
//! Every report is checked for subject identifier leakage before it is
//! written to a file or stdout.

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use vitalcert_core::ensure_no_identifier_leakage;

/// Serializes a report, checks it for leakage and writes it out.
///
/// Writes to `output_path` when given, otherwise prints to stdout.
///
/// # Errors
///
/// Returns an error if serialization fails, the report contains a real
/// subject identifier, or the file cannot be written.
pub async fn write_report<T: Serialize>(
    report: &T,
    identifiers: &BTreeSet<String>,
    output_path: Option<&Path>,
) -> Result<()> {
    let json_data = render_report(report, identifiers)?;

    match output_path {
        Some(path) => {
            save_json(&json_data, path).await?;
            tracing::info!("Report saved to {}", path.display());
        }
        None => println!("{}", json_data),
    }
    Ok(())
}

/// Renders a report as pretty JSON after the leakage check.
///
/// # Errors
///
/// Returns an error if serialization fails or a subject identifier is found.
pub fn render_report<T: Serialize>(report: &T, identifiers: &BTreeSet<String>) -> Result<String> {
    let json_value = serde_json::to_value(report).context("Report serialization failed")?;

    ensure_no_identifier_leakage(&json_value, identifiers)
        .context("Report rejected by disclosure check")?;
    tracing::debug!("Output disclosure check passed");

    serde_json::to_string_pretty(&json_value).context("Report serialization failed")
}

/// Saves JSON data to file.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub async fn save_json(json_data: &str, output_path: &Path) -> Result<()> {
    tokio::fs::write(output_path, json_data)
        .await
        .with_context(|| format!("Failed to write to {}", output_path.display()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ids(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_render_clean_report() {
        let report = json!({"quality_score": 0.91, "columns": ["heart_rate"]});
        let rendered = render_report(&report, &ids(&["S-001"])).unwrap();
        assert!(rendered.contains("quality_score"));
    }

    #[test]
    fn test_render_rejects_leaking_report() {
        let report = json!({"note": "S-001"});
        let err = render_report(&report, &ids(&["S-001"])).unwrap_err();
        assert!(format!("{:#}", err).contains("disclosure"));
    }

    #[tokio::test]
    async fn test_write_report_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");

        write_report(&json!({"k": 5}), &BTreeSet::new(), Some(&path))
            .await
            .unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["k"], 5);
    }

    #[tokio::test]
    async fn test_leaking_report_is_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");

        let result = write_report(&json!({"id": "S-9"}), &ids(&["S-9"]), Some(&path)).await;
        assert!(result.is_err());
        assert!(!path.exists());
    }
}
