//! Reporting run results.

use anyhow::Context;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use sync_core::SyncReport;

/// The `table -> success` map as compact JSON.
pub fn results_json(report: &SyncReport) -> anyhow::Result<String> {
    serde_json::to_string(&report.as_map()).context("Failed to serialize sync results")
}

/// Human-readable summary, one line per table.
pub fn summary(report: &SyncReport) -> String {
    let mut out = String::new();
    for result in &report.results {
        let status = if result.success { "ok" } else { "FAILED" };
        out.push_str(&format!(
            "{:<32} {:<6} created={} updated={} unchanged={}",
            result.table_name,
            status,
            result.stats.created,
            result.stats.updated,
            result.stats.unchanged
        ));
        if let Some(error) = &result.error {
            out.push_str(&format!("  ({error})"));
        }
        out.push('\n');
    }
    out.push_str(&format!(
        "{}/{} tables synced successfully\n",
        report.success_count(),
        report.len()
    ));
    out
}

/// Append `sync_results=<json>` to a GitHub Actions output file.
pub fn write_github_output(path: &Path, report: &SyncReport) -> anyhow::Result<()> {
    let json = results_json(report)?;
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    writeln!(file, "sync_results={json}")
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sync_core::{SyncResult, TableStats};

    fn report() -> SyncReport {
        let mut report = SyncReport::default();
        report.push(SyncResult::succeeded(
            "users",
            TableStats {
                created: 2,
                ..TableStats::default()
            },
        ));
        report.push(SyncResult::failed("orders", "batch create failed"));
        report
    }

    #[test]
    fn test_results_json_is_sorted_map() {
        assert_eq!(
            results_json(&report()).unwrap(),
            r#"{"orders":false,"users":true}"#
        );
    }

    #[test]
    fn test_summary_lists_every_table() {
        let text = summary(&report());
        assert!(text.contains("users"));
        assert!(text.contains("FAILED"));
        assert!(text.contains("(batch create failed)"));
        assert!(text.ends_with("1/2 tables synced successfully\n"));
    }

    #[test]
    fn test_github_output_is_appended() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output");
        std::fs::write(&path, "previous=1\n").unwrap();

        write_github_output(&path, &report()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "previous=1\nsync_results={\"orders\":false,\"users\":true}\n"
        );
    }
}
