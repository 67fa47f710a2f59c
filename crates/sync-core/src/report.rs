//! Per-table and per-run outcomes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Counters collected while reconciling one table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableStats {
    /// Source pages read, including the terminating empty page.
    pub pages: usize,
    pub created: usize,
    pub updated: usize,
    /// Rows matching an existing record with identical content (only with skip-unchanged).
    pub unchanged: usize,
    /// Rows skipped because every column was null.
    pub skipped_empty: usize,
    /// Rows folded into another row of the same run with the same identity key.
    pub folded: usize,
}

impl TableStats {
    /// Rows that resulted in a destination write.
    pub fn written(&self) -> usize {
        self.created + self.updated
    }
}

/// Outcome of syncing one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncResult {
    pub table_name: String,
    pub success: bool,
    #[serde(default)]
    pub stats: TableStats,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SyncResult {
    pub fn succeeded(table_name: impl Into<String>, stats: TableStats) -> Self {
        Self {
            table_name: table_name.into(),
            success: true,
            stats,
            error: None,
        }
    }

    pub fn failed(table_name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            success: false,
            stats: TableStats::default(),
            error: Some(error.into()),
        }
    }
}

/// Results of a whole run, in the order tables were processed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncReport {
    pub results: Vec<SyncResult>,
}

impl SyncReport {
    pub fn push(&mut self, result: SyncResult) {
        self.results.push(result);
    }

    /// Table name to success flag.
    pub fn as_map(&self) -> BTreeMap<String, bool> {
        self.results
            .iter()
            .map(|r| (r.table_name.clone(), r.success))
            .collect()
    }

    pub fn get(&self, table_name: &str) -> Option<&SyncResult> {
        self.results.iter().find(|r| r.table_name == table_name)
    }

    pub fn success_count(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    pub fn all_succeeded(&self) -> bool {
        self.results.iter().all(|r| r.success)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
