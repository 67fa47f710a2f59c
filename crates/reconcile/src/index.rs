//! Index of the records already in a destination table.

use crate::error::SyncError;
use crate::pacing::pause;
use base_sink::{BaseSink, PageRequest, MAX_PAGE_SIZE};
use std::collections::HashMap;
use std::time::Duration;
use sync_core::{Fields, IdentityKey};
use tracing::debug;

/// Where a key lives in the destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub record_id: String,
    /// Content hash of the record's fields, for unchanged detection.
    pub content_hash: IdentityKey,
}

impl IndexEntry {
    pub fn new(record_id: impl Into<String>, fields: &Fields) -> Self {
        Self {
            record_id: record_id.into(),
            content_hash: IdentityKey::content_hash(fields),
        }
    }
}

/// Identity key to destination record, for one table.
#[derive(Debug, Clone, Default)]
pub struct ExistingRecordIndex {
    entries: HashMap<IdentityKey, IndexEntry>,
}

impl ExistingRecordIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite; the later record wins on collision.
    pub fn insert(&mut self, key: IdentityKey, entry: IndexEntry) -> Option<IndexEntry> {
        self.entries.insert(key, entry)
    }

    pub fn get(&self, key: &IdentityKey) -> Option<&IndexEntry> {
        self.entries.get(key)
    }

    pub fn record_id(&self, key: &IdentityKey) -> Option<&str> {
        self.entries.get(key).map(|e| e.record_id.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Page through every record of `table_id` and key it.
///
/// Keys are derived exactly as for source rows. Any failed page fails the
/// whole build: a partial index would turn existing records into duplicates.
pub async fn build_index<K: BaseSink + ?Sized>(
    sink: &K,
    table: &str,
    table_id: &str,
    primary_key: Option<&str>,
    page_delay: Duration,
) -> Result<ExistingRecordIndex, SyncError> {
    let mut index = ExistingRecordIndex::new();
    let mut request = PageRequest::first(MAX_PAGE_SIZE);
    let mut pages = 0usize;
    let mut records = 0usize;

    loop {
        let page = sink
            .list_records(table_id, &request)
            .await
            .map_err(|e| SyncError::IndexBuild {
                table: table.to_string(),
                message: e.message(),
            })?;
        pages += 1;
        records += page.items.len();

        for record in page.items {
            let key = IdentityKey::compute(&record.fields, primary_key);
            let entry = IndexEntry::new(record.record_id, &record.fields);
            index.insert(key, entry);
        }

        if !page.has_more {
            break;
        }
        let token = page.page_token.ok_or_else(|| SyncError::IndexBuild {
            table: table.to_string(),
            message: "destination reported more records without a page token".to_string(),
        })?;
        request = PageRequest::after(MAX_PAGE_SIZE, token);

        pause(page_delay).await;
    }

    debug!(
        "Indexed {} existing records of '{}' ({} keys, {} pages)",
        records,
        table,
        index.len(),
        pages
    );
    Ok(index)
}
