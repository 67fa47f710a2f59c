//! Per-table reconciliation.
//!
//! For each table: describe the source columns, ensure the destination
//! table, index the records already there, then walk the source page by
//! page. Every row is converted, keyed and classified as a create or an
//! update of an indexed record, and each page is flushed before the next
//! one is read.

use crate::batch::BatchWriter;
use crate::error::SyncError;
use crate::index::{build_index, ExistingRecordIndex, IndexEntry};
use crate::pacing::pause;
use crate::schema_sync::SchemaSynchronizer;
use crate::SyncOpts;
use base_sink::{BaseSink, RecordUpdate};
use mysql_types::{mappings_for, FieldMapping};
use std::collections::HashMap;
use sync_core::{
    Fields, IdentityKey, SourceRow, SyncReport, SyncResult, TableSource, TableStats,
};
use tracing::{error, info, info_span, warn, Instrument};

/// Convert a source row, dropping null columns.
pub fn convert_row(row: &SourceRow, mappings: &[FieldMapping]) -> Fields {
    mappings
        .iter()
        .filter_map(|mapping| {
            let value = row.get(&mapping.column_name)?;
            mapping
                .convert(value)
                .map(|converted| (mapping.column_name.clone(), converted))
        })
        .collect()
}

struct PendingCreate {
    key: IdentityKey,
    fields: Fields,
}

struct PendingUpdate {
    key: IdentityKey,
    update: RecordUpdate,
}

/// Writes queued for one source page.
///
/// Rows sharing a key within the page are folded, the last one winning,
/// so a page never creates the same key twice.
#[derive(Default)]
struct PagePlan {
    creates: Vec<PendingCreate>,
    updates: Vec<PendingUpdate>,
    create_slots: HashMap<IdentityKey, usize>,
    update_slots: HashMap<String, usize>,
}

impl PagePlan {
    /// Queue a create without folding, as a full sync writes every row.
    fn push_create(&mut self, fields: Fields, primary_key: Option<&str>) {
        let key = IdentityKey::compute(&fields, primary_key);
        self.creates.push(PendingCreate { key, fields });
    }

    fn classify(
        &mut self,
        fields: Fields,
        primary_key: Option<&str>,
        index: &ExistingRecordIndex,
        skip_unchanged: bool,
        stats: &mut TableStats,
    ) {
        let key = IdentityKey::compute(&fields, primary_key);

        let Some(entry) = index.get(&key) else {
            match self.create_slots.get(&key) {
                Some(&slot) => {
                    self.creates[slot].fields = fields;
                    stats.folded += 1;
                }
                None => {
                    self.create_slots.insert(key.clone(), self.creates.len());
                    self.creates.push(PendingCreate { key, fields });
                }
            }
            return;
        };

        if let Some(&slot) = self.update_slots.get(&entry.record_id) {
            self.updates[slot].update.fields = fields;
            stats.folded += 1;
            return;
        }

        if skip_unchanged && entry.content_hash == IdentityKey::content_hash(&fields) {
            stats.unchanged += 1;
            return;
        }

        self.update_slots
            .insert(entry.record_id.clone(), self.updates.len());
        self.updates.push(PendingUpdate {
            key,
            update: RecordUpdate {
                record_id: entry.record_id.clone(),
                fields,
            },
        });
    }
}

/// Reconciles source tables into the destination, one table at a time.
pub struct ReconciliationEngine<S, K> {
    source: S,
    sink: K,
    opts: SyncOpts,
    schema: SchemaSynchronizer,
}

impl<S: TableSource, K: BaseSink> ReconciliationEngine<S, K> {
    pub fn new(source: S, sink: K, opts: SyncOpts) -> Self {
        Self {
            source,
            sink,
            opts,
            schema: SchemaSynchronizer::new(),
        }
    }

    pub fn opts(&self) -> &SyncOpts {
        &self.opts
    }

    /// Hand back the collaborators, e.g. to close the source connection.
    pub fn into_parts(self) -> (S, K) {
        (self.source, self.sink)
    }

    /// Check both sides are reachable and return the tables to sync.
    async fn preflight(&mut self) -> Result<Vec<String>, SyncError> {
        let tables = self.source.list_tables().await.map_err(|e| {
            SyncError::Connection(format!(
                "cannot reach {} source: {e:#}",
                self.source.source_type()
            ))
        })?;

        let directory = self
            .sink
            .list_tables()
            .await
            .map_err(|e| SyncError::Connection(format!("cannot reach destination: {e}")))?;
        info!("Destination has {} tables", directory.len());
        self.schema = SchemaSynchronizer::with_directory(directory);

        let Some(wanted) = &self.opts.tables else {
            return Ok(tables);
        };
        for name in wanted {
            if !tables.contains(name) {
                warn!("Requested table '{}' does not exist in the source", name);
            }
        }
        Ok(tables
            .into_iter()
            .filter(|t| wanted.contains(t))
            .collect())
    }

    /// Sync every source table.
    ///
    /// Fails only when a collaborator cannot be reached before the first
    /// table; table failures are recorded in the report.
    pub async fn run(&mut self) -> Result<SyncReport, SyncError> {
        let tables = self.preflight().await?;
        info!("Syncing {} tables", tables.len());

        let mut report = SyncReport::default();
        for table in &tables {
            let result = self.sync_table(table).await;
            report.push(result);
        }

        info!(
            "Sync finished: {}/{} tables succeeded",
            report.success_count(),
            report.len()
        );
        Ok(report)
    }

    /// Sync one table; true when every page was written.
    pub async fn sync(&mut self, table: &str) -> bool {
        self.sync_table(table).await.success
    }

    /// Sync one table and record its outcome.
    pub async fn sync_table(&mut self, table: &str) -> SyncResult {
        let span = info_span!("sync_table", table = %table);
        match self.try_sync_table(table).instrument(span.clone()).await {
            Ok(stats) => {
                span.in_scope(|| {
                    info!(
                        "Table '{}' synced: {} rows written ({} created, {} updated, {} unchanged)",
                        table,
                        stats.written(),
                        stats.created,
                        stats.updated,
                        stats.unchanged
                    )
                });
                SyncResult::succeeded(table, stats)
            }
            Err(e) => {
                span.in_scope(|| error!("Table '{}' failed: {}", table, e));
                SyncResult::failed(table, e.to_string())
            }
        }
    }

    async fn try_sync_table(&mut self, table: &str) -> Result<TableStats, SyncError> {
        let columns = self
            .source
            .describe_table(table)
            .await
            .map_err(|e| SyncError::source(table, e))?;

        let handle = self
            .schema
            .ensure_table(&self.sink, table, &columns, self.opts.dry_run)
            .await?;

        let primary_key = self
            .source
            .primary_key(table)
            .await
            .map_err(|e| SyncError::source(table, e))?;
        match &primary_key {
            Some(pk) => info!("Primary key of '{}': {}", table, pk),
            None => info!("'{}' has no primary key, keying rows by content", table),
        }

        let mut index = match (&handle.table_id, self.opts.incremental) {
            (Some(table_id), true) => {
                build_index(
                    &self.sink,
                    table,
                    table_id,
                    primary_key.as_deref(),
                    self.opts.pacing.index_page_delay,
                )
                .await?
            }
            _ => ExistingRecordIndex::new(),
        };
        info!("{} existing records indexed for '{}'", index.len(), table);

        let mappings = mappings_for(&columns);
        let writer = BatchWriter::new(&self.sink, self.opts.pacing.batch_delay, self.opts.dry_run);
        let page_size = self.opts.page_size.max(1);
        let mut stats = TableStats::default();
        let mut offset = 0usize;

        loop {
            let rows = self
                .source
                .fetch_rows(table, primary_key.as_deref(), page_size, offset)
                .await
                .map_err(|e| SyncError::source(table, e))?;
            stats.pages += 1;

            if rows.is_empty() {
                break;
            }

            let mut plan = PagePlan::default();
            for row in &rows {
                let fields = convert_row(row, &mappings);
                if fields.is_empty() {
                    stats.skipped_empty += 1;
                    continue;
                }
                if !self.opts.incremental {
                    plan.push_create(fields, primary_key.as_deref());
                    continue;
                }
                plan.classify(
                    fields,
                    primary_key.as_deref(),
                    &index,
                    self.opts.skip_unchanged,
                    &mut stats,
                );
            }

            let (create_keys, create_fields): (Vec<IdentityKey>, Vec<Fields>) = plan
                .creates
                .into_iter()
                .map(|c| (c.key, c.fields))
                .unzip();
            let record_ids = writer.flush_creates(&handle, &create_fields).await?;
            stats.created += record_ids.len();
            if self.opts.incremental {
                for ((key, fields), record_id) in
                    create_keys.into_iter().zip(&create_fields).zip(record_ids)
                {
                    index.insert(key, IndexEntry::new(record_id, fields));
                }
            }

            let (update_keys, updates): (Vec<IdentityKey>, Vec<RecordUpdate>) = plan
                .updates
                .into_iter()
                .map(|u| (u.key, u.update))
                .unzip();
            stats.updated += writer.flush_updates(&handle, &updates).await?;
            if self.opts.incremental {
                for (key, update) in update_keys.into_iter().zip(&updates) {
                    index.insert(key, IndexEntry::new(update.record_id.clone(), &update.fields));
                }
            }

            info!(
                "'{}' offset {}: {} rows read, {} created, {} updated so far",
                table,
                offset,
                rows.len(),
                stats.created,
                stats.updated
            );

            offset += page_size;
            pause(self.opts.pacing.source_page_delay).await;
        }

        Ok(stats)
    }
}
