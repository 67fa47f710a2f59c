//! Chunked batch writes.

use crate::error::{SyncError, WriteOp};
use crate::pacing::pause;
use crate::schema_sync::TableHandle;
use base_sink::{BaseSink, RecordUpdate, MAX_BATCH_SIZE};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use sync_core::Fields;
use tracing::{debug, info};

/// Writes pending creates and updates in chunks the destination accepts.
///
/// A rejected chunk stops the flush. Chunks already written stay written
/// and nothing is retried.
pub struct BatchWriter<'a, K: BaseSink + ?Sized> {
    sink: &'a K,
    batch_size: usize,
    delay: Duration,
    dry_run: bool,
    planned: AtomicUsize,
}

impl<'a, K: BaseSink + ?Sized> BatchWriter<'a, K> {
    pub fn new(sink: &'a K, delay: Duration, dry_run: bool) -> Self {
        let batch_size = sink.max_batch_size().clamp(1, MAX_BATCH_SIZE);
        Self {
            sink,
            batch_size,
            delay,
            dry_run,
            planned: AtomicUsize::new(0),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn table_id<'h>(&self, table: &'h TableHandle, operation: WriteOp) -> Result<&'h str, SyncError> {
        table.table_id.as_deref().ok_or_else(|| SyncError::BatchWrite {
            table: table.name.clone(),
            operation,
            message: "destination table has no identifier".to_string(),
        })
    }

    /// Create `records`, returning the new record identifiers in input order.
    ///
    /// A dry run sends nothing and hands out placeholder identifiers.
    pub async fn flush_creates(
        &self,
        table: &TableHandle,
        records: &[Fields],
    ) -> Result<Vec<String>, SyncError> {
        if records.is_empty() {
            return Ok(Vec::new());
        }

        if self.dry_run {
            info!(
                "Dry run: would create {} records in '{}'",
                records.len(),
                table.name
            );
            return Ok(records
                .iter()
                .map(|_| format!("dry-run-{}", self.planned.fetch_add(1, Ordering::Relaxed) + 1))
                .collect());
        }

        let table_id = self.table_id(table, WriteOp::Create)?;
        let mut record_ids = Vec::with_capacity(records.len());

        for chunk in records.chunks(self.batch_size) {
            let ids = self
                .sink
                .batch_create(table_id, chunk)
                .await
                .map_err(|e| SyncError::BatchWrite {
                    table: table.name.clone(),
                    operation: WriteOp::Create,
                    message: e.message(),
                })?;
            debug!("Created {} records in '{}'", ids.len(), table.name);
            record_ids.extend(ids);
            pause(self.delay).await;
        }

        Ok(record_ids)
    }

    /// Update existing records; returns how many were written.
    pub async fn flush_updates(
        &self,
        table: &TableHandle,
        updates: &[RecordUpdate],
    ) -> Result<usize, SyncError> {
        if updates.is_empty() {
            return Ok(0);
        }

        if self.dry_run {
            info!(
                "Dry run: would update {} records in '{}'",
                updates.len(),
                table.name
            );
            return Ok(updates.len());
        }

        let table_id = self.table_id(table, WriteOp::Update)?;

        for chunk in updates.chunks(self.batch_size) {
            self.sink
                .batch_update(table_id, chunk)
                .await
                .map_err(|e| SyncError::BatchWrite {
                    table: table.name.clone(),
                    operation: WriteOp::Update,
                    message: e.message(),
                })?;
            debug!("Updated {} records in '{}'", chunk.len(), table.name);
            pause(self.delay).await;
        }

        Ok(updates.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemorySink, SinkOp};
    use sync_core::FieldValue;

    fn rows(n: i64) -> Vec<Fields> {
        (0..n)
            .map(|i| Fields::from([("id".to_string(), FieldValue::Integer(i))]))
            .collect()
    }

    fn handle(sink: &MemorySink, name: &str) -> TableHandle {
        TableHandle {
            name: name.to_string(),
            table_id: Some(sink.seed_table(name)),
            created: false,
        }
    }

    #[tokio::test]
    async fn test_creates_are_chunked_at_500() {
        let sink = MemorySink::new();
        let table = handle(&sink, "users");
        let writer = BatchWriter::new(&sink, Duration::ZERO, false);

        let ids = writer.flush_creates(&table, &rows(1201)).await.unwrap();
        assert_eq!(ids.len(), 1201);

        let sizes: Vec<usize> = sink
            .calls()
            .into_iter()
            .filter(|c| c.op == SinkOp::BatchCreate)
            .map(|c| c.size)
            .collect();
        assert_eq!(sizes, vec![500, 500, 201]);
        assert_eq!(sink.record_count("users"), 1201);
    }

    #[tokio::test]
    async fn test_smaller_sink_cap_is_respected() {
        let sink = MemorySink::new().with_max_batch_size(100);
        let table = handle(&sink, "users");
        let writer = BatchWriter::new(&sink, Duration::ZERO, false);
        assert_eq!(writer.batch_size(), 100);

        let ids = writer.flush_creates(&table, &rows(250)).await.unwrap();
        let updates: Vec<RecordUpdate> = ids
            .into_iter()
            .map(|record_id| RecordUpdate {
                record_id,
                fields: Fields::from([("name".to_string(), FieldValue::from("x"))]),
            })
            .collect();
        assert_eq!(writer.flush_updates(&table, &updates).await.unwrap(), 250);

        assert!(sink.calls().iter().all(|c| c.size <= 100));
        assert_eq!(sink.count_calls(SinkOp::BatchUpdate), 3);
    }

    #[tokio::test]
    async fn test_rejected_chunk_stops_flush() {
        let sink = MemorySink::new();
        let table = handle(&sink, "users");
        sink.fail_on(SinkOp::BatchCreate, "users");
        let writer = BatchWriter::new(&sink, Duration::ZERO, false);

        let err = writer.flush_creates(&table, &rows(600)).await.unwrap_err();
        match err {
            SyncError::BatchWrite {
                table,
                operation,
                message,
            } => {
                assert_eq!(table, "users");
                assert_eq!(operation, WriteOp::Create);
                assert_eq!(message, "injected batch_create failure");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(sink.count_calls(SinkOp::BatchCreate), 1);
    }

    #[tokio::test]
    async fn test_dry_run_writes_nothing() {
        let sink = MemorySink::new();
        let table = TableHandle {
            name: "users".into(),
            table_id: None,
            created: false,
        };
        let writer = BatchWriter::new(&sink, Duration::ZERO, true);

        let ids = writer.flush_creates(&table, &rows(3)).await.unwrap();
        assert_eq!(ids, vec!["dry-run-1", "dry-run-2", "dry-run-3"]);
        assert!(sink.calls().is_empty());
    }

    #[tokio::test]
    async fn test_empty_input_makes_no_calls() {
        let sink = MemorySink::new();
        let table = handle(&sink, "users");
        let writer = BatchWriter::new(&sink, Duration::ZERO, false);

        assert!(writer.flush_creates(&table, &[]).await.unwrap().is_empty());
        assert_eq!(writer.flush_updates(&table, &[]).await.unwrap(), 0);
        assert!(sink.calls().is_empty());
    }
}
