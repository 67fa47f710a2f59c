//! BaseSink trait definition.

use crate::error::SinkError;
use crate::payload::{PageRequest, RecordPage, RecordUpdate, TableSpec};
use async_trait::async_trait;
use std::collections::HashMap;
use sync_core::Fields;

/// Largest number of records the destination accepts in one batch call.
pub const MAX_BATCH_SIZE: usize = 500;

/// Largest page the destination returns when listing records.
pub const MAX_PAGE_SIZE: usize = 500;

/// Trait for writing to the remote tabular store.
///
/// One implementation is bound to one app (a set of tables). Calls are
/// never issued concurrently, but implementations must still be `Sync`
/// so engines can hold them behind a shared reference.
///
/// # Usage Pattern
///
/// The engine is generic over the sink for static dispatch:
///
/// ```ignore
/// pub async fn build_index<S: BaseSink>(sink: &S, table_id: &str) -> Result<...> {
///     let page = sink.list_records(table_id, &PageRequest::first(500)).await?;
///     ...
/// }
/// ```
#[async_trait]
pub trait BaseSink: Send + Sync {
    /// Existing tables, name to table identifier.
    async fn list_tables(&self) -> Result<HashMap<String, String>, SinkError>;

    /// Create a table and return its identifier.
    async fn create_table(&self, spec: &TableSpec) -> Result<String, SinkError>;

    /// One page of a table's records.
    async fn list_records(
        &self,
        table_id: &str,
        request: &PageRequest,
    ) -> Result<RecordPage, SinkError>;

    /// Create records, returning their identifiers in input order.
    ///
    /// `records.len()` must not exceed [`max_batch_size`](Self::max_batch_size).
    async fn batch_create(&self, table_id: &str, records: &[Fields])
        -> Result<Vec<String>, SinkError>;

    /// Overwrite the given fields of existing records.
    async fn batch_update(&self, table_id: &str, records: &[RecordUpdate])
        -> Result<(), SinkError>;

    /// Per-call record cap for batch writes.
    fn max_batch_size(&self) -> usize {
        MAX_BATCH_SIZE
    }
}
