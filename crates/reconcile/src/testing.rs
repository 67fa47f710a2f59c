//! In-memory collaborators for tests.
//!
//! Both are cheap handles over shared state: clone one, give the clone to
//! the engine, and inspect the original afterwards.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use base_sink::{
    BaseSink, ExistingRecord, PageRequest, RecordPage, RecordUpdate, SinkError, TableSpec,
    MAX_BATCH_SIZE, MAX_PAGE_SIZE,
};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use sync_core::{ColumnSchema, Fields, SourceRow, TableSource};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ── Source ──────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct MemoryTable {
    name: String,
    columns: Vec<ColumnSchema>,
    primary_key: Option<String>,
    rows: Vec<SourceRow>,
}

/// One `fetch_rows` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchCall {
    pub table: String,
    pub order_by: Option<String>,
    pub limit: usize,
    pub offset: usize,
}

#[derive(Debug, Default)]
struct SourceState {
    tables: Vec<MemoryTable>,
    fetches: Vec<FetchCall>,
    unreachable: bool,
    failing_tables: HashSet<String>,
}

/// A source serving rows from memory, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    state: Arc<Mutex<SourceState>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table; its primary key is the first column marked as key.
    pub fn with_table(self, name: &str, columns: Vec<ColumnSchema>, rows: Vec<SourceRow>) -> Self {
        let primary_key = columns.iter().find(|c| c.is_key).map(|c| c.name.clone());
        lock(&self.state).tables.push(MemoryTable {
            name: name.to_string(),
            columns,
            primary_key,
            rows,
        });
        self
    }

    /// Replace a table's rows.
    pub fn set_rows(&self, table: &str, rows: Vec<SourceRow>) {
        if let Some(t) = lock(&self.state).tables.iter_mut().find(|t| t.name == table) {
            t.rows = rows;
        }
    }

    /// Make `list_tables` fail.
    pub fn make_unreachable(&self) {
        lock(&self.state).unreachable = true;
    }

    /// Make every read of `table` after the first page fail.
    pub fn fail_after_first_page(&self, table: &str) {
        lock(&self.state).failing_tables.insert(table.to_string());
    }

    pub fn fetches(&self) -> Vec<FetchCall> {
        lock(&self.state).fetches.clone()
    }

    pub fn fetches_for(&self, table: &str) -> Vec<FetchCall> {
        self.fetches()
            .into_iter()
            .filter(|f| f.table == table)
            .collect()
    }

    fn table(&self, name: &str) -> Result<MemoryTable> {
        lock(&self.state)
            .tables
            .iter()
            .find(|t| t.name == name)
            .cloned()
            .ok_or_else(|| anyhow!("Table '{name}' doesn't exist"))
    }
}

#[async_trait]
impl TableSource for MemorySource {
    fn source_type(&self) -> &'static str {
        "memory"
    }

    async fn list_tables(&mut self) -> Result<Vec<String>> {
        let state = lock(&self.state);
        if state.unreachable {
            return Err(anyhow!("Connection refused"));
        }
        Ok(state.tables.iter().map(|t| t.name.clone()).collect())
    }

    async fn describe_table(&mut self, table: &str) -> Result<Vec<ColumnSchema>> {
        Ok(self.table(table)?.columns)
    }

    async fn primary_key(&mut self, table: &str) -> Result<Option<String>> {
        Ok(self.table(table)?.primary_key)
    }

    async fn fetch_rows(
        &mut self,
        table: &str,
        order_by: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<SourceRow>> {
        let data = self.table(table)?;
        let mut state = lock(&self.state);
        state.fetches.push(FetchCall {
            table: table.to_string(),
            order_by: order_by.map(str::to_string),
            limit,
            offset,
        });
        if offset > 0 && state.failing_tables.contains(table) {
            return Err(anyhow!("Lost connection to source during query"));
        }
        Ok(data.rows.into_iter().skip(offset).take(limit).collect())
    }
}

// ── Sink ────────────────────────────────────────────────────────

/// Destination operations, for call logs and failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SinkOp {
    ListTables,
    CreateTable,
    ListRecords,
    BatchCreate,
    BatchUpdate,
}

impl fmt::Display for SinkOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SinkOp::ListTables => "list_tables",
            SinkOp::CreateTable => "create_table",
            SinkOp::ListRecords => "list_records",
            SinkOp::BatchCreate => "batch_create",
            SinkOp::BatchUpdate => "batch_update",
        };
        f.write_str(name)
    }
}

/// One call made against a [`MemorySink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkCall {
    pub op: SinkOp,
    /// Table name, when the call targets a table.
    pub table: Option<String>,
    /// Records sent, or page size requested.
    pub size: usize,
    pub page_token: Option<String>,
}

#[derive(Debug, Clone)]
struct StoredTable {
    table_id: String,
    name: String,
    spec: Option<TableSpec>,
    records: Vec<ExistingRecord>,
}

#[derive(Debug)]
struct SinkState {
    tables: Vec<StoredTable>,
    next_table: usize,
    next_record: usize,
    calls: Vec<SinkCall>,
    failures: HashSet<(SinkOp, String)>,
    unreachable: bool,
    max_batch_size: usize,
}

impl Default for SinkState {
    fn default() -> Self {
        Self {
            tables: Vec::new(),
            next_table: 0,
            next_record: 0,
            calls: Vec::new(),
            failures: HashSet::new(),
            unreachable: false,
            max_batch_size: MAX_BATCH_SIZE,
        }
    }
}

impl SinkState {
    fn add_table(&mut self, name: &str, spec: Option<TableSpec>) -> String {
        self.next_table += 1;
        let table_id = format!("tbl{}", self.next_table);
        self.tables.push(StoredTable {
            table_id: table_id.clone(),
            name: name.to_string(),
            spec,
            records: Vec::new(),
        });
        table_id
    }

    fn add_record(&mut self, table_index: usize, fields: Fields) -> String {
        self.next_record += 1;
        let record_id = format!("rec{}", self.next_record);
        self.tables[table_index].records.push(ExistingRecord {
            record_id: record_id.clone(),
            fields,
        });
        record_id
    }

    fn position_by_id(&self, table_id: &str) -> Result<usize, SinkError> {
        self.tables
            .iter()
            .position(|t| t.table_id == table_id)
            .ok_or_else(|| SinkError::Api {
                code: 1254041,
                message: "TableIdNotFound".to_string(),
            })
    }

    fn position_by_name(&self, name: &str) -> Option<usize> {
        self.tables.iter().position(|t| t.name == name)
    }

    /// Log the call, then fail it if a failure was injected.
    fn record_call(
        &mut self,
        op: SinkOp,
        table: Option<String>,
        size: usize,
        page_token: Option<String>,
    ) -> Result<(), SinkError> {
        let fail = self.unreachable
            || table
                .as_ref()
                .is_some_and(|t| self.failures.contains(&(op, t.clone())));
        self.calls.push(SinkCall {
            op,
            table,
            size,
            page_token,
        });
        if fail {
            return Err(SinkError::Api {
                code: 1254000,
                message: format!("injected {op} failure"),
            });
        }
        Ok(())
    }
}

/// A destination keeping tables and records in memory.
///
/// Table ids are `tbl1, tbl2, ...` and record ids `rec1, rec2, ...`.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    state: Arc<Mutex<SinkState>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject batches larger than `size`.
    pub fn with_max_batch_size(self, size: usize) -> Self {
        lock(&self.state).max_batch_size = size;
        self
    }

    /// Add an existing table without logging a call; returns its id.
    pub fn seed_table(&self, name: &str) -> String {
        lock(&self.state).add_table(name, None)
    }

    /// Add an existing record without logging a call; returns its id.
    ///
    /// Panics if the table was not seeded first.
    pub fn seed_record(&self, table: &str, fields: Fields) -> String {
        let mut state = lock(&self.state);
        let Some(position) = state.position_by_name(table) else {
            panic!("seed_record: unknown table '{table}'");
        };
        state.add_record(position, fields)
    }

    /// Fail every `op` call targeting the named table.
    pub fn fail_on(&self, op: SinkOp, table: &str) {
        lock(&self.state).failures.insert((op, table.to_string()));
    }

    /// Fail every call.
    pub fn make_unreachable(&self) {
        lock(&self.state).unreachable = true;
    }

    pub fn calls(&self) -> Vec<SinkCall> {
        lock(&self.state).calls.clone()
    }

    pub fn count_calls(&self, op: SinkOp) -> usize {
        lock(&self.state)
            .calls
            .iter()
            .filter(|c| c.op == op)
            .count()
    }

    pub fn clear_calls(&self) {
        lock(&self.state).calls.clear();
    }

    pub fn table_id(&self, name: &str) -> Option<String> {
        let state = lock(&self.state);
        state
            .position_by_name(name)
            .map(|p| state.tables[p].table_id.clone())
    }

    /// The create-table request a table was created from.
    pub fn table_spec(&self, name: &str) -> Option<TableSpec> {
        let state = lock(&self.state);
        state
            .position_by_name(name)
            .and_then(|p| state.tables[p].spec.clone())
    }

    pub fn records(&self, name: &str) -> Vec<ExistingRecord> {
        let state = lock(&self.state);
        state
            .position_by_name(name)
            .map(|p| state.tables[p].records.clone())
            .unwrap_or_default()
    }

    pub fn record_count(&self, name: &str) -> usize {
        self.records(name).len()
    }

    fn name_of(state: &SinkState, table_id: &str) -> Option<String> {
        state
            .tables
            .iter()
            .find(|t| t.table_id == table_id)
            .map(|t| t.name.clone())
    }

    fn check_batch(state: &SinkState, len: usize) -> Result<(), SinkError> {
        if len > state.max_batch_size {
            return Err(SinkError::Api {
                code: 1254104,
                message: format!(
                    "RecordExceedLimit: {len} records exceeds {}",
                    state.max_batch_size
                ),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl BaseSink for MemorySink {
    async fn list_tables(&self) -> Result<HashMap<String, String>, SinkError> {
        let mut state = lock(&self.state);
        state.record_call(SinkOp::ListTables, None, 0, None)?;
        Ok(state
            .tables
            .iter()
            .map(|t| (t.name.clone(), t.table_id.clone()))
            .collect())
    }

    async fn create_table(&self, spec: &TableSpec) -> Result<String, SinkError> {
        let mut state = lock(&self.state);
        state.record_call(
            SinkOp::CreateTable,
            Some(spec.name.clone()),
            spec.fields.len(),
            None,
        )?;
        if state.position_by_name(&spec.name).is_some() {
            return Err(SinkError::Api {
                code: 1254013,
                message: "TableNameDuplicated".to_string(),
            });
        }
        Ok(state.add_table(&spec.name, Some(spec.clone())))
    }

    async fn list_records(
        &self,
        table_id: &str,
        request: &PageRequest,
    ) -> Result<RecordPage, SinkError> {
        let mut state = lock(&self.state);
        let name = Self::name_of(&state, table_id);
        state.record_call(
            SinkOp::ListRecords,
            name,
            request.page_size,
            request.page_token.clone(),
        )?;
        let position = state.position_by_id(table_id)?;

        let start = match &request.page_token {
            Some(token) => token.parse::<usize>().map_err(|_| SinkError::Api {
                code: 1254002,
                message: "InvalidPageToken".to_string(),
            })?,
            None => 0,
        };
        let records = &state.tables[position].records;
        let end = (start + request.page_size.min(MAX_PAGE_SIZE)).min(records.len());
        let has_more = end < records.len();

        Ok(RecordPage {
            items: records.get(start..end).unwrap_or_default().to_vec(),
            has_more,
            page_token: has_more.then(|| end.to_string()),
        })
    }

    async fn batch_create(
        &self,
        table_id: &str,
        records: &[Fields],
    ) -> Result<Vec<String>, SinkError> {
        let mut state = lock(&self.state);
        let name = Self::name_of(&state, table_id);
        state.record_call(SinkOp::BatchCreate, name, records.len(), None)?;
        Self::check_batch(&state, records.len())?;
        let position = state.position_by_id(table_id)?;

        Ok(records
            .iter()
            .map(|fields| state.add_record(position, fields.clone()))
            .collect())
    }

    async fn batch_update(
        &self,
        table_id: &str,
        records: &[RecordUpdate],
    ) -> Result<(), SinkError> {
        let mut state = lock(&self.state);
        let name = Self::name_of(&state, table_id);
        state.record_call(SinkOp::BatchUpdate, name, records.len(), None)?;
        Self::check_batch(&state, records.len())?;
        let position = state.position_by_id(table_id)?;

        let stored = &mut state.tables[position].records;
        for update in records {
            let record = stored
                .iter_mut()
                .find(|r| r.record_id == update.record_id)
                .ok_or_else(|| SinkError::Api {
                    code: 1254043,
                    message: "RecordIdNotFound".to_string(),
                })?;
            record.fields.extend(update.fields.clone());
        }
        Ok(())
    }

    fn max_batch_size(&self) -> usize {
        lock(&self.state).max_batch_size
    }
}
