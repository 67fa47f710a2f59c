//! Table reconciliation for base-sync
//!
//! Mirrors source tables into destination tables without duplicating
//! records across runs. Each row gets an identity key (its primary key
//! value, or a hash of its content); keys already present in the
//! destination become updates and everything else becomes a create.
//!
//! ```text
//! TableSource ──rows──▶ convert ──▶ key ──▶ classify ──▶ BatchWriter ──▶ BaseSink
//!                                            ▲
//!                       ExistingRecordIndex ─┘
//! ```

mod batch;
mod engine;
mod error;
mod index;
mod pacing;
mod schema_sync;
pub mod testing;

pub use batch::BatchWriter;
pub use engine::{convert_row, ReconciliationEngine};
pub use error::{SyncError, WriteOp};
pub use index::{build_index, ExistingRecordIndex, IndexEntry};
pub use pacing::Pacing;
pub use schema_sync::{
    build_table_spec, field_definition, SchemaSynchronizer, TableHandle, DEFAULT_VIEW_NAME,
};

/// Rows read from the source per page.
pub const DEFAULT_PAGE_SIZE: usize = 500;

/// Sync options (non-connection related)
#[derive(Clone, Debug, PartialEq)]
pub struct SyncOpts {
    /// Index existing records and update matches; when off every row is created
    pub incremental: bool,
    /// Classify rows but write nothing
    pub dry_run: bool,
    /// Skip rows whose content equals the matching destination record
    pub skip_unchanged: bool,
    /// Only sync these tables
    pub tables: Option<Vec<String>>,
    /// Source rows per page
    pub page_size: usize,
    pub pacing: Pacing,
}

impl Default for SyncOpts {
    fn default() -> Self {
        Self {
            incremental: true,
            dry_run: false,
            skip_unchanged: false,
            tables: None,
            page_size: DEFAULT_PAGE_SIZE,
            pacing: Pacing::default(),
        }
    }
}
