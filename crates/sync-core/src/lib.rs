//! Core types for the base-sync framework.
//!
//! This crate provides the foundational types shared by every other crate
//! in the workspace:
//!
//! - [`FieldKind`] - The seven field kinds a destination table can hold
//! - [`ColumnSchema`] - A source column as reported by schema introspection
//! - [`SourceValue`] / [`SourceRow`] - Values as read from the source database
//! - [`FieldValue`] / [`Fields`] - Values after conversion, ready for the destination
//! - [`IdentityKey`] - The create-vs-update deduplication key for a row
//! - [`SyncResult`] / [`SyncReport`] - Per-table and per-run outcomes
//! - [`TableSource`] - The read-only source collaborator
//!
//! # Architecture
//!
//! ```text
//! sync-core (this crate)
//!    │
//!    ├─── mysql-types     (raw MySQL type → FieldKind, SourceValue → FieldValue)
//!    ├─── mysql-source    (implements TableSource over mysql_async)
//!    ├─── base-sink       (destination trait, speaks Fields)
//!    └─── reconcile       (keys rows with IdentityKey, drives the sync)
//! ```
//!
//! # Example
//!
//! ```rust
//! use sync_core::{FieldValue, Fields, IdentityKey};
//!
//! let mut fields = Fields::new();
//! fields.insert("id".to_string(), FieldValue::Integer(7));
//! fields.insert("name".to_string(), FieldValue::Text("Ada".to_string()));
//!
//! let key = IdentityKey::compute(&fields, Some("id"));
//! assert_eq!(key.as_str(), "7");
//! ```

pub mod key;
pub mod report;
pub mod schema;
pub mod source;
pub mod types;
pub mod values;

// Re-exports for convenience
pub use key::IdentityKey;
pub use report::{SyncReport, SyncResult, TableStats};
pub use schema::ColumnSchema;
pub use source::TableSource;
pub use types::FieldKind;
pub use values::{FieldValue, Fields, SourceRow, SourceValue};
