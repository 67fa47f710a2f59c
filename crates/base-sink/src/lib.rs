//! Destination sink trait abstraction.
//!
//! This crate defines the `BaseSink` trait: everything the sync engine needs
//! from the remote tabular store (list tables, create a table, page through
//! records, batch-create, batch-update). `base-client` implements it over
//! HTTP; the reconcile crate ships an in-memory implementation for tests.
//!
//! Requests are plain structs (`TableSpec`, `PageRequest`, `RecordUpdate`)
//! that serialize directly into the wire format.

mod error;
mod payload;
mod traits;

pub use error::SinkError;
pub use payload::{
    ExistingRecord, FieldDefinition, FieldProperty, PageRequest, RecordPage, RecordUpdate,
    SelectOption, TableSpec,
};
pub use traits::{BaseSink, MAX_BATCH_SIZE, MAX_PAGE_SIZE};
