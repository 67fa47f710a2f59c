//! Source column schema.

use serde::{Deserialize, Serialize};

/// One column of a source table, as reported by schema introspection.
///
/// Produced once per table at the start of its sync and not changed
/// for the rest of the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    /// Full column type as the source reports it, e.g. `varchar(255)`.
    pub raw_type: String,
    pub nullable: bool,
    /// Part of the primary key.
    pub is_key: bool,
}

impl ColumnSchema {
    pub fn new(name: impl Into<String>, raw_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            raw_type: raw_type.into(),
            nullable: true,
            is_key: false,
        }
    }

    /// Mark the column as a non-null primary key column.
    pub fn key(mut self) -> Self {
        self.is_key = true;
        self.nullable = false;
        self
    }
}
