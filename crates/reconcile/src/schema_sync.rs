//! Destination table creation.
//!
//! Existing tables are used as they are. A table that is missing is created
//! from the source columns; field drift between the two is never reconciled.

use crate::error::SyncError;
use base_sink::{BaseSink, FieldDefinition, FieldProperty, SelectOption, TableSpec};
use mysql_types::FieldMapping;
use std::collections::HashMap;
use sync_core::ColumnSchema;
use tracing::{debug, info};

/// View created along with every new table.
pub const DEFAULT_VIEW_NAME: &str = "Grid";

/// Number of placeholder options attached to select fields.
const PLACEHOLDER_OPTIONS: u8 = 3;

/// A destination table a source table is written into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableHandle {
    pub name: String,
    /// `None` only in dry runs, for a table that would have been created.
    pub table_id: Option<String>,
    /// Created during this run.
    pub created: bool,
}

/// Select fields get placeholder options since the value domain is unknown
/// before any data is transferred.
fn placeholder_options() -> FieldProperty {
    FieldProperty {
        options: (1..=PLACEHOLDER_OPTIONS)
            .map(|n| SelectOption {
                name: format!("Option {n}"),
                color: n,
            })
            .collect(),
    }
}

pub fn field_definition(column: &ColumnSchema) -> FieldDefinition {
    let mapping = FieldMapping::for_column(column);
    FieldDefinition {
        field_name: mapping.column_name,
        type_code: mapping.kind.type_code(),
        ui_type: mapping.kind.ui_type().map(str::to_string),
        property: mapping.kind.is_choice().then(placeholder_options),
    }
}

/// Create-table request for a source table, fields in column order.
pub fn build_table_spec(table: &str, columns: &[ColumnSchema]) -> TableSpec {
    TableSpec {
        name: table.to_string(),
        default_view_name: DEFAULT_VIEW_NAME.to_string(),
        fields: columns.iter().map(field_definition).collect(),
    }
}

/// Ensures each source table has a destination counterpart.
///
/// The destination's table directory is listed once and cached for the run;
/// tables created here are added to the cache.
#[derive(Debug, Default)]
pub struct SchemaSynchronizer {
    directory: Option<HashMap<String, String>>,
}

impl SchemaSynchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an already fetched table directory.
    pub fn with_directory(directory: HashMap<String, String>) -> Self {
        Self {
            directory: Some(directory),
        }
    }

    async fn directory<K: BaseSink + ?Sized>(
        &mut self,
        sink: &K,
        table: &str,
    ) -> Result<&mut HashMap<String, String>, SyncError> {
        if self.directory.is_none() {
            let listed = sink
                .list_tables()
                .await
                .map_err(|e| SyncError::SchemaCreation {
                    table: table.to_string(),
                    message: format!("could not list destination tables: {}", e.message()),
                })?;
            self.directory = Some(listed);
        }
        Ok(self.directory.get_or_insert_with(HashMap::new))
    }

    /// Return the destination table named `table`, creating it if missing.
    ///
    /// In a dry run a missing table is not created and the handle carries
    /// no identifier.
    pub async fn ensure_table<K: BaseSink + ?Sized>(
        &mut self,
        sink: &K,
        table: &str,
        columns: &[ColumnSchema],
        dry_run: bool,
    ) -> Result<TableHandle, SyncError> {
        let directory = self.directory(sink, table).await?;

        if let Some(table_id) = directory.get(table) {
            debug!("Destination table '{}' exists as {}", table, table_id);
            return Ok(TableHandle {
                name: table.to_string(),
                table_id: Some(table_id.clone()),
                created: false,
            });
        }

        let spec = build_table_spec(table, columns);

        if dry_run {
            info!(
                "Dry run: would create destination table '{}' with {} fields",
                table,
                spec.fields.len()
            );
            return Ok(TableHandle {
                name: table.to_string(),
                table_id: None,
                created: false,
            });
        }

        let table_id = sink
            .create_table(&spec)
            .await
            .map_err(|e| SyncError::SchemaCreation {
                table: table.to_string(),
                message: e.message(),
            })?;

        info!(
            "Created destination table '{}' ({}) with {} fields",
            table,
            table_id,
            spec.fields.len()
        );
        directory.insert(table.to_string(), table_id.clone());

        Ok(TableHandle {
            name: table.to_string(),
            table_id: Some(table_id),
            created: true,
        })
    }
}
