//! `TableSource` over a single MySQL connection.
//!
//! Rows are fetched with prepared statements so values come back over the
//! binary protocol already typed; `mysql-types` turns them into
//! [`SourceValue`]s using the column type and character set.

use crate::SourceOpts;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use mysql_async::{prelude::*, Conn, Row, Value};
use mysql_types::mysql_value_to_source_value;
use sync_core::{ColumnSchema, SourceRow, TableSource};
use tracing::{debug, info};

/// Quote an identifier with backticks, doubling embedded backticks.
pub(crate) fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Build the paging query for `table`.
pub(crate) fn select_page_sql(table: &str, order_by: Option<&str>) -> String {
    match order_by {
        Some(column) => format!(
            "SELECT * FROM {} ORDER BY {} LIMIT ? OFFSET ?",
            quote_identifier(table),
            quote_identifier(column)
        ),
        None => format!("SELECT * FROM {} LIMIT ? OFFSET ?", quote_identifier(table)),
    }
}

/// MySQL source holding one open connection for the whole run.
pub struct MySqlSource {
    conn: Conn,
}

impl MySqlSource {
    pub async fn connect(opts: &SourceOpts) -> Result<Self> {
        let conn = Conn::new(opts.to_mysql_opts())
            .await
            .with_context(|| format!("Failed to connect to MySQL at '{}'", opts.display_target()))?;
        info!("Connected to MySQL at {}", opts.display_target());
        Ok(Self { conn })
    }

    /// Close the connection gracefully.
    pub async fn disconnect(self) -> Result<()> {
        self.conn.disconnect().await?;
        Ok(())
    }
}

fn row_to_source_row(row: Row) -> SourceRow {
    let columns = row.columns();
    let values = row.unwrap_raw();

    columns
        .iter()
        .zip(values)
        .map(|(column, value)| {
            (
                column.name_str().into_owned(),
                mysql_value_to_source_value(
                    value.unwrap_or(Value::NULL),
                    column.column_type(),
                    column.character_set(),
                ),
            )
        })
        .collect()
}

#[async_trait]
impl TableSource for MySqlSource {
    fn source_type(&self) -> &'static str {
        "mysql"
    }

    async fn list_tables(&mut self) -> Result<Vec<String>> {
        let tables: Vec<String> = self
            .conn
            .query(
                "SELECT TABLE_NAME
                 FROM information_schema.TABLES
                 WHERE TABLE_SCHEMA = DATABASE()
                 AND TABLE_TYPE IN ('BASE TABLE', 'VIEW')
                 ORDER BY TABLE_NAME",
            )
            .await
            .context("Failed to list MySQL tables")?;

        info!("Found {} MySQL tables: {:?}", tables.len(), tables);
        Ok(tables)
    }

    async fn describe_table(&mut self, table: &str) -> Result<Vec<ColumnSchema>> {
        let rows: Vec<(String, String, String, String)> = self
            .conn
            .exec(
                "SELECT COLUMN_NAME, COLUMN_TYPE, IS_NULLABLE, COLUMN_KEY
                 FROM information_schema.COLUMNS
                 WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ?
                 ORDER BY ORDINAL_POSITION",
                (table,),
            )
            .await
            .with_context(|| format!("Failed to describe table '{table}'"))?;

        if rows.is_empty() {
            return Err(anyhow!("Table '{table}' has no columns or does not exist"));
        }

        let columns: Vec<ColumnSchema> = rows
            .into_iter()
            .map(|(name, raw_type, nullable, key)| ColumnSchema {
                name,
                raw_type,
                nullable: nullable.eq_ignore_ascii_case("YES"),
                is_key: key == "PRI",
            })
            .collect();

        debug!("Table '{}' has {} columns", table, columns.len());
        Ok(columns)
    }

    async fn primary_key(&mut self, table: &str) -> Result<Option<String>> {
        let column: Option<String> = self
            .conn
            .exec_first(
                "SELECT COLUMN_NAME
                 FROM information_schema.KEY_COLUMN_USAGE
                 WHERE TABLE_SCHEMA = DATABASE()
                 AND TABLE_NAME = ?
                 AND CONSTRAINT_NAME = 'PRIMARY'
                 ORDER BY ORDINAL_POSITION
                 LIMIT 1",
                (table,),
            )
            .await
            .with_context(|| format!("Failed to look up primary key of '{table}'"))?;

        Ok(column)
    }

    async fn fetch_rows(
        &mut self,
        table: &str,
        order_by: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<SourceRow>> {
        let sql = select_page_sql(table, order_by);
        let rows: Vec<Row> = self
            .conn
            .exec(sql, (limit as u64, offset as u64))
            .await
            .with_context(|| format!("Failed to read rows from '{table}' at offset {offset}"))?;

        debug!(
            "Read {} rows from '{}' (offset {})",
            rows.len(),
            table,
            offset
        );
        Ok(rows.into_iter().map(row_to_source_row).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("users"), "`users`");
        assert_eq!(quote_identifier("we`ird"), "`we``ird`");
    }

    #[test]
    fn test_select_page_sql() {
        assert_eq!(
            select_page_sql("users", Some("id")),
            "SELECT * FROM `users` ORDER BY `id` LIMIT ? OFFSET ?"
        );
        assert_eq!(
            select_page_sql("logs", None),
            "SELECT * FROM `logs` LIMIT ? OFFSET ?"
        );
    }
}
