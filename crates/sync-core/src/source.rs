//! Source collaborator trait.

use crate::schema::ColumnSchema;
use crate::values::SourceRow;
use anyhow::Result;
use async_trait::async_trait;

/// Read-only access to the relational source.
///
/// Implementations hold a single connection; methods take `&mut self`
/// because no two calls are ever in flight at once.
#[async_trait]
pub trait TableSource: Send {
    /// Source type identifier, for logging.
    fn source_type(&self) -> &'static str;

    /// Names of all tables in the source database.
    async fn list_tables(&mut self) -> Result<Vec<String>>;

    /// Columns of `table`, in ordinal order.
    async fn describe_table(&mut self, table: &str) -> Result<Vec<ColumnSchema>>;

    /// First primary key column of `table` by ordinal position, if any.
    async fn primary_key(&mut self, table: &str) -> Result<Option<String>>;

    /// Up to `limit` rows starting at `offset`, ordered by `order_by` when given.
    async fn fetch_rows(
        &mut self,
        table: &str,
        order_by: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<SourceRow>>;
}
