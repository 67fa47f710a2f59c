//! Error types for a sync run.

use std::fmt;
use thiserror::Error;

/// Which batch call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOp {
    Create,
    Update,
}

impl fmt::Display for WriteOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteOp::Create => f.write_str("create"),
            WriteOp::Update => f.write_str("update"),
        }
    }
}

/// Errors raised while syncing.
///
/// Only [`SyncError::Connection`] ends a run. Every other variant belongs to
/// one table and is recorded as that table's failure.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Source or destination unreachable before any table was processed.
    #[error("connection error: {0}")]
    Connection(String),

    #[error("failed to create destination table '{table}': {message}")]
    SchemaCreation { table: String, message: String },

    #[error("failed to index existing records of '{table}': {message}")]
    IndexBuild { table: String, message: String },

    #[error("batch {operation} failed for '{table}': {message}")]
    BatchWrite {
        table: String,
        operation: WriteOp,
        message: String,
    },

    #[error("failed to read source table '{table}': {message}")]
    Source { table: String, message: String },
}

impl SyncError {
    /// Whether the error aborts the whole run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SyncError::Connection(_))
    }

    pub(crate) fn source(table: &str, err: anyhow::Error) -> Self {
        SyncError::Source {
            table: table.to_string(),
            message: format!("{err:#}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_connection_errors_are_fatal() {
        assert!(SyncError::Connection("refused".into()).is_fatal());
        assert!(!SyncError::SchemaCreation {
            table: "users".into(),
            message: "rejected".into()
        }
        .is_fatal());
        assert!(!SyncError::BatchWrite {
            table: "users".into(),
            operation: WriteOp::Update,
            message: "FieldNameNotFound".into()
        }
        .is_fatal());
    }

    #[test]
    fn test_batch_write_message_names_operation() {
        let err = SyncError::BatchWrite {
            table: "users".into(),
            operation: WriteOp::Create,
            message: "TooManyRecords".into(),
        };
        assert_eq!(
            err.to_string(),
            "batch create failed for 'users': TooManyRecords"
        );
    }

    #[test]
    fn test_source_error_keeps_context_chain() {
        let err = anyhow::anyhow!("connection reset").context("Failed to read rows");
        let err = SyncError::source("users", err);
        assert_eq!(
            err.to_string(),
            "failed to read source table 'users': Failed to read rows: connection reset"
        );
    }
}
