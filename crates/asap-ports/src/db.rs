//! DB cursor port. Modeled as a narrow query interface rather than a full
//! client so LIMS, CaseQC, and ACORD lookups can share one fake in tests.

use async_trait::async_trait;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("unknown logical database: {0}")]
    UnknownDatabase(String),
    #[error("query failed against {table}: {reason}")]
    QueryFailed { table: String, reason: String },
    #[error("deadlock detected, retry")]
    Deadlock,
}

pub type DbResult<T> = Result<T, DbError>;

/// One row, as a column-name -> text-value map. Good enough for index
/// resolution and config loading; callers that need typed columns parse
/// the string themselves.
pub type Row = BTreeMap<String, String>;

/// A leased cursor against one logical database (`xmit`, `sip`, `snip`,
/// `delta_qc`, `acord`, `case_qc`). Cursors are not held across
/// suspension points that involve external I/O other than the query
/// itself.
#[async_trait]
pub trait Cursor: Send + Sync {
    async fn query(&self, table: &str, key_column: &str, key_value: &str) -> DbResult<Vec<Row>>;
    async fn query_all(&self, table: &str, key_column: &str, key_value: &str) -> DbResult<Vec<Row>> {
        self.query(table, key_column, key_value).await
    }
    async fn insert(&self, table: &str, row: Row) -> DbResult<()>;
}

/// Resolves a logical database name (`xmit`, `sip`, `snip`, `delta_qc`,
/// `acord`, `case_qc`) to a leased [`Cursor`].
#[async_trait]
pub trait DbPool: Send + Sync {
    async fn get_cursor(&self, logical_name: &str) -> DbResult<std::sync::Arc<dyn Cursor>>;
}
