//! Database connection backends.
//!
//! The store never talks to a driver directly. It hands SQL text and a
//! positional parameter list to a [`Connection`], which knows how to reach the
//! database, which placeholder syntax it expects, and which table holds the
//! sessions.
//!
//! Two backends are provided:
//!
//! - [`PooledConnection`] owns a connection pool built from a database URL.
//! - [`ExternalConnection`] wraps a `sea_orm::DatabaseConnection` the host
//!   application already manages.

mod external;
mod pooled;

pub use external::ExternalConnection;
pub use pooled::{PoolOptions, PooledConnection};

use async_trait::async_trait;
use sea_orm::{ConnectionTrait, DbBackend, FromQueryResult, JsonValue, Statement, Value};
use tracing::debug;

use crate::error::{Result, StorageError};

/// Table used when no override is configured.
pub const DEFAULT_TABLE_NAME: &str = "shopify_sessions";

/// A single result row, keyed by column name.
pub type Row = serde_json::Map<String, JsonValue>;

/// Capabilities the store needs from a database backend.
///
/// Values are always passed through `params`, never spliced into `sql`.
/// Identifiers in `sql` come from [`quote_ident`].
#[async_trait]
pub trait Connection: Send + Sync {
    /// Name of the table holding session rows.
    fn table_name(&self) -> &str;

    /// Establishes the connection. Calling it again is a no-op.
    async fn connect(&self) -> Result<()>;

    /// Releases the connection. Calling it again is a no-op.
    async fn disconnect(&self) -> Result<()>;

    /// Runs a parameterized statement and returns its rows.
    async fn query(&self, sql: &str, params: Vec<Value>) -> Result<Vec<Row>>;

    /// Positional placeholder for the 1-based parameter `position`.
    fn placeholder(&self, position: usize) -> String {
        format!("${position}")
    }

    /// Whether a table called `name` exists.
    ///
    /// Several applications may share one database host, each with its own
    /// session table, so this checks the catalog of the current database.
    async fn has_table(&self, name: &str) -> Result<bool> {
        let sql = format!(
            r#"SELECT EXISTS (SELECT tablename FROM pg_catalog.pg_tables WHERE tablename = {}) AS "exists""#,
            self.placeholder(1)
        );
        exists_flag(&self.query(&sql, vec![name.into()]).await?)
    }
}

/// Double-quotes an SQL identifier, doubling any embedded quotes.
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

pub(crate) async fn query_rows<C>(
    conn: &C,
    backend: DbBackend,
    sql: &str,
    params: Vec<Value>,
) -> Result<Vec<Row>>
where
    C: ConnectionTrait,
{
    debug!(sql, params = params.len(), "executing statement");

    let stmt = Statement::from_sql_and_values(backend, sql, params);
    let rows = conn.query_all(stmt).await?;

    rows.iter()
        .map(|row| -> Result<Row> {
            match JsonValue::from_query_result(row, "")? {
                JsonValue::Object(map) => Ok(map),
                other => Err(StorageError::Decode(format!(
                    "expected a row object, got {other}"
                ))),
            }
        })
        .collect()
}

/// Reads the `exists` column of a catalog query's single row.
pub(crate) fn exists_flag(rows: &[Row]) -> Result<bool> {
    let flag = rows
        .first()
        .and_then(|row| row.get("exists"))
        .ok_or_else(|| StorageError::Decode("catalog query returned no `exists` column".to_string()))?;

    match flag {
        JsonValue::Bool(flag) => Ok(*flag),
        JsonValue::Number(n) if n.as_i64().is_some() => Ok(n.as_i64() != Some(0)),
        JsonValue::String(s) => Ok(matches!(s.as_str(), "1" | "t" | "true")),
        other => Err(StorageError::Decode(format!(
            "catalog query returned `{other}` for `exists`"
        ))),
    }
}

#[cfg(test)]
pub(crate) fn transaction_log(db: &sea_orm::DatabaseConnection) -> Vec<sea_orm::Transaction> {
    db.as_mock_connection()
        .get_mocker_mutex()
        .lock()
        .unwrap()
        .drain_transaction_log()
}
