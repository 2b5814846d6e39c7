use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{ConnectionTrait, DatabaseConnection, DbBackend, Value};

use super::{exists_flag, query_rows, Connection, Row, DEFAULT_TABLE_NAME};
use crate::error::Result;

/// A backend that borrows a connection the application already manages.
///
/// `connect` and `disconnect` do nothing; the owner of the
/// `DatabaseConnection` decides when it opens and closes. Placeholder syntax
/// follows the wrapped connection's database backend.
///
/// Cloning is cheap and every clone shares the same connection.
#[derive(Debug, Clone)]
pub struct ExternalConnection {
    conn: Arc<DatabaseConnection>,
    table_name: String,
}

impl ExternalConnection {
    /// Wraps `conn`, using the default `shopify_sessions` table.
    ///
    /// Accepts either an owned `DatabaseConnection` or an
    /// `Arc<DatabaseConnection>` already shared with the rest of the
    /// application.
    pub fn new(conn: impl Into<Arc<DatabaseConnection>>) -> Self {
        Self {
            conn: conn.into(),
            table_name: DEFAULT_TABLE_NAME.to_string(),
        }
    }

    /// Reads and writes sessions in `table_name` instead of the default table.
    ///
    /// The name is quoted as an identifier, never spliced in raw.
    pub fn with_table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = table_name.into();
        self
    }

    /// The wrapped connection.
    pub fn inner(&self) -> &DatabaseConnection {
        &self.conn
    }

    fn backend(&self) -> DbBackend {
        self.conn.get_database_backend()
    }
}

#[async_trait]
impl Connection for ExternalConnection {
    fn table_name(&self) -> &str {
        &self.table_name
    }

    async fn connect(&self) -> Result<()> {
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        Ok(())
    }

    async fn query(&self, sql: &str, params: Vec<Value>) -> Result<Vec<Row>> {
        query_rows(self.conn.as_ref(), self.backend(), sql, params).await
    }

    fn placeholder(&self, position: usize) -> String {
        match self.backend() {
            DbBackend::Postgres => format!("${position}"),
            DbBackend::Sqlite => format!("?{position}"),
            _ => "?".to_string(),
        }
    }

    async fn has_table(&self, name: &str) -> Result<bool> {
        match self.backend() {
            DbBackend::Postgres => {
                let sql = format!(
                    r#"SELECT EXISTS (SELECT tablename FROM pg_catalog.pg_tables WHERE tablename = {}) AS "exists""#,
                    self.placeholder(1)
                );
                exists_flag(&self.query(&sql, vec![name.into()]).await?)
            }
            // SQLite reports no type for an EXISTS expression, so the flag
            // column would be dropped from the row; look for the row itself.
            DbBackend::Sqlite => {
                let sql = format!(
                    r#"SELECT "name" FROM sqlite_master WHERE type = 'table' AND name = {}"#,
                    self.placeholder(1)
                );
                Ok(!self.query(&sql, vec![name.into()]).await?.is_empty())
            }
            _ => {
                let sql = format!(
                    r#"SELECT table_name FROM information_schema.tables WHERE table_schema = DATABASE() AND table_name = {}"#,
                    self.placeholder(1)
                );
                Ok(!self.query(&sql, vec![name.into()]).await?.is_empty())
            }
        }
    }
}
