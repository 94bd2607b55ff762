//! SQLite export store.
//!
//! Every record kind is merged by primary key, so re-running an export
//! updates rows in place instead of duplicating them.

use std::path::Path;
use std::time::Duration;

use rusqlite::{params_from_iter, Connection};
use tracing::debug;

use super::migrations;
use super::rows::{upsert_sql, Upsert};
use crate::error::DatabaseError;

/// Destination for batches of records.
pub trait UpsertSink {
    /// Merge `batch` atomically: either every record is written or none is.
    fn upsert_batch<R: Upsert>(&mut self, batch: &[R]) -> Result<(), DatabaseError>;
}

/// SQLite database holding one table per exported kind.
pub struct ExportDb {
    conn: Connection,
}

impl ExportDb {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open (creating if needed) the database at `path` and migrate it.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| DatabaseError::QueryFailed(format!(
                "cannot create {}: {e}",
                parent.display()
            )))?;
        }
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Self::with_connection(conn)
    }

    /// Open an in-memory database.
    ///
    /// # Errors
    /// Returns an error if the schema cannot be created.
    pub fn open_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, DatabaseError> {
        migrations::migrate(&conn).map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self { conn })
    }

    /// Row count of `table`.
    ///
    /// # Errors
    /// Returns an error if the table does not exist.
    pub fn count(&self, table: &str) -> Result<i64, DatabaseError> {
        Ok(self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                row.get(0)
            })?)
    }
}

impl UpsertSink for ExportDb {
    fn upsert_batch<R: Upsert>(&mut self, batch: &[R]) -> Result<(), DatabaseError> {
        if batch.is_empty() {
            return Ok(());
        }
        let sql = upsert_sql::<R>();
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(&sql)?;
            for record in batch {
                stmt.execute(params_from_iter(record.values()))?;
            }
        }
        tx.commit()?;
        debug!(table = R::TABLE, count = batch.len(), "batch committed");
        Ok(())
    }
}
