use std::path::Path;

use crate::driver::{DriverConnection, DriverStatement, KeyRequest};
use crate::error::SqlSessionError;

use super::config::SqliteOptions;
use super::statement::SqliteStatement;

/// Driver name reported by [`SqliteConnection`].
pub const DRIVER_NAME: &str = "rusqlite";

/// A `rusqlite` connection behind the driver seam.
#[derive(Debug)]
pub struct SqliteConnection {
    conn: rusqlite::Connection,
}

impl SqliteConnection {
    /// # Errors
    ///
    /// Returns `SqlSessionError::SqliteError` if the database cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SqlSessionError> {
        Ok(Self::from_rusqlite(rusqlite::Connection::open(path)?))
    }

    /// # Errors
    ///
    /// Returns `SqlSessionError::SqliteError` if the database cannot be opened.
    pub fn open_in_memory() -> Result<Self, SqlSessionError> {
        Ok(Self::from_rusqlite(rusqlite::Connection::open_in_memory()?))
    }

    /// Open the database named by `opts` and apply its pragmas.
    ///
    /// # Errors
    ///
    /// Returns `SqlSessionError::SqliteError` if opening or configuring the database fails.
    pub fn from_options(opts: &SqliteOptions) -> Result<Self, SqlSessionError> {
        let conn = if opts.is_in_memory() {
            Self::open_in_memory()?
        } else {
            Self::open(&opts.db_path)?
        };
        let pragmas = opts.pragmas();
        if !pragmas.is_empty() {
            conn.conn.execute_batch(&pragmas)?;
        }
        tracing::debug!(db_path = %opts.db_path, "opened SQLite connection");
        Ok(conn)
    }

    #[must_use]
    pub fn from_rusqlite(conn: rusqlite::Connection) -> Self {
        Self { conn }
    }

    /// The wrapped `rusqlite` connection.
    #[must_use]
    pub fn raw(&self) -> &rusqlite::Connection {
        &self.conn
    }
}

impl DriverConnection for SqliteConnection {
    fn driver_name(&self) -> &str {
        DRIVER_NAME
    }

    fn prepare<'c>(
        &'c mut self,
        sql: &str,
        keys: KeyRequest<'_>,
    ) -> Result<Box<dyn DriverStatement + 'c>, SqlSessionError> {
        let conn: &'c rusqlite::Connection = &self.conn;
        let stmt = conn.prepare(sql)?;
        Ok(Box::new(SqliteStatement::new(stmt, conn, keys)))
    }

    fn begin(&mut self) -> Result<(), SqlSessionError> {
        if !self.conn.is_autocommit() {
            return Err(SqlSessionError::ExecutionError(
                "SQLite transaction already in progress".into(),
            ));
        }
        self.conn.execute_batch("BEGIN")?;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), SqlSessionError> {
        if self.conn.is_autocommit() {
            return Err(SqlSessionError::ExecutionError(
                "SQLite transaction not active".into(),
            ));
        }
        self.conn.execute_batch("COMMIT")?;
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), SqlSessionError> {
        if self.conn.is_autocommit() {
            return Err(SqlSessionError::ExecutionError(
                "SQLite transaction not active".into(),
            ));
        }
        self.conn.execute_batch("ROLLBACK")?;
        Ok(())
    }

    fn close(self: Box<Self>) -> Result<(), SqlSessionError> {
        self.conn.close().map_err(|(_, err)| err.into())
    }
}
