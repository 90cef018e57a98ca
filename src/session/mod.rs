use std::collections::HashMap;

use crate::driver::DriverConnection;
use crate::error::SqlSessionError;
use crate::executor::{Action, ActionOutcome, StatementExecutor};
use crate::params::Parameter;
use crate::results::Row;
use crate::template::Query;

mod config;
mod tx;

pub use config::{SessionOptions, SessionOptionsBuilder};
pub use tx::TransactionalSession;

/// Whether a [`Session`] currently has a transaction open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Idle,
    InTransaction,
}

/// Execution shapes shared by [`Session`] and [`TransactionalSession`].
///
/// Implementors only supply [`statement_executor`](QueryExecutor::statement_executor); every
/// shape borrows one executor for the duration of the call.
pub trait QueryExecutor {
    /// Borrow an executor for `operation` (used in diagnostics).
    fn statement_executor(&mut self, operation: &'static str) -> StatementExecutor<'_>;

    /// # Errors
    ///
    /// Returns binding, driver, or extractor failures.
    fn single<T, F>(&mut self, query: &Query, extractor: F) -> Result<Option<T>, SqlSessionError>
    where
        F: FnMut(&Row<'_>) -> Result<Option<T>, SqlSessionError>,
    {
        self.statement_executor("single").single(query, extractor)
    }

    /// # Errors
    ///
    /// Returns binding, driver, or extractor failures.
    fn list<T, F>(&mut self, query: &Query, extractor: F) -> Result<Vec<T>, SqlSessionError>
    where
        F: FnMut(&Row<'_>) -> Result<Option<T>, SqlSessionError>,
    {
        self.statement_executor("list").list(query, extractor)
    }

    /// # Errors
    ///
    /// Returns binding, driver, or callback failures.
    fn for_each<F>(&mut self, query: &Query, operation: F) -> Result<(), SqlSessionError>
    where
        F: FnMut(&Row<'_>) -> Result<(), SqlSessionError>,
    {
        self.statement_executor("for_each").for_each(query, operation)
    }

    /// # Errors
    ///
    /// Returns binding or driver failures.
    fn execute(&mut self, query: &Query) -> Result<bool, SqlSessionError> {
        self.statement_executor("execute").execute(query)
    }

    /// # Errors
    ///
    /// Returns binding or driver failures.
    fn update(&mut self, query: &Query) -> Result<u64, SqlSessionError> {
        self.statement_executor("update").update(query)
    }

    /// # Errors
    ///
    /// Returns binding or driver failures.
    fn update_and_return_generated_key(
        &mut self,
        query: &Query,
    ) -> Result<Option<i64>, SqlSessionError> {
        self.statement_executor("update_and_return_generated_key")
            .update_and_return_generated_key(query)
    }

    /// Run `statement` once per positional row; one affected count per row, in order.
    ///
    /// # Errors
    ///
    /// Returns binding or driver failures.
    fn batch_prepared_statement(
        &mut self,
        statement: &str,
        rows: &[Vec<Parameter>],
    ) -> Result<Vec<u64>, SqlSessionError> {
        self.statement_executor("batch_prepared_statement")
            .batch_positional(statement, rows)
    }

    /// Run `statement` once per named row; one affected count per row, in order.
    ///
    /// # Errors
    ///
    /// Returns `MissingParameter` if a row lacks a placeholder, or binding/driver failures.
    fn batch_prepared_named_statement(
        &mut self,
        statement: &str,
        rows: &[HashMap<String, Parameter>],
    ) -> Result<Vec<u64>, SqlSessionError> {
        self.statement_executor("batch_prepared_named_statement")
            .batch_named(statement, rows)
    }

    /// # Errors
    ///
    /// Returns whatever the action's shape returns.
    fn run<T>(&mut self, action: Action<'_, T>) -> Result<ActionOutcome<T>, SqlSessionError> {
        self.statement_executor("run").run(action)
    }
}

/// A connection plus the options applied to every statement run through it.
///
/// ```rust,no_run
/// use sql_session::prelude::*;
///
/// # fn main() -> Result<(), SqlSessionError> {
/// let mut session = Session::open_sqlite(SqliteOptions::in_memory(), SessionOptions::default())?;
/// session.execute(&Query::new("create table t (id integer primary key, name text)"))?;
/// let inserted = session.update(&Query::new("insert into t (name) values (:name)").bind_named("name", "ann"))?;
/// assert_eq!(inserted, 1);
/// # Ok(())
/// # }
/// ```
pub struct Session {
    conn: Box<dyn DriverConnection + Send>,
    options: SessionOptions,
    state: SessionState,
}

impl Session {
    pub fn new<C>(conn: C, options: SessionOptions) -> Self
    where
        C: DriverConnection + Send + 'static,
    {
        Self::from_boxed(Box::new(conn), options)
    }

    #[must_use]
    pub fn from_boxed(conn: Box<dyn DriverConnection + Send>, options: SessionOptions) -> Self {
        Self {
            conn,
            options,
            state: SessionState::Idle,
        }
    }

    /// Open a session over the bundled `SQLite` driver.
    ///
    /// # Errors
    ///
    /// Returns `SqlSessionError::SqliteError` if the database cannot be opened or configured.
    #[cfg(feature = "sqlite")]
    pub fn open_sqlite(
        sqlite: crate::sqlite::SqliteOptions,
        options: SessionOptions,
    ) -> Result<Self, SqlSessionError> {
        let conn = crate::sqlite::SqliteConnection::from_options(&sqlite)?;
        Ok(Self::new(conn, options))
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn is_transactional(&self) -> bool {
        self.state == SessionState::InTransaction
    }

    #[must_use]
    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    #[must_use]
    pub fn driver_name(&self) -> &str {
        self.conn.driver_name()
    }

    /// Close the underlying connection.
    ///
    /// # Errors
    ///
    /// Returns the driver's failure if closing fails.
    pub fn close(self) -> Result<(), SqlSessionError> {
        tracing::debug!(driver = self.conn.driver_name(), "closing session");
        self.conn.close()
    }
}

impl QueryExecutor for Session {
    fn statement_executor(&mut self, operation: &'static str) -> StatementExecutor<'_> {
        if self.state == SessionState::InTransaction {
            tracing::warn!(
                operation,
                "session used directly while a transaction is open; \
                 the statement runs inside that transaction"
            );
        }
        StatementExecutor::new(self.conn.as_mut(), &self.options)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("driver", &self.conn.driver_name())
            .field("options", &self.options)
            .field("state", &self.state)
            .finish()
    }
}
