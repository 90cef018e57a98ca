use std::collections::HashMap;

use crate::driver::{DriverConnection, DriverStatement, KeyRequest, requires_key_columns};
use crate::error::SqlSessionError;
use crate::params::Parameter;
use crate::results::{Row, RowCursor};
use crate::session::SessionOptions;
use crate::template::Query;

mod dispatch;

pub use dispatch::{Action, ActionOutcome, Extractor, ResultQueryActionBuilder};

/// Prepares, populates and runs statements on one borrowed connection.
///
/// Every shape drops its cursor before its statement, on success and on error.
pub struct StatementExecutor<'s> {
    conn: &'s mut dyn DriverConnection,
    options: &'s SessionOptions,
}

impl<'s> StatementExecutor<'s> {
    pub(crate) fn new(conn: &'s mut dyn DriverConnection, options: &'s SessionOptions) -> Self {
        Self { conn, options }
    }

    fn key_request(&self, capture_keys: bool) -> KeyRequest<'s> {
        if !(capture_keys || self.options.return_generated_keys) {
            KeyRequest::None
        } else if requires_key_columns(self.conn.driver_name()) {
            KeyRequest::Columns(&self.options.auto_generated_keys)
        } else {
            KeyRequest::ReturnGeneratedKeys
        }
    }

    fn prepare(
        &mut self,
        sql: &str,
        capture_keys: bool,
    ) -> Result<Box<dyn DriverStatement + '_>, SqlSessionError> {
        let keys = self.key_request(capture_keys);
        tracing::debug!(sql, ?keys, "preparing statement");
        let mut stmt = self.conn.prepare(sql, keys)?;
        if let Some(seconds) = self.options.query_timeout_secs {
            stmt.set_query_timeout(seconds)?;
        }
        Ok(stmt)
    }

    /// Run a query and keep the first row the extractor maps to a value.
    ///
    /// The extractor still sees every row; rows after the first kept one are ignored.
    ///
    /// # Errors
    ///
    /// Returns binding, driver, or extractor failures.
    pub fn single<T, F>(
        &mut self,
        query: &Query,
        mut extractor: F,
    ) -> Result<Option<T>, SqlSessionError>
    where
        F: FnMut(&Row<'_>) -> Result<Option<T>, SqlSessionError>,
    {
        let mut first = None;
        self.for_each(query, |row| {
            if let Some(value) = extractor(row)?
                && first.is_none()
            {
                first = Some(value);
            }
            Ok(())
        })?;
        Ok(first)
    }

    /// Run a query and collect every value the extractor produces, in cursor order.
    ///
    /// # Errors
    ///
    /// Returns binding, driver, or extractor failures.
    pub fn list<T, F>(&mut self, query: &Query, mut extractor: F) -> Result<Vec<T>, SqlSessionError>
    where
        F: FnMut(&Row<'_>) -> Result<Option<T>, SqlSessionError>,
    {
        let mut values = Vec::new();
        self.for_each(query, |row| {
            if let Some(value) = extractor(row)? {
                values.push(value);
            }
            Ok(())
        })?;
        Ok(values)
    }

    /// Run a query and call `operation` on each row in cursor order.
    ///
    /// # Errors
    ///
    /// Returns binding, driver, or callback failures.
    pub fn for_each<F>(&mut self, query: &Query, mut operation: F) -> Result<(), SqlSessionError>
    where
        F: FnMut(&Row<'_>) -> Result<(), SqlSessionError>,
    {
        let mut stmt = self.prepare(query.clean_statement(), false)?;
        populate(stmt.as_mut(), query)?;
        let mut cursor = RowCursor::new(stmt.query()?);
        while let Some(row) = cursor.next()? {
            operation(&row)?;
        }
        Ok(())
    }

    /// Run a statement; `true` when it produced a result set.
    ///
    /// # Errors
    ///
    /// Returns binding or driver failures.
    pub fn execute(&mut self, query: &Query) -> Result<bool, SqlSessionError> {
        let mut stmt = self.prepare(query.clean_statement(), false)?;
        populate(stmt.as_mut(), query)?;
        stmt.execute()
    }

    /// Run a statement and return the affected-row count.
    ///
    /// # Errors
    ///
    /// Returns binding or driver failures.
    pub fn update(&mut self, query: &Query) -> Result<u64, SqlSessionError> {
        let mut stmt = self.prepare(query.clean_statement(), false)?;
        populate(stmt.as_mut(), query)?;
        stmt.execute_update()
    }

    /// Run an update and return the first generated key.
    ///
    /// Zero affected rows returns `None` without reading keys. A statement that changes rows
    /// but yields no key is logged and also returns `None`.
    ///
    /// # Errors
    ///
    /// Returns binding or driver failures, or a conversion failure for a non-integer key.
    pub fn update_and_return_generated_key(
        &mut self,
        query: &Query,
    ) -> Result<Option<i64>, SqlSessionError> {
        let mut stmt = self.prepare(query.clean_statement(), true)?;
        populate(stmt.as_mut(), query)?;
        let affected = stmt.execute_update()?;
        if affected == 0 {
            return Ok(None);
        }
        let mut keys = RowCursor::new(stmt.generated_keys()?);
        let key = match keys.next()? {
            Some(row) => row.get::<Option<i64>, _>(0)?,
            None => None,
        };
        if key.is_none() {
            tracing::warn!(
                affected,
                sql = query.clean_statement(),
                "update succeeded but produced no generated key"
            );
        }
        Ok(key)
    }

    /// Add one batch entry per positional row and run them together.
    ///
    /// # Errors
    ///
    /// Returns binding or driver failures.
    pub fn batch_positional(
        &mut self,
        statement: &str,
        rows: &[Vec<Parameter>],
    ) -> Result<Vec<u64>, SqlSessionError> {
        let query = Query::new(statement);
        let mut stmt = self.prepare(query.clean_statement(), false)?;
        for row in rows {
            bind_positional(stmt.as_mut(), row)?;
            stmt.add_batch()?;
        }
        finish_batch(stmt.as_mut(), rows.len())
    }

    /// Add one batch entry per named row, resolved through the statement's placeholders.
    ///
    /// # Errors
    ///
    /// Returns `MissingParameter` if a row lacks a placeholder, or binding/driver failures.
    pub fn batch_named(
        &mut self,
        statement: &str,
        rows: &[HashMap<String, Parameter>],
    ) -> Result<Vec<u64>, SqlSessionError> {
        let query = Query::new(statement);
        let mut stmt = self.prepare(query.clean_statement(), false)?;
        for values in rows {
            for (pos, param) in query.resolve_named(values)? {
                param.bind_to(stmt.as_mut(), pos + 1)?;
            }
            stmt.add_batch()?;
        }
        finish_batch(stmt.as_mut(), rows.len())
    }
}

/// Bind `query`'s values: by name when it has placeholders, by position otherwise.
///
/// # Errors
///
/// Returns `MissingParameter`, `AmbiguousNullType`, or the driver's bind failure.
pub fn populate(stmt: &mut dyn DriverStatement, query: &Query) -> Result<(), SqlSessionError> {
    if query.is_named() {
        for (pos, param) in query.resolve_named(query.param_map())? {
            param.bind_to(&mut *stmt, pos + 1)?;
        }
        Ok(())
    } else {
        bind_positional(stmt, query.params())
    }
}

fn bind_positional(
    stmt: &mut dyn DriverStatement,
    params: &[Parameter],
) -> Result<(), SqlSessionError> {
    for (idx, param) in params.iter().enumerate() {
        param.bind_to(&mut *stmt, idx + 1)?;
    }
    Ok(())
}

fn finish_batch(
    stmt: &mut dyn DriverStatement,
    expected: usize,
) -> Result<Vec<u64>, SqlSessionError> {
    let counts = stmt.execute_batch()?;
    if counts.len() != expected {
        return Err(SqlSessionError::ExecutionError(format!(
            "driver returned {} batch counts for {expected} rows",
            counts.len()
        )));
    }
    Ok(counts)
}
