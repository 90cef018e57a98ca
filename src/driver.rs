//! The seam between sessions and a concrete database driver.
//!
//! A driver supplies a [`DriverConnection`] that prepares [`DriverStatement`]s. Statements take
//! positional binds through [`ParameterSink`] and hand back rows through [`DriverCursor`].
//! Indices at this boundary are 1-based for parameters and 0-based for columns.

use std::collections::VecDeque;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::Value as JsonValue;
use url::Url;

use crate::error::SqlSessionError;
use crate::types::{OpaqueValue, SqlDecimal, SqlType, SqlValue};

/// Drivers whose generated-key API needs the key columns spelled out.
pub const KEY_COLUMN_DRIVERS: &[&str] = &["oracle"];

/// How a statement should capture generated keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyRequest<'a> {
    /// Plain statement.
    None,
    /// Ask the driver to return whatever keys it generates.
    ReturnGeneratedKeys,
    /// Ask the driver to return these columns.
    Columns(&'a [String]),
}

impl KeyRequest<'_> {
    #[must_use]
    pub fn is_requested(&self) -> bool {
        !matches!(self, KeyRequest::None)
    }
}

/// A live connection able to prepare statements and bracket transactions.
pub trait DriverConnection {
    /// Identity string, used only to pick the generated-key request form.
    fn driver_name(&self) -> &str;

    /// Prepare `sql`, which uses `?` positional markers.
    ///
    /// # Errors
    ///
    /// Returns the driver's failure if the statement cannot be prepared.
    fn prepare<'c>(
        &'c mut self,
        sql: &str,
        keys: KeyRequest<'_>,
    ) -> Result<Box<dyn DriverStatement + 'c>, SqlSessionError>;

    /// # Errors
    ///
    /// Returns the driver's failure if the transaction cannot be started.
    fn begin(&mut self) -> Result<(), SqlSessionError>;

    /// # Errors
    ///
    /// Returns the driver's failure if committing fails.
    fn commit(&mut self) -> Result<(), SqlSessionError>;

    /// # Errors
    ///
    /// Returns the driver's failure if rolling back fails.
    fn rollback(&mut self) -> Result<(), SqlSessionError>;

    /// Release the connection.
    ///
    /// # Errors
    ///
    /// Returns the driver's failure if closing fails.
    fn close(self: Box<Self>) -> Result<(), SqlSessionError>;
}

/// Positional bind calls, one per value kind. Indices are 1-based.
pub trait ParameterSink {
    fn bind_null(&mut self, index: usize, sql_type: SqlType) -> Result<(), SqlSessionError>;
    fn bind_text(&mut self, index: usize, value: &str) -> Result<(), SqlSessionError>;
    fn bind_tiny_int(&mut self, index: usize, value: i8) -> Result<(), SqlSessionError>;
    fn bind_bool(&mut self, index: usize, value: bool) -> Result<(), SqlSessionError>;
    fn bind_small_int(&mut self, index: usize, value: i16) -> Result<(), SqlSessionError>;
    fn bind_int(&mut self, index: usize, value: i32) -> Result<(), SqlSessionError>;
    fn bind_big_int(&mut self, index: usize, value: i64) -> Result<(), SqlSessionError>;
    fn bind_real(&mut self, index: usize, value: f32) -> Result<(), SqlSessionError>;
    fn bind_double(&mut self, index: usize, value: f64) -> Result<(), SqlSessionError>;
    fn bind_timestamp(&mut self, index: usize, value: NaiveDateTime)
    -> Result<(), SqlSessionError>;
    fn bind_timestamp_tz(
        &mut self,
        index: usize,
        value: DateTime<FixedOffset>,
    ) -> Result<(), SqlSessionError>;
    fn bind_date(&mut self, index: usize, value: NaiveDate) -> Result<(), SqlSessionError>;
    fn bind_time(&mut self, index: usize, value: NaiveTime) -> Result<(), SqlSessionError>;
    fn bind_bytes(&mut self, index: usize, value: &[u8]) -> Result<(), SqlSessionError>;
    fn bind_array(&mut self, index: usize, items: &[SqlValue]) -> Result<(), SqlSessionError>;
    fn bind_object(&mut self, index: usize, value: &OpaqueValue) -> Result<(), SqlSessionError>;

    fn bind_decimal(&mut self, index: usize, value: &SqlDecimal) -> Result<(), SqlSessionError> {
        self.bind_text(index, value.as_str())
    }

    fn bind_url(&mut self, index: usize, value: &Url) -> Result<(), SqlSessionError> {
        self.bind_text(index, value.as_str())
    }

    fn bind_json(&mut self, index: usize, value: &JsonValue) -> Result<(), SqlSessionError> {
        self.bind_text(index, &value.to_string())
    }
}

/// A prepared statement. Dropping it releases it.
pub trait DriverStatement: ParameterSink {
    /// Drivers without statement timeouts keep the default no-op.
    ///
    /// # Errors
    ///
    /// Returns the driver's failure if the timeout cannot be applied.
    fn set_query_timeout(&mut self, _seconds: u64) -> Result<(), SqlSessionError> {
        Ok(())
    }

    /// # Errors
    ///
    /// Returns the driver's failure if the query cannot run.
    fn query(&mut self) -> Result<Box<dyn DriverCursor + '_>, SqlSessionError>;

    /// Run the statement; `true` when it produced a result set.
    ///
    /// # Errors
    ///
    /// Returns the driver's failure if the statement cannot run.
    fn execute(&mut self) -> Result<bool, SqlSessionError>;

    /// # Errors
    ///
    /// Returns the driver's failure if the statement cannot run.
    fn execute_update(&mut self) -> Result<u64, SqlSessionError>;

    /// Keys generated by the last update. Only valid when keys were requested at prepare time.
    ///
    /// # Errors
    ///
    /// Returns the driver's failure, or `ExecutionError` when keys were not requested.
    fn generated_keys(&mut self) -> Result<Box<dyn DriverCursor + '_>, SqlSessionError>;

    /// Snapshot the currently bound parameters as one batch entry.
    ///
    /// # Errors
    ///
    /// Returns the driver's failure if the entry cannot be recorded.
    fn add_batch(&mut self) -> Result<(), SqlSessionError>;

    /// Run every batch entry in order, one affected-row count each.
    ///
    /// # Errors
    ///
    /// Returns the first failure; entries before it may already have run.
    fn execute_batch(&mut self) -> Result<Vec<u64>, SqlSessionError>;
}

/// Forward-only result cursor.
pub trait DriverCursor {
    fn column_names(&self) -> &[String];

    /// Move to the next row. The returned row is valid until the next call.
    ///
    /// # Errors
    ///
    /// Returns the driver's failure if stepping fails.
    fn advance(&mut self) -> Result<Option<&dyn DriverRow>, SqlSessionError>;
}

/// Column access at one cursor position.
pub trait DriverRow {
    fn column_count(&self) -> usize;

    /// # Errors
    ///
    /// Returns the driver's failure if the column cannot be read.
    fn value(&self, index: usize) -> Result<SqlValue, SqlSessionError>;
}

impl DriverRow for Vec<SqlValue> {
    fn column_count(&self) -> usize {
        self.len()
    }

    fn value(&self, index: usize) -> Result<SqlValue, SqlSessionError> {
        self.get(index)
            .cloned()
            .ok_or_else(|| SqlSessionError::ColumnNotFound(format!("index {index}")))
    }
}

/// A cursor over rows that are already in memory.
#[derive(Debug, Clone, Default)]
pub struct BufferedCursor {
    columns: Vec<String>,
    pending: VecDeque<Vec<SqlValue>>,
    current: Option<Vec<SqlValue>>,
}

impl BufferedCursor {
    #[must_use]
    pub fn new(columns: Vec<String>, rows: Vec<Vec<SqlValue>>) -> Self {
        Self {
            columns,
            pending: rows.into(),
            current: None,
        }
    }
}

impl DriverCursor for BufferedCursor {
    fn column_names(&self) -> &[String] {
        &self.columns
    }

    fn advance(&mut self) -> Result<Option<&dyn DriverRow>, SqlSessionError> {
        self.current = self.pending.pop_front();
        Ok(self.current.as_ref().map(|row| row as &dyn DriverRow))
    }
}

/// Whether `driver_name` needs explicit key columns instead of the generic flag.
#[must_use]
pub fn requires_key_columns(driver_name: &str) -> bool {
    KEY_COLUMN_DRIVERS
        .iter()
        .any(|known| driver_name.eq_ignore_ascii_case(known))
}
