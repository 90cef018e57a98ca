use rusqlite::types::Value;

use crate::driver::{DriverCursor, DriverRow};
use crate::error::SqlSessionError;
use crate::types::SqlValue;

/// Read one column of a `rusqlite` row.
///
/// # Errors
///
/// Returns `SqlSessionError::SqliteError` if the column cannot be read.
pub fn sqlite_extract_value(
    row: &rusqlite::Row<'_>,
    idx: usize,
) -> Result<SqlValue, SqlSessionError> {
    let value: Value = row.get(idx)?;
    Ok(match value {
        Value::Null => SqlValue::Null,
        Value::Integer(i) => SqlValue::BigInt(i),
        Value::Real(f) => SqlValue::Double(f),
        Value::Text(s) => SqlValue::Text(s),
        Value::Blob(b) => SqlValue::Blob(b),
    })
}

impl DriverRow for rusqlite::Row<'_> {
    fn column_count(&self) -> usize {
        let stmt: &rusqlite::Statement<'_> = self.as_ref();
        stmt.column_count()
    }

    fn value(&self, index: usize) -> Result<SqlValue, SqlSessionError> {
        sqlite_extract_value(self, index)
    }
}

/// Streams rows straight from the statement; nothing is buffered.
pub struct SqliteCursor<'s> {
    rows: rusqlite::Rows<'s>,
    columns: Vec<String>,
}

impl<'s> SqliteCursor<'s> {
    pub(crate) fn new(rows: rusqlite::Rows<'s>, columns: Vec<String>) -> Self {
        Self { rows, columns }
    }
}

impl DriverCursor for SqliteCursor<'_> {
    fn column_names(&self) -> &[String] {
        &self.columns
    }

    fn advance(&mut self) -> Result<Option<&dyn DriverRow>, SqlSessionError> {
        Ok(self.rows.next()?.map(|row| row as &dyn DriverRow))
    }
}
