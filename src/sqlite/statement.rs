use rusqlite::types::Value;

use crate::driver::{BufferedCursor, DriverCursor, DriverStatement, KeyRequest};
use crate::error::SqlSessionError;
use crate::types::SqlValue;

use super::query::SqliteCursor;

/// Column name used for `last_insert_rowid()` when no key column was requested.
pub const ROWID_KEY_COLUMN: &str = "last_insert_rowid";

/// A prepared `rusqlite` statement with its pending bind values.
pub struct SqliteStatement<'c> {
    stmt: rusqlite::Statement<'c>,
    conn: &'c rusqlite::Connection,
    pending: Vec<Option<Value>>,
    batch: Vec<Vec<Option<Value>>>,
    key_column: Option<String>,
    inserted_rowid: Option<i64>,
}

impl<'c> SqliteStatement<'c> {
    pub(crate) fn new(
        stmt: rusqlite::Statement<'c>,
        conn: &'c rusqlite::Connection,
        keys: KeyRequest<'_>,
    ) -> Self {
        let key_column = match keys {
            KeyRequest::None => None,
            KeyRequest::ReturnGeneratedKeys => Some(ROWID_KEY_COLUMN.to_string()),
            KeyRequest::Columns(columns) => Some(
                columns
                    .first()
                    .cloned()
                    .unwrap_or_else(|| ROWID_KEY_COLUMN.to_string()),
            ),
        };
        Self {
            stmt,
            conn,
            pending: Vec::new(),
            batch: Vec::new(),
            key_column,
            inserted_rowid: None,
        }
    }

    /// Store `value` at the 1-based `index`.
    pub(crate) fn set(&mut self, index: usize, value: Value) -> Result<(), SqlSessionError> {
        if index == 0 {
            return Err(SqlSessionError::ParameterError(
                "parameter indices start at 1".into(),
            ));
        }
        if self.pending.len() < index {
            self.pending.resize(index, None);
        }
        self.pending[index - 1] = Some(value);
        Ok(())
    }

    /// Run a data-changing step and remember the rowid it inserted, if any.
    fn run_changes(&mut self, values: &[Option<Value>]) -> Result<usize, SqlSessionError> {
        self.inserted_rowid = None;
        bind_all(&mut self.stmt, values)?;
        let before = self.conn.last_insert_rowid();
        let changes = self.stmt.raw_execute()?;
        let after = self.conn.last_insert_rowid();
        self.inserted_rowid = (changes > 0 && after != 0 && after != before).then_some(after);
        Ok(changes)
    }
}

/// Bind exactly one value to every marker of `stmt`.
fn bind_all(
    stmt: &mut rusqlite::Statement<'_>,
    values: &[Option<Value>],
) -> Result<(), SqlSessionError> {
    let markers = stmt.parameter_count();
    if values.len() != markers {
        return Err(SqlSessionError::ParameterError(format!(
            "statement has {markers} parameter marker(s) but {} value(s) were bound",
            values.len()
        )));
    }
    for (idx, value) in values.iter().enumerate() {
        let Some(value) = value else {
            return Err(SqlSessionError::ParameterError(format!(
                "parameter {} was not bound",
                idx + 1
            )));
        };
        stmt.raw_bind_parameter(idx + 1, value)?;
    }
    Ok(())
}

impl DriverStatement for SqliteStatement<'_> {
    fn query(&mut self) -> Result<Box<dyn DriverCursor + '_>, SqlSessionError> {
        bind_all(&mut self.stmt, &self.pending)?;
        let columns = self
            .stmt
            .column_names()
            .iter()
            .map(std::string::ToString::to_string)
            .collect();
        Ok(Box::new(SqliteCursor::new(self.stmt.raw_query(), columns)))
    }

    fn execute(&mut self) -> Result<bool, SqlSessionError> {
        if self.stmt.column_count() > 0 {
            bind_all(&mut self.stmt, &self.pending)?;
            let mut rows = self.stmt.raw_query();
            rows.next()?;
            Ok(true)
        } else {
            let values = std::mem::take(&mut self.pending);
            let outcome = self.run_changes(&values);
            self.pending = values;
            outcome.map(|_| false)
        }
    }

    fn execute_update(&mut self) -> Result<u64, SqlSessionError> {
        let values = std::mem::take(&mut self.pending);
        let outcome = self.run_changes(&values);
        self.pending = values;
        outcome.map(|changes| changes as u64)
    }

    fn generated_keys(&mut self) -> Result<Box<dyn DriverCursor + '_>, SqlSessionError> {
        let Some(column) = self.key_column.clone() else {
            return Err(SqlSessionError::ExecutionError(
                "generated keys were not requested when the statement was prepared".into(),
            ));
        };
        let rows = match self.inserted_rowid {
            Some(rowid) => vec![vec![SqlValue::BigInt(rowid)]],
            None => Vec::new(),
        };
        Ok(Box::new(BufferedCursor::new(vec![column], rows)))
    }

    fn add_batch(&mut self) -> Result<(), SqlSessionError> {
        self.batch.push(std::mem::take(&mut self.pending));
        Ok(())
    }

    fn execute_batch(&mut self) -> Result<Vec<u64>, SqlSessionError> {
        let entries = std::mem::take(&mut self.batch);
        let mut counts = Vec::with_capacity(entries.len());
        for values in &entries {
            counts.push(self.run_changes(values)? as u64);
        }
        Ok(counts)
    }
}
