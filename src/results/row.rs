use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use serde_json::Value as JsonValue;

use crate::driver::DriverRow;
use crate::error::SqlSessionError;
use crate::types::SqlValue;

/// A view of the row under a [`RowCursor`](super::RowCursor).
///
/// The view borrows the cursor, so it cannot be kept once the cursor moves on.
pub struct Row<'c> {
    raw: &'c dyn DriverRow,
    column_names: &'c [String],
    row_number: usize,
}

impl<'c> Row<'c> {
    pub(crate) fn new(
        raw: &'c dyn DriverRow,
        column_names: &'c [String],
        row_number: usize,
    ) -> Self {
        Self {
            raw,
            column_names,
            row_number,
        }
    }

    /// 0-based position of this row in its cursor.
    #[must_use]
    pub fn row_number(&self) -> usize {
        self.row_number
    }

    #[must_use]
    pub fn column_names(&self) -> &'c [String] {
        self.column_names
    }

    #[must_use]
    pub fn column_count(&self) -> usize {
        self.raw.column_count()
    }

    /// Raw value of a column, addressed by 0-based index or by name.
    ///
    /// # Errors
    ///
    /// Returns `SqlSessionError::ColumnNotFound` for an unknown column, or the driver's
    /// failure reading it.
    pub fn value<C: ColumnIndex>(&self, column: C) -> Result<SqlValue, SqlSessionError> {
        let idx = column.resolve(self)?;
        self.raw.value(idx)
    }

    /// Typed value of a column.
    ///
    /// ```rust
    /// # use sql_session::prelude::*;
    /// # fn demo(row: &Row<'_>) -> Result<(), SqlSessionError> {
    /// let id: i64 = row.get("id")?;
    /// let nickname: Option<String> = row.get(2)?;
    /// # let _ = (id, nickname);
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `SqlSessionError::ConversionError` when the value does not convert to `T`.
    pub fn get<T: FromColumn, C: ColumnIndex>(&self, column: C) -> Result<T, SqlSessionError> {
        let value = self.value(column)?;
        T::from_column(value)
    }
}

/// Ways to address a column.
pub trait ColumnIndex {
    /// # Errors
    ///
    /// Returns `SqlSessionError::ColumnNotFound` when the column does not exist.
    fn resolve(&self, row: &Row<'_>) -> Result<usize, SqlSessionError>;
}

impl ColumnIndex for usize {
    fn resolve(&self, row: &Row<'_>) -> Result<usize, SqlSessionError> {
        if *self < row.column_count() {
            Ok(*self)
        } else {
            Err(SqlSessionError::ColumnNotFound(format!("index {self}")))
        }
    }
}

impl ColumnIndex for &str {
    fn resolve(&self, row: &Row<'_>) -> Result<usize, SqlSessionError> {
        row.column_names
            .iter()
            .position(|name| name == self)
            .or_else(|| {
                row.column_names
                    .iter()
                    .position(|name| name.eq_ignore_ascii_case(self))
            })
            .ok_or_else(|| SqlSessionError::ColumnNotFound((*self).to_string()))
    }
}

/// Conversion from a column value into a Rust type.
pub trait FromColumn: Sized {
    /// # Errors
    ///
    /// Returns `SqlSessionError::ConversionError` when `value` cannot become `Self`.
    fn from_column(value: SqlValue) -> Result<Self, SqlSessionError>;
}

fn mismatch(expected: &str, value: &SqlValue) -> SqlSessionError {
    SqlSessionError::ConversionError(format!("expected {expected}, found {value:?}"))
}

impl FromColumn for SqlValue {
    fn from_column(value: SqlValue) -> Result<Self, SqlSessionError> {
        Ok(value)
    }
}

impl<T: FromColumn> FromColumn for Option<T> {
    fn from_column(value: SqlValue) -> Result<Self, SqlSessionError> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_column(value).map(Some)
        }
    }
}

impl FromColumn for i64 {
    fn from_column(value: SqlValue) -> Result<Self, SqlSessionError> {
        value.as_i64().ok_or_else(|| mismatch("integer", &value))
    }
}

macro_rules! narrow_integer {
    ($($ty:ty),*) => {
        $(
            impl FromColumn for $ty {
                fn from_column(value: SqlValue) -> Result<Self, SqlSessionError> {
                    let wide = value.as_i64().ok_or_else(|| mismatch("integer", &value))?;
                    <$ty>::try_from(wide).map_err(|_| {
                        SqlSessionError::ConversionError(format!(
                            "{wide} does not fit in {}",
                            stringify!($ty)
                        ))
                    })
                }
            }
        )*
    };
}

narrow_integer!(i32, i16, i8);

impl FromColumn for f64 {
    fn from_column(value: SqlValue) -> Result<Self, SqlSessionError> {
        value.as_f64().ok_or_else(|| mismatch("number", &value))
    }
}

impl FromColumn for f32 {
    #[allow(clippy::cast_possible_truncation)]
    fn from_column(value: SqlValue) -> Result<Self, SqlSessionError> {
        match value {
            SqlValue::Real(v) => Ok(v),
            other => other
                .as_f64()
                .map(|v| v as f32)
                .ok_or_else(|| mismatch("number", &other)),
        }
    }
}

impl FromColumn for bool {
    fn from_column(value: SqlValue) -> Result<Self, SqlSessionError> {
        value.as_bool().ok_or_else(|| mismatch("boolean", &value))
    }
}

impl FromColumn for String {
    fn from_column(value: SqlValue) -> Result<Self, SqlSessionError> {
        match value {
            SqlValue::Text(s) => Ok(s),
            SqlValue::Decimal(d) => Ok(d.to_string()),
            SqlValue::Url(u) => Ok(u.to_string()),
            other => Err(mismatch("text", &other)),
        }
    }
}

impl FromColumn for Vec<u8> {
    fn from_column(value: SqlValue) -> Result<Self, SqlSessionError> {
        match value {
            SqlValue::Blob(bytes) => Ok(bytes),
            other => Err(mismatch("blob", &other)),
        }
    }
}

impl FromColumn for NaiveDateTime {
    fn from_column(value: SqlValue) -> Result<Self, SqlSessionError> {
        value
            .as_timestamp()
            .ok_or_else(|| mismatch("timestamp", &value))
    }
}

impl FromColumn for DateTime<FixedOffset> {
    fn from_column(value: SqlValue) -> Result<Self, SqlSessionError> {
        match value {
            SqlValue::TimestampTz(dt) => Ok(dt),
            SqlValue::Instant(dt) => Ok(dt.fixed_offset()),
            SqlValue::Text(ref s) => {
                DateTime::parse_from_rfc3339(s).map_err(|_| mismatch("offset timestamp", &value))
            }
            other => Err(mismatch("offset timestamp", &other)),
        }
    }
}

impl FromColumn for NaiveDate {
    fn from_column(value: SqlValue) -> Result<Self, SqlSessionError> {
        match value {
            SqlValue::Date(d) => Ok(d),
            SqlValue::Timestamp(dt) => Ok(dt.date()),
            SqlValue::Text(ref s) => {
                NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| mismatch("date", &value))
            }
            other => Err(mismatch("date", &other)),
        }
    }
}

impl FromColumn for JsonValue {
    fn from_column(value: SqlValue) -> Result<Self, SqlSessionError> {
        match value {
            SqlValue::Json(json) => Ok(json),
            SqlValue::Text(ref s) => serde_json::from_str(s).map_err(|e| {
                SqlSessionError::ConversionError(format!("column is not valid JSON: {e}"))
            }),
            other => Err(mismatch("json", &other)),
        }
    }
}
