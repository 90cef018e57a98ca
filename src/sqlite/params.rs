use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::types::Value;
use serde_json::Value as JsonValue;

use crate::driver::ParameterSink;
use crate::error::SqlSessionError;
use crate::types::{OpaqueValue, SqlType, SqlValue};

use super::statement::SqliteStatement;

/// Text form of a timestamp without offset, as stored in `SQLite`.
pub const TIMESTAMP_FORMAT: &str = "%F %T%.f";
const TIME_FORMAT: &str = "%T%.f";

/// Convert one bound value to the `rusqlite` value it is stored as.
///
/// # Errors
///
/// Returns `SqlSessionError::ParameterError` for values `SQLite` has no representation for.
pub fn sql_value_to_sqlite_value(value: &SqlValue) -> Result<Value, SqlSessionError> {
    Ok(match value {
        SqlValue::Null => Value::Null,
        SqlValue::Text(s) => Value::Text(s.clone()),
        SqlValue::TinyInt(v) => Value::Integer(i64::from(*v)),
        SqlValue::Bool(b) => Value::Integer(i64::from(*b)),
        SqlValue::SmallInt(v) => Value::Integer(i64::from(*v)),
        SqlValue::Int(v) => Value::Integer(i64::from(*v)),
        SqlValue::BigInt(v) => Value::Integer(*v),
        SqlValue::Real(v) => Value::Real(f64::from(*v)),
        SqlValue::Double(v) => Value::Real(*v),
        SqlValue::Timestamp(dt) => Value::Text(dt.format(TIMESTAMP_FORMAT).to_string()),
        SqlValue::TimestampTz(dt) => Value::Text(dt.to_rfc3339()),
        SqlValue::Instant(dt) => Value::Text(dt.to_rfc3339()),
        SqlValue::Date(d) => Value::Text(d.format("%F").to_string()),
        SqlValue::Time(t) => Value::Text(t.format(TIME_FORMAT).to_string()),
        SqlValue::Blob(bytes) => Value::Blob(bytes.clone()),
        SqlValue::Decimal(d) => Value::Text(d.to_string()),
        SqlValue::Array(items) => Value::Text(array_to_json(items)?.to_string()),
        SqlValue::Url(url) => Value::Text(url.to_string()),
        SqlValue::Json(json) => Value::Text(json.to_string()),
        SqlValue::Object(obj) => opaque_to_sqlite_value(obj)?,
    })
}

/// `SQLite` has no array type; arrays are stored as JSON array text.
///
/// # Errors
///
/// Returns `SqlSessionError::ParameterError` for elements with no JSON form.
pub fn array_to_json(items: &[SqlValue]) -> Result<JsonValue, SqlSessionError> {
    items
        .iter()
        .map(element_to_json)
        .collect::<Result<Vec<_>, _>>()
        .map(JsonValue::Array)
}

fn element_to_json(value: &SqlValue) -> Result<JsonValue, SqlSessionError> {
    let json = match value {
        SqlValue::Null => JsonValue::Null,
        SqlValue::Bool(b) => JsonValue::Bool(*b),
        SqlValue::Real(v) => float_to_json(f64::from(*v))?,
        SqlValue::Double(v) => float_to_json(*v)?,
        SqlValue::Array(items) => array_to_json(items)?,
        SqlValue::Json(json) => json.clone(),
        SqlValue::Object(obj) => {
            return Err(SqlSessionError::ParameterError(format!(
                "cannot store {} inside an array",
                obj.type_name()
            )));
        }
        other => match sql_value_to_sqlite_value(other)? {
            Value::Integer(i) => JsonValue::from(i),
            Value::Text(s) => JsonValue::String(s),
            Value::Blob(bytes) => JsonValue::from(bytes),
            Value::Real(f) => float_to_json(f)?,
            Value::Null => JsonValue::Null,
        },
    };
    Ok(json)
}

fn float_to_json(value: f64) -> Result<JsonValue, SqlSessionError> {
    serde_json::Number::from_f64(value)
        .map(JsonValue::Number)
        .ok_or_else(|| SqlSessionError::ParameterError(format!("{value} has no JSON form")))
}

fn opaque_to_sqlite_value(obj: &OpaqueValue) -> Result<Value, SqlSessionError> {
    if let Some(value) = obj.downcast_ref::<Value>() {
        Ok(value.clone())
    } else if let Some(text) = obj.downcast_ref::<String>() {
        Ok(Value::Text(text.clone()))
    } else {
        Err(SqlSessionError::ParameterError(format!(
            "the SQLite driver cannot bind a value of type {}",
            obj.type_name()
        )))
    }
}

impl ParameterSink for SqliteStatement<'_> {
    fn bind_null(&mut self, index: usize, _sql_type: SqlType) -> Result<(), SqlSessionError> {
        self.set(index, Value::Null)
    }

    fn bind_text(&mut self, index: usize, value: &str) -> Result<(), SqlSessionError> {
        self.set(index, Value::Text(value.to_owned()))
    }

    fn bind_tiny_int(&mut self, index: usize, value: i8) -> Result<(), SqlSessionError> {
        self.set(index, Value::Integer(i64::from(value)))
    }

    fn bind_bool(&mut self, index: usize, value: bool) -> Result<(), SqlSessionError> {
        self.set(index, Value::Integer(i64::from(value)))
    }

    fn bind_small_int(&mut self, index: usize, value: i16) -> Result<(), SqlSessionError> {
        self.set(index, Value::Integer(i64::from(value)))
    }

    fn bind_int(&mut self, index: usize, value: i32) -> Result<(), SqlSessionError> {
        self.set(index, Value::Integer(i64::from(value)))
    }

    fn bind_big_int(&mut self, index: usize, value: i64) -> Result<(), SqlSessionError> {
        self.set(index, Value::Integer(value))
    }

    fn bind_real(&mut self, index: usize, value: f32) -> Result<(), SqlSessionError> {
        self.set(index, Value::Real(f64::from(value)))
    }

    fn bind_double(&mut self, index: usize, value: f64) -> Result<(), SqlSessionError> {
        self.set(index, Value::Real(value))
    }

    fn bind_timestamp(
        &mut self,
        index: usize,
        value: NaiveDateTime,
    ) -> Result<(), SqlSessionError> {
        self.set(index, Value::Text(value.format(TIMESTAMP_FORMAT).to_string()))
    }

    fn bind_timestamp_tz(
        &mut self,
        index: usize,
        value: DateTime<FixedOffset>,
    ) -> Result<(), SqlSessionError> {
        self.set(index, Value::Text(value.to_rfc3339()))
    }

    fn bind_date(&mut self, index: usize, value: NaiveDate) -> Result<(), SqlSessionError> {
        self.set(index, Value::Text(value.format("%F").to_string()))
    }

    fn bind_time(&mut self, index: usize, value: NaiveTime) -> Result<(), SqlSessionError> {
        self.set(index, Value::Text(value.format(TIME_FORMAT).to_string()))
    }

    fn bind_bytes(&mut self, index: usize, value: &[u8]) -> Result<(), SqlSessionError> {
        self.set(index, Value::Blob(value.to_vec()))
    }

    fn bind_array(&mut self, index: usize, items: &[SqlValue]) -> Result<(), SqlSessionError> {
        let json = array_to_json(items)?;
        self.set(index, Value::Text(json.to_string()))
    }

    fn bind_object(&mut self, index: usize, value: &OpaqueValue) -> Result<(), SqlSessionError> {
        let value = opaque_to_sqlite_value(value)?;
        self.set(index, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn temporal_values_use_sqlite_text_forms() {
        let dt = NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_hms_milli_opt(5, 6, 7, 80)
            .unwrap();
        assert_eq!(
            sql_value_to_sqlite_value(&SqlValue::Timestamp(dt)).unwrap(),
            Value::Text("2024-03-04 05:06:07.080".into())
        );
        assert_eq!(
            sql_value_to_sqlite_value(&SqlValue::Date(dt.date())).unwrap(),
            Value::Text("2024-03-04".into())
        );
        assert_eq!(
            sql_value_to_sqlite_value(&SqlValue::Bool(true)).unwrap(),
            Value::Integer(1)
        );
    }

    #[test]
    fn arrays_become_json_text() {
        let items = vec![
            SqlValue::BigInt(1),
            SqlValue::Text("a".into()),
            SqlValue::Null,
            SqlValue::Array(vec![SqlValue::Bool(false)]),
        ];
        assert_eq!(
            sql_value_to_sqlite_value(&SqlValue::Array(items)).unwrap(),
            Value::Text(r#"[1,"a",null,[false]]"#.into())
        );
    }

    #[test]
    fn opaque_values_must_be_sqlite_native() {
        let native = OpaqueValue::new(Value::Integer(7));
        assert_eq!(
            sql_value_to_sqlite_value(&SqlValue::Object(native)).unwrap(),
            Value::Integer(7)
        );
        let foreign = OpaqueValue::new(7_u128);
        assert!(matches!(
            sql_value_to_sqlite_value(&SqlValue::Object(foreign)),
            Err(SqlSessionError::ParameterError(_))
        ));
        assert!(matches!(
            array_to_json(&[SqlValue::Double(f64::NAN)]),
            Err(SqlSessionError::ParameterError(_))
        ));
    }
}
