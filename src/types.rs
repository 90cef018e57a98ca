use std::any::Any;
use std::fmt;
use std::io::Read;
use std::str::FromStr;
use std::sync::Arc;
use std::time::SystemTime;

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use url::Url;

use crate::error::SqlSessionError;

/// Values that can be bound as statement parameters or read back from a row.
///
/// The set is closed: every variant has exactly one bind call on
/// [`ParameterSink`](crate::driver::ParameterSink), and [`SqlValue::Object`] forwards anything
/// else to the driver untouched.
/// ```rust
/// use sql_session::prelude::*;
///
/// let values = vec![
///     SqlValue::from(1_i64),
///     SqlValue::from("alice"),
///     SqlValue::from(true),
/// ];
/// # let _ = values;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// NULL value
    Null,
    /// Text/string value
    Text(String),
    /// Single signed byte
    TinyInt(i8),
    /// Boolean value
    Bool(bool),
    /// 16-bit integer
    SmallInt(i16),
    /// 32-bit integer
    Int(i32),
    /// 64-bit integer
    BigInt(i64),
    /// 32-bit float
    Real(f32),
    /// 64-bit float
    Double(f64),
    /// Local date-time without an offset
    Timestamp(NaiveDateTime),
    /// Zoned or offset date-time
    TimestampTz(DateTime<FixedOffset>),
    /// A point on the UTC timeline
    Instant(DateTime<Utc>),
    /// Calendar date
    Date(NaiveDate),
    /// Time of day
    Time(NaiveTime),
    /// Binary data
    Blob(Vec<u8>),
    /// Arbitrary-precision decimal
    Decimal(SqlDecimal),
    /// Driver-level array
    Array(Vec<SqlValue>),
    /// Locator
    Url(Url),
    /// JSON document
    Json(JsonValue),
    /// Opaque value passed through to the driver's generic bind
    Object(OpaqueValue),
}

impl SqlValue {
    /// Read a byte stream fully into a [`SqlValue::Blob`].
    ///
    /// # Errors
    ///
    /// Returns `SqlSessionError::ParameterError` if reading the stream fails.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self, SqlSessionError> {
        let mut buf = Vec::new();
        reader
            .read_to_end(&mut buf)
            .map_err(|e| SqlSessionError::ParameterError(format!("failed to read stream: {e}")))?;
        Ok(SqlValue::Blob(buf))
    }

    /// Check if this value is NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The SQL type this value binds as, or `None` for NULL.
    #[must_use]
    pub fn sql_type(&self) -> Option<SqlType> {
        let ty = match self {
            SqlValue::Null => return None,
            SqlValue::Text(_) => SqlType::Text,
            SqlValue::TinyInt(_) => SqlType::TinyInt,
            SqlValue::Bool(_) => SqlType::Boolean,
            SqlValue::SmallInt(_) => SqlType::SmallInt,
            SqlValue::Int(_) => SqlType::Integer,
            SqlValue::BigInt(_) => SqlType::BigInt,
            SqlValue::Real(_) => SqlType::Real,
            SqlValue::Double(_) => SqlType::Double,
            SqlValue::Timestamp(_) => SqlType::Timestamp,
            SqlValue::TimestampTz(_) | SqlValue::Instant(_) => SqlType::TimestampTz,
            SqlValue::Date(_) => SqlType::Date,
            SqlValue::Time(_) => SqlType::Time,
            SqlValue::Blob(_) => SqlType::Binary,
            SqlValue::Decimal(_) => SqlType::Decimal,
            SqlValue::Array(_) => SqlType::Array,
            SqlValue::Url(_) => SqlType::Url,
            SqlValue::Json(_) => SqlType::Json,
            SqlValue::Object(_) => SqlType::Other,
        };
        Some(ty)
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::TinyInt(v) => Some(i64::from(*v)),
            SqlValue::SmallInt(v) => Some(i64::from(*v)),
            SqlValue::Int(v) => Some(i64::from(*v)),
            SqlValue::BigInt(v) => Some(*v),
            SqlValue::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let SqlValue::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        if let SqlValue::Bool(value) = self {
            return Some(*value);
        } else if let Some(i) = self.as_i64() {
            if i == 1 {
                return Some(true);
            } else if i == 0 {
                return Some(false);
            }
        }
        None
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SqlValue::Double(v) => Some(*v),
            SqlValue::Real(v) => Some(f64::from(*v)),
            #[allow(clippy::cast_precision_loss)]
            other => other.as_i64().map(|i| i as f64),
        }
    }

    #[must_use]
    pub fn as_blob(&self) -> Option<&[u8]> {
        if let SqlValue::Blob(bytes) = self {
            Some(bytes)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            SqlValue::Timestamp(value) => Some(*value),
            SqlValue::TimestampTz(value) => Some(value.naive_utc()),
            SqlValue::Instant(value) => Some(value.naive_utc()),
            SqlValue::Text(s) => {
                // Try "YYYY-MM-DD HH:MM:SS"
                if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
                    return Some(dt);
                }
                // Try "YYYY-MM-DD HH:MM:SS.fff"
                if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
                    return Some(dt);
                }
                None
            }
            _ => None,
        }
    }
}

/// Declared SQL type of a parameter, used to bind a correctly typed NULL.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SqlType {
    Text,
    TinyInt,
    Boolean,
    SmallInt,
    Integer,
    BigInt,
    Real,
    Double,
    Timestamp,
    TimestampTz,
    Date,
    Time,
    Binary,
    Decimal,
    Array,
    Url,
    Json,
    Other,
}

/// Rust types with a fixed SQL type, so `None::<T>` can bind a typed NULL.
pub trait SqlTyped {
    fn sql_type() -> SqlType;
}

macro_rules! sql_value_from {
    ($($ty:ty => $variant:ident, $sql:ident;)*) => {
        $(
            impl From<$ty> for SqlValue {
                fn from(value: $ty) -> Self {
                    SqlValue::$variant(value.into())
                }
            }

            impl SqlTyped for $ty {
                fn sql_type() -> SqlType {
                    SqlType::$sql
                }
            }
        )*
    };
}

sql_value_from! {
    String => Text, Text;
    &str => Text, Text;
    i8 => TinyInt, TinyInt;
    bool => Bool, Boolean;
    i16 => SmallInt, SmallInt;
    i32 => Int, Integer;
    i64 => BigInt, BigInt;
    u32 => BigInt, BigInt;
    f32 => Real, Real;
    f64 => Double, Double;
    NaiveDateTime => Timestamp, Timestamp;
    DateTime<FixedOffset> => TimestampTz, TimestampTz;
    DateTime<Utc> => Instant, TimestampTz;
    NaiveDate => Date, Date;
    NaiveTime => Time, Time;
    Vec<u8> => Blob, Binary;
    &[u8] => Blob, Binary;
    SqlDecimal => Decimal, Decimal;
    Vec<SqlValue> => Array, Array;
    Url => Url, Url;
    JsonValue => Json, Json;
    OpaqueValue => Object, Other;
}

impl From<DateTime<Local>> for SqlValue {
    fn from(value: DateTime<Local>) -> Self {
        SqlValue::TimestampTz(value.fixed_offset())
    }
}

impl SqlTyped for DateTime<Local> {
    fn sql_type() -> SqlType {
        SqlType::TimestampTz
    }
}

impl From<SystemTime> for SqlValue {
    fn from(value: SystemTime) -> Self {
        SqlValue::Instant(DateTime::<Utc>::from(value))
    }
}

impl SqlTyped for SystemTime {
    fn sql_type() -> SqlType {
        SqlType::TimestampTz
    }
}

/// Arbitrary-precision decimal kept in its canonical textual form.
///
/// Accepts an optional sign, digits with at most one decimal point, and an optional exponent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SqlDecimal(String);

impl SqlDecimal {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for SqlDecimal {
    type Err = SqlSessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SqlSessionError::ParameterError(format!("invalid decimal literal: {s:?}"));
        let trimmed = s.trim();
        let unsigned = trimmed
            .strip_prefix(['+', '-'])
            .unwrap_or(trimmed);
        let (mantissa, exponent) = match unsigned.find(['e', 'E']) {
            Some(pos) => (&unsigned[..pos], Some(&unsigned[pos + 1..])),
            None => (unsigned, None),
        };

        let mut digits = 0;
        let mut points = 0;
        for b in mantissa.bytes() {
            match b {
                b'0'..=b'9' => digits += 1,
                b'.' => points += 1,
                _ => return Err(invalid()),
            }
        }
        if digits == 0 || points > 1 {
            return Err(invalid());
        }
        if let Some(exp) = exponent {
            let exp_digits = exp.strip_prefix(['+', '-']).unwrap_or(exp);
            if exp_digits.is_empty() || !exp_digits.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
        }
        Ok(SqlDecimal(trimmed.to_string()))
    }
}

impl From<i64> for SqlDecimal {
    fn from(value: i64) -> Self {
        SqlDecimal(value.to_string())
    }
}

impl fmt::Display for SqlDecimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A value of a type this crate does not model, forwarded to the driver's generic bind.
///
/// Drivers recover the concrete type with [`OpaqueValue::downcast_ref`].
#[derive(Clone)]
pub struct OpaqueValue {
    inner: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl OpaqueValue {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            inner: Arc::new(value),
            type_name: std::any::type_name::<T>(),
        }
    }

    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Debug for OpaqueValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpaqueValue")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

impl PartialEq for OpaqueValue {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_literals() {
        for ok in ["0", "-12.50", "+3.", ".5", "1e10", "6.02E-23"] {
            assert!(ok.parse::<SqlDecimal>().is_ok(), "{ok}");
        }
        for bad in ["", "-", "1.2.3", "abc", "1e", "1e+x", "."] {
            assert!(bad.parse::<SqlDecimal>().is_err(), "{bad}");
        }
    }

    #[test]
    fn system_time_is_an_instant() {
        let value = SqlValue::from(SystemTime::UNIX_EPOCH);
        assert_eq!(value, SqlValue::Instant(DateTime::<Utc>::UNIX_EPOCH));
        assert_eq!(value.sql_type(), Some(SqlType::TimestampTz));
    }

    #[test]
    fn reader_becomes_blob() {
        let value = SqlValue::from_reader(&b"\x00\x01\x02"[..]).unwrap();
        assert_eq!(value.as_blob(), Some(&[0_u8, 1, 2][..]));
    }

    #[test]
    fn bool_accepts_integer_flags() {
        assert_eq!(SqlValue::BigInt(1).as_bool(), Some(true));
        assert_eq!(SqlValue::Int(0).as_bool(), Some(false));
        assert_eq!(SqlValue::BigInt(2).as_bool(), None);
    }

    #[test]
    fn null_has_no_type() {
        assert_eq!(SqlValue::Null.sql_type(), None);
        assert_eq!(SqlValue::from("x").sql_type(), Some(SqlType::Text));
    }

    #[test]
    fn opaque_values_compare_by_identity() {
        let a = OpaqueValue::new(42_u128);
        let b = a.clone();
        assert_eq!(a, b);
        assert_ne!(a, OpaqueValue::new(42_u128));
        assert_eq!(a.downcast_ref::<u128>(), Some(&42));
    }
}
