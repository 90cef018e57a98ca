use crate::driver::ParameterSink;
use crate::error::SqlSessionError;
use crate::types::{SqlType, SqlTyped, SqlValue};

/// One statement parameter: a value plus the SQL type a NULL should be bound as.
///
/// Non-null values carry the type of their variant. A NULL only gets a type when one is
/// declared, either explicitly or through `Option<T>`:
/// ```rust
/// use sql_session::prelude::*;
///
/// let name: Option<String> = None;
/// let param = Parameter::from(name);
/// assert_eq!(param.sql_type(), Some(SqlType::Text));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    value: SqlValue,
    sql_type: Option<SqlType>,
}

impl Parameter {
    #[must_use]
    pub fn new(value: SqlValue) -> Self {
        let sql_type = value.sql_type();
        Self { value, sql_type }
    }

    /// A NULL bound as `sql_type`.
    #[must_use]
    pub fn null(sql_type: SqlType) -> Self {
        Self {
            value: SqlValue::Null,
            sql_type: Some(sql_type),
        }
    }

    /// A NULL typed after the Rust type `T`.
    #[must_use]
    pub fn null_of<T: SqlTyped>() -> Self {
        Self::null(T::sql_type())
    }

    /// Override the declared type. Only consulted when the value is NULL.
    #[must_use]
    pub fn with_type(mut self, sql_type: SqlType) -> Self {
        self.sql_type = Some(sql_type);
        self
    }

    #[must_use]
    pub fn value(&self) -> &SqlValue {
        &self.value
    }

    #[must_use]
    pub fn sql_type(&self) -> Option<SqlType> {
        self.sql_type
    }

    /// Bind this parameter at the 1-based `index` of `sink`.
    ///
    /// Every value variant selects exactly one bind call; values this crate does not model
    /// travel through [`SqlValue::Object`] to the driver's generic bind.
    ///
    /// # Errors
    ///
    /// Returns `SqlSessionError::AmbiguousNullType` for a NULL without a declared type, or
    /// whatever the driver reports for the bind itself.
    pub fn bind_to<S>(&self, sink: &mut S, index: usize) -> Result<(), SqlSessionError>
    where
        S: ParameterSink + ?Sized,
    {
        tracing::trace!(index, value = ?self.value, "binding parameter");
        match &self.value {
            SqlValue::Null => match self.sql_type {
                Some(sql_type) => sink.bind_null(index, sql_type),
                None => Err(SqlSessionError::AmbiguousNullType { index }),
            },
            SqlValue::Text(s) => sink.bind_text(index, s),
            SqlValue::TinyInt(v) => sink.bind_tiny_int(index, *v),
            SqlValue::Bool(v) => sink.bind_bool(index, *v),
            SqlValue::SmallInt(v) => sink.bind_small_int(index, *v),
            SqlValue::Int(v) => sink.bind_int(index, *v),
            SqlValue::BigInt(v) => sink.bind_big_int(index, *v),
            SqlValue::Real(v) => sink.bind_real(index, *v),
            SqlValue::Double(v) => sink.bind_double(index, *v),
            SqlValue::Timestamp(dt) => sink.bind_timestamp(index, *dt),
            SqlValue::TimestampTz(dt) => sink.bind_timestamp_tz(index, *dt),
            SqlValue::Instant(dt) => sink.bind_timestamp_tz(index, dt.fixed_offset()),
            SqlValue::Date(d) => sink.bind_date(index, *d),
            SqlValue::Time(t) => sink.bind_time(index, *t),
            SqlValue::Blob(bytes) => sink.bind_bytes(index, bytes),
            SqlValue::Decimal(d) => sink.bind_decimal(index, d),
            SqlValue::Array(items) => sink.bind_array(index, items),
            SqlValue::Url(url) => sink.bind_url(index, url),
            SqlValue::Json(json) => sink.bind_json(index, json),
            SqlValue::Object(obj) => sink.bind_object(index, obj),
        }
    }
}

impl From<SqlValue> for Parameter {
    fn from(value: SqlValue) -> Self {
        Parameter::new(value)
    }
}

impl<T> From<Option<T>> for Parameter
where
    T: Into<SqlValue> + SqlTyped,
{
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Parameter::new(v.into()),
            None => Parameter::null_of::<T>(),
        }
    }
}

macro_rules! parameter_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Parameter {
                fn from(value: $ty) -> Self {
                    Parameter::new(SqlValue::from(value))
                }
            }
        )*
    };
}

parameter_from!(
    String,
    &str,
    i8,
    bool,
    i16,
    i32,
    i64,
    u32,
    f32,
    f64,
    chrono::NaiveDateTime,
    chrono::DateTime<chrono::FixedOffset>,
    chrono::DateTime<chrono::Utc>,
    chrono::DateTime<chrono::Local>,
    chrono::NaiveDate,
    chrono::NaiveTime,
    std::time::SystemTime,
    Vec<u8>,
    &[u8],
    crate::types::SqlDecimal,
    Vec<SqlValue>,
    url::Url,
    serde_json::Value,
    crate::types::OpaqueValue,
);

/// Build a `Vec<Parameter>` from heterogeneous values.
///
/// ```rust
/// use sql_session::params;
///
/// let ps = params![1_i64, "two", None::<f64>];
/// assert_eq!(ps.len(), 3);
/// ```
#[macro_export]
macro_rules! params {
    () => {
        ::std::vec::Vec::<$crate::Parameter>::new()
    };
    ($($value:expr),+ $(,)?) => {
        ::std::vec![$($crate::Parameter::from($value)),+]
    };
}

/// Build a `HashMap<String, Parameter>` for named binding.
///
/// ```rust
/// use sql_session::named_params;
///
/// let map = named_params! { "id" => 7_i64, "name" => "bob" };
/// assert_eq!(map.len(), 2);
/// ```
#[macro_export]
macro_rules! named_params {
    () => {
        ::std::collections::HashMap::<::std::string::String, $crate::Parameter>::new()
    };
    ($($name:expr => $value:expr),+ $(,)?) => {{
        let mut map =
            ::std::collections::HashMap::<::std::string::String, $crate::Parameter>::new();
        $(
            map.insert(::std::string::String::from($name), $crate::Parameter::from($value));
        )+
        map
    }};
}
