//! Synchronous SQL sessions with named parameters, typed binding and scoped transactions.
//!
//! A [`Session`] wraps one driver connection. Statements are written with `:name`
//! placeholders (or plain `?` markers), bound from [`Parameter`] values, and run through one
//! of the execution shapes on [`QueryExecutor`]:
//!
//! ```rust
//! use sql_session::prelude::*;
//!
//! # fn main() -> Result<(), SqlSessionError> {
//! let mut session = Session::open_sqlite(SqliteOptions::in_memory(), SessionOptions::default())?;
//! session.execute(&Query::new("create table users (id integer primary key, name text)"))?;
//!
//! session.transaction(|tx| {
//!     tx.update(&Query::new("insert into users (name) values (:name)").bind_named("name", "ann"))?;
//!     tx.update(&Query::new("insert into users (name) values (:name)").bind_named("name", "bob"))
//! })?;
//!
//! let names = session.list(&Query::new("select name from users order by id"), |row| {
//!     row.get::<String, _>("name").map(Some)
//! })?;
//! assert_eq!(names, vec!["ann", "bob"]);
//! # Ok(())
//! # }
//! ```

pub mod driver;
pub mod error;
pub mod executor;
pub mod params;
pub mod prelude;
pub mod results;
pub mod session;
pub mod template;
pub mod types;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use driver::{
    BufferedCursor, DriverConnection, DriverCursor, DriverRow, DriverStatement, KeyRequest,
    ParameterSink,
};
pub use error::SqlSessionError;
pub use executor::{Action, ActionOutcome, Extractor, ResultQueryActionBuilder, StatementExecutor};
pub use params::Parameter;
pub use results::{ColumnIndex, FromColumn, Row, RowCursor};
pub use session::{
    QueryExecutor, Session, SessionOptions, SessionOptionsBuilder, SessionState,
    TransactionalSession,
};
pub use template::{Query, ReplacementMap, extract_named_parameters};
pub use types::{OpaqueValue, SqlDecimal, SqlType, SqlTyped, SqlValue};

#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteConnection, SqliteOptions, SqliteOptionsBuilder};
