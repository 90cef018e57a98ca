//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and traits
//! to make it easier to get started with the library.

pub use crate::error::SqlSessionError;
pub use crate::executor::{Action, ActionOutcome};
pub use crate::params::Parameter;
pub use crate::results::{FromColumn, Row, RowCursor};
pub use crate::session::{
    QueryExecutor, Session, SessionOptions, SessionState, TransactionalSession,
};
pub use crate::template::Query;
pub use crate::types::{OpaqueValue, SqlDecimal, SqlType, SqlValue};
pub use crate::{named_params, params};

#[cfg(feature = "sqlite")]
pub use crate::sqlite::{SqliteConnection, SqliteOptions};
