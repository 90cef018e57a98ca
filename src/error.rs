use thiserror::Error;

#[derive(Debug, Error)]
pub enum SqlSessionError {
    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    /// Failure surfaced by a driver other than the bundled `SQLite` one, carried unmodified.
    #[error(transparent)]
    DriverError(Box<dyn std::error::Error + Send + Sync + 'static>),

    #[error("Missing named parameter: {0}")]
    MissingParameter(String),

    #[error("Cannot bind NULL at position {index}: no SQL type declared for the parameter")]
    AmbiguousNullType { index: usize },

    #[error("Parameter conversion error: {0}")]
    ParameterError(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Value conversion error: {0}")]
    ConversionError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),
}

impl SqlSessionError {
    /// Wrap an arbitrary driver failure without altering it.
    pub fn driver<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        SqlSessionError::DriverError(Box::new(err))
    }
}

