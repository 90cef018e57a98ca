use serde::{Deserialize, Serialize};

use crate::error::SqlSessionError;

/// Options a [`Session`](super::Session) applies to every statement it prepares.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionOptions {
    /// Ask the driver for generated keys on every prepared statement.
    pub return_generated_keys: bool,
    /// Key columns for drivers that need them named explicitly.
    pub auto_generated_keys: Vec<String>,
    /// Statement timeout handed to the driver, in seconds.
    pub query_timeout_secs: Option<u64>,
}

impl SessionOptions {
    #[must_use]
    pub fn builder() -> SessionOptionsBuilder {
        SessionOptionsBuilder::default()
    }

    /// Parse options from a JSON document. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns `SqlSessionError::ConfigError` if the document is not valid options JSON.
    pub fn from_json(json: &str) -> Result<Self, SqlSessionError> {
        serde_json::from_str(json)
            .map_err(|e| SqlSessionError::ConfigError(format!("invalid session options: {e}")))
    }
}

/// Fluent builder for [`SessionOptions`].
#[derive(Debug, Clone, Default)]
pub struct SessionOptionsBuilder {
    opts: SessionOptions,
}

impl SessionOptionsBuilder {
    #[must_use]
    pub fn return_generated_keys(mut self, enabled: bool) -> Self {
        self.opts.return_generated_keys = enabled;
        self
    }

    #[must_use]
    pub fn auto_generated_keys<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.opts.auto_generated_keys = columns.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn query_timeout_secs(mut self, seconds: u64) -> Self {
        self.opts.query_timeout_secs = Some(seconds);
        self
    }

    #[must_use]
    pub fn finish(self) -> SessionOptions {
        self.opts
    }
}
