use serde::{Deserialize, Serialize};

use crate::error::SqlSessionError;

use super::connection::SqliteConnection;

/// Path used for a private in-memory database.
pub const IN_MEMORY: &str = ":memory:";

/// Options for opening a `SQLite` connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqliteOptions {
    pub db_path: String,
    /// Apply `PRAGMA journal_mode = WAL` after opening.
    #[serde(default = "default_wal")]
    pub journal_mode_wal: bool,
    /// Apply `PRAGMA foreign_keys = ON` after opening.
    #[serde(default)]
    pub foreign_keys: bool,
}

fn default_wal() -> bool {
    true
}

impl SqliteOptions {
    #[must_use]
    pub fn new(db_path: String) -> Self {
        Self {
            db_path,
            journal_mode_wal: true,
            foreign_keys: false,
        }
    }

    /// A private in-memory database. WAL does not apply to it, so it stays off.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            db_path: IN_MEMORY.to_string(),
            journal_mode_wal: false,
            foreign_keys: false,
        }
    }

    #[must_use]
    pub fn builder(db_path: String) -> SqliteOptionsBuilder {
        SqliteOptionsBuilder::new(db_path)
    }

    #[must_use]
    pub fn is_in_memory(&self) -> bool {
        self.db_path == IN_MEMORY
    }

    /// Pragmas to run once the connection is open.
    pub(crate) fn pragmas(&self) -> String {
        let mut pragmas = String::new();
        if self.journal_mode_wal && !self.is_in_memory() {
            pragmas.push_str("PRAGMA journal_mode = WAL;\n");
        }
        if self.foreign_keys {
            pragmas.push_str("PRAGMA foreign_keys = ON;\n");
        }
        pragmas
    }
}

/// Fluent builder for `SQLite` options.
#[derive(Debug, Clone)]
pub struct SqliteOptionsBuilder {
    opts: SqliteOptions,
}

impl SqliteOptionsBuilder {
    #[must_use]
    pub fn new(db_path: String) -> Self {
        Self {
            opts: SqliteOptions::new(db_path),
        }
    }

    #[must_use]
    pub fn journal_mode_wal(mut self, enabled: bool) -> Self {
        self.opts.journal_mode_wal = enabled;
        self
    }

    #[must_use]
    pub fn foreign_keys(mut self, enabled: bool) -> Self {
        self.opts.foreign_keys = enabled;
        self
    }

    #[must_use]
    pub fn finish(self) -> SqliteOptions {
        self.opts
    }

    /// Open a connection with the collected options.
    ///
    /// # Errors
    ///
    /// Returns `SqlSessionError::SqliteError` if opening or configuring the database fails.
    pub fn build(self) -> Result<SqliteConnection, SqlSessionError> {
        SqliteConnection::from_options(&self.finish())
    }
}
