// SQLite driver for sessions, built on rusqlite.
//
// - config: connection options and builder
// - connection: the driver connection and transaction bracketing
// - statement: prepared statements, batches and generated keys
// - params: bind-value conversion into SQLite storage classes
// - query: streaming cursor and column extraction

pub mod config;
pub mod connection;
pub mod params;
pub mod query;
pub mod statement;

pub use config::{IN_MEMORY, SqliteOptions, SqliteOptionsBuilder};
pub use connection::{DRIVER_NAME, SqliteConnection};
pub use params::{array_to_json, sql_value_to_sqlite_value};
pub use query::{SqliteCursor, sqlite_extract_value};
pub use statement::{ROWID_KEY_COLUMN, SqliteStatement};
