#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use sql_session::driver::{
    BufferedCursor, DriverConnection, DriverCursor, DriverStatement, KeyRequest, ParameterSink,
};
use sql_session::{OpaqueValue, Session, SessionOptions, SqlSessionError, SqlType, SqlValue};

/// Canned driver behavior for one connection.
#[derive(Debug, Clone, Default)]
pub struct Script {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<SqlValue>>,
    pub affected: u64,
    pub generated_key: Option<i64>,
    pub fail_begin: bool,
    pub fail_commit: bool,
    pub fail_rollback: bool,
}

/// Everything the mock driver was asked to do, in order.
#[derive(Debug, Default)]
pub struct Journal {
    pub events: Vec<String>,
}

impl Journal {
    pub fn count(&self, event: &str) -> usize {
        self.events.iter().filter(|e| e.as_str() == event).count()
    }

    pub fn starting_with(&self, prefix: &str) -> Vec<String> {
        self.events
            .iter()
            .filter(|e| e.starts_with(prefix))
            .cloned()
            .collect()
    }
}

pub type SharedJournal = Arc<Mutex<Journal>>;

fn record(journal: &SharedJournal, event: String) {
    if let Ok(mut j) = journal.lock() {
        j.events.push(event);
    }
}

pub fn journal_count(journal: &SharedJournal, event: &str) -> usize {
    journal.lock().map(|j| j.count(event)).unwrap_or_default()
}

pub fn journal_events(journal: &SharedJournal, prefix: &str) -> Vec<String> {
    journal
        .lock()
        .map(|j| j.starting_with(prefix))
        .unwrap_or_default()
}

#[derive(Debug, thiserror::Error)]
#[error("mock driver failure: {0}")]
pub struct MockFailure(pub &'static str);

pub struct MockConnection {
    pub name: String,
    pub script: Script,
    pub journal: SharedJournal,
}

impl MockConnection {
    pub fn new(script: Script) -> (Self, SharedJournal) {
        let journal = SharedJournal::default();
        let conn = Self {
            name: "mock".into(),
            script,
            journal: Arc::clone(&journal),
        };
        (conn, journal)
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }
}

/// A session over a mock connection plus the journal it writes to.
pub fn mock_session(script: Script, options: SessionOptions) -> (Session, SharedJournal) {
    let (conn, journal) = MockConnection::new(script);
    (Session::new(conn, options), journal)
}

impl DriverConnection for MockConnection {
    fn driver_name(&self) -> &str {
        &self.name
    }

    fn prepare<'c>(
        &'c mut self,
        sql: &str,
        keys: KeyRequest<'_>,
    ) -> Result<Box<dyn DriverStatement + 'c>, SqlSessionError> {
        let keys_label = match keys {
            KeyRequest::None => "plain".to_string(),
            KeyRequest::ReturnGeneratedKeys => "keys".to_string(),
            KeyRequest::Columns(cols) => format!("columns[{}]", cols.join(",")),
        };
        record(&self.journal, format!("prepare({keys_label}) {sql}"));
        Ok(Box::new(MockStatement {
            script: self.script.clone(),
            journal: Arc::clone(&self.journal),
            keys_requested: keys.is_requested(),
            batch: 0,
        }))
    }

    fn begin(&mut self) -> Result<(), SqlSessionError> {
        record(&self.journal, "begin".into());
        if self.script.fail_begin {
            return Err(SqlSessionError::driver(MockFailure("begin")));
        }
        Ok(())
    }

    fn commit(&mut self) -> Result<(), SqlSessionError> {
        record(&self.journal, "commit".into());
        if self.script.fail_commit {
            return Err(SqlSessionError::driver(MockFailure("commit")));
        }
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), SqlSessionError> {
        record(&self.journal, "rollback".into());
        if self.script.fail_rollback {
            return Err(SqlSessionError::driver(MockFailure("rollback")));
        }
        Ok(())
    }

    fn close(self: Box<Self>) -> Result<(), SqlSessionError> {
        record(&self.journal, "close".into());
        Ok(())
    }
}

pub struct MockStatement {
    script: Script,
    journal: SharedJournal,
    keys_requested: bool,
    batch: usize,
}

impl MockStatement {
    fn bind(&mut self, index: usize, value: String) -> Result<(), SqlSessionError> {
        record(&self.journal, format!("bind {index}={value}"));
        Ok(())
    }
}

impl Drop for MockStatement {
    fn drop(&mut self) {
        record(&self.journal, "close statement".into());
    }
}

impl ParameterSink for MockStatement {
    fn bind_null(&mut self, index: usize, sql_type: SqlType) -> Result<(), SqlSessionError> {
        self.bind(index, format!("null:{sql_type:?}"))
    }
    fn bind_text(&mut self, index: usize, value: &str) -> Result<(), SqlSessionError> {
        self.bind(index, format!("text:{value}"))
    }
    fn bind_tiny_int(&mut self, index: usize, value: i8) -> Result<(), SqlSessionError> {
        self.bind(index, format!("tiny:{value}"))
    }
    fn bind_bool(&mut self, index: usize, value: bool) -> Result<(), SqlSessionError> {
        self.bind(index, format!("bool:{value}"))
    }
    fn bind_small_int(&mut self, index: usize, value: i16) -> Result<(), SqlSessionError> {
        self.bind(index, format!("small:{value}"))
    }
    fn bind_int(&mut self, index: usize, value: i32) -> Result<(), SqlSessionError> {
        self.bind(index, format!("int:{value}"))
    }
    fn bind_big_int(&mut self, index: usize, value: i64) -> Result<(), SqlSessionError> {
        self.bind(index, format!("bigint:{value}"))
    }
    fn bind_real(&mut self, index: usize, value: f32) -> Result<(), SqlSessionError> {
        self.bind(index, format!("real:{value}"))
    }
    fn bind_double(&mut self, index: usize, value: f64) -> Result<(), SqlSessionError> {
        self.bind(index, format!("double:{value}"))
    }
    fn bind_timestamp(
        &mut self,
        index: usize,
        value: NaiveDateTime,
    ) -> Result<(), SqlSessionError> {
        self.bind(index, format!("timestamp:{value}"))
    }
    fn bind_timestamp_tz(
        &mut self,
        index: usize,
        value: DateTime<FixedOffset>,
    ) -> Result<(), SqlSessionError> {
        self.bind(index, format!("timestamptz:{value}"))
    }
    fn bind_date(&mut self, index: usize, value: NaiveDate) -> Result<(), SqlSessionError> {
        self.bind(index, format!("date:{value}"))
    }
    fn bind_time(&mut self, index: usize, value: NaiveTime) -> Result<(), SqlSessionError> {
        self.bind(index, format!("time:{value}"))
    }
    fn bind_bytes(&mut self, index: usize, value: &[u8]) -> Result<(), SqlSessionError> {
        self.bind(index, format!("bytes:{}", value.len()))
    }
    fn bind_array(&mut self, index: usize, items: &[SqlValue]) -> Result<(), SqlSessionError> {
        self.bind(index, format!("array:{}", items.len()))
    }
    fn bind_object(&mut self, index: usize, value: &OpaqueValue) -> Result<(), SqlSessionError> {
        self.bind(index, format!("object:{}", value.type_name()))
    }
}

impl DriverStatement for MockStatement {
    fn set_query_timeout(&mut self, seconds: u64) -> Result<(), SqlSessionError> {
        record(&self.journal, format!("timeout {seconds}"));
        Ok(())
    }

    fn query(&mut self) -> Result<Box<dyn DriverCursor + '_>, SqlSessionError> {
        record(&self.journal, "query".into());
        Ok(Box::new(RecordingCursor {
            inner: BufferedCursor::new(self.script.columns.clone(), self.script.rows.clone()),
            journal: Arc::clone(&self.journal),
        }))
    }

    fn execute(&mut self) -> Result<bool, SqlSessionError> {
        record(&self.journal, "execute".into());
        Ok(!self.script.columns.is_empty())
    }

    fn execute_update(&mut self) -> Result<u64, SqlSessionError> {
        record(&self.journal, "execute_update".into());
        Ok(self.script.affected)
    }

    fn generated_keys(&mut self) -> Result<Box<dyn DriverCursor + '_>, SqlSessionError> {
        record(&self.journal, "generated_keys".into());
        if !self.keys_requested {
            return Err(SqlSessionError::ExecutionError("keys not requested".into()));
        }
        let rows = self
            .script
            .generated_key
            .map(|key| vec![vec![SqlValue::BigInt(key)]])
            .unwrap_or_default();
        Ok(Box::new(BufferedCursor::new(vec!["id".into()], rows)))
    }

    fn add_batch(&mut self) -> Result<(), SqlSessionError> {
        record(&self.journal, "add_batch".into());
        self.batch += 1;
        Ok(())
    }

    fn execute_batch(&mut self) -> Result<Vec<u64>, SqlSessionError> {
        record(&self.journal, "execute_batch".into());
        Ok(vec![self.script.affected; std::mem::take(&mut self.batch)])
    }
}

/// Buffered cursor that logs when it is released.
struct RecordingCursor {
    inner: BufferedCursor,
    journal: SharedJournal,
}

impl DriverCursor for RecordingCursor {
    fn column_names(&self) -> &[String] {
        self.inner.column_names()
    }

    fn advance(&mut self) -> Result<Option<&dyn sql_session::DriverRow>, SqlSessionError> {
        self.inner.advance()
    }
}

impl Drop for RecordingCursor {
    fn drop(&mut self) {
        record(&self.journal, "close cursor".into());
    }
}
