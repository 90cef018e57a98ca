use std::fmt::Display;

use crate::error::SqlSessionError;
use crate::executor::StatementExecutor;

use super::{QueryExecutor, Session, SessionState};

/// The session handed to a [`Session::transaction`] body.
///
/// It runs statements on the same connection as its parent without the misuse warning.
/// Dropping it before the body's result is settled (a panic) rolls back; the parent always
/// returns to [`SessionState::Idle`].
pub struct TransactionalSession<'s> {
    session: &'s mut Session,
    finished: bool,
}

impl Session {
    /// Run `op` inside a transaction.
    ///
    /// `Ok` commits. `Err` rolls back and returns the same error unchanged; a rollback that
    /// fails as well is logged. A failed commit is rolled back and its error returned.
    ///
    /// ```rust,no_run
    /// use sql_session::prelude::*;
    ///
    /// # fn demo(session: &mut Session) -> Result<(), SqlSessionError> {
    /// session.transaction(|tx| {
    ///     tx.update(&Query::new("update t set n = n + 1 where id = :id").bind_named("id", 1_i64))?;
    ///     tx.update(&Query::new("update t set n = n - 1 where id = :id").bind_named("id", 2_i64))
    /// })?;
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `ExecutionError` if a transaction is already open, the driver's failure to
    /// begin or commit, or the error returned by `op`.
    pub fn transaction<T, E, F>(&mut self, op: F) -> Result<T, E>
    where
        F: FnOnce(&mut TransactionalSession<'_>) -> Result<T, E>,
        E: From<SqlSessionError> + Display,
    {
        if self.state == SessionState::InTransaction {
            return Err(SqlSessionError::ExecutionError(
                "transaction already in progress on this session".into(),
            )
            .into());
        }
        tracing::debug!(driver = self.conn.driver_name(), "beginning transaction");
        self.conn.begin()?;
        self.state = SessionState::InTransaction;

        let mut tx = TransactionalSession {
            session: self,
            finished: false,
        };
        let result = op(&mut tx);
        tx.settle(result)
    }
}

impl TransactionalSession<'_> {
    /// The parent session. Statements run through it still join this transaction but log a
    /// misuse warning.
    pub fn as_session_mut(&mut self) -> &mut Session {
        &mut *self.session
    }

    fn settle<T, E>(mut self, result: Result<T, E>) -> Result<T, E>
    where
        E: From<SqlSessionError> + Display,
    {
        self.finished = true;
        match result {
            Ok(value) => {
                tracing::debug!("committing transaction");
                match self.session.conn.commit() {
                    Ok(()) => Ok(value),
                    Err(commit_err) => {
                        if let Err(rollback_err) = self.session.conn.rollback() {
                            tracing::error!(
                                error = %rollback_err,
                                original = %commit_err,
                                "rollback after failed commit also failed"
                            );
                        }
                        Err(commit_err.into())
                    }
                }
            }
            Err(err) => {
                tracing::debug!(error = %err, "rolling back transaction");
                if let Err(rollback_err) = self.session.conn.rollback() {
                    tracing::error!(
                        error = %rollback_err,
                        original = %err,
                        "rollback failed; returning the original error"
                    );
                }
                Err(err)
            }
        }
    }
}

impl QueryExecutor for TransactionalSession<'_> {
    fn statement_executor(&mut self, _operation: &'static str) -> StatementExecutor<'_> {
        let session = &mut *self.session;
        StatementExecutor::new(session.conn.as_mut(), &session.options)
    }
}

impl Drop for TransactionalSession<'_> {
    fn drop(&mut self) {
        if !self.finished
            && let Err(err) = self.session.conn.rollback()
        {
            tracing::error!(error = %err, "rollback of abandoned transaction failed");
        }
        self.session.state = SessionState::Idle;
    }
}

impl std::fmt::Debug for TransactionalSession<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionalSession")
            .field("session", &self.session)
            .field("finished", &self.finished)
            .finish()
    }
}
