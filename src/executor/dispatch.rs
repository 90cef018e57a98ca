use crate::error::SqlSessionError;
use crate::results::Row;
use crate::template::Query;

use super::StatementExecutor;

/// Boxed row extractor carried by [`Action::Single`] and [`Action::List`].
pub type Extractor<'a, T> = Box<dyn FnMut(&Row<'_>) -> Result<Option<T>, SqlSessionError> + 'a>;

/// A query paired with the shape it should run as.
///
/// Built with [`Query::map`], [`Query::as_execute`], [`Query::as_update`] and
/// [`Query::as_update_and_return_generated_key`], then run with
/// [`QueryExecutor::run`](crate::QueryExecutor::run).
pub enum Action<'a, T = ()> {
    Single(Query, Extractor<'a, T>),
    List(Query, Extractor<'a, T>),
    Execute(Query),
    Update(Query),
    UpdateAndReturnGeneratedKey(Query),
}

impl<T> Action<'_, T> {
    #[must_use]
    pub fn query(&self) -> &Query {
        match self {
            Action::Single(query, _)
            | Action::List(query, _)
            | Action::Execute(query)
            | Action::Update(query)
            | Action::UpdateAndReturnGeneratedKey(query) => query,
        }
    }
}

impl<T> std::fmt::Debug for Action<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let shape = match self {
            Action::Single(..) => "Single",
            Action::List(..) => "List",
            Action::Execute(_) => "Execute",
            Action::Update(_) => "Update",
            Action::UpdateAndReturnGeneratedKey(_) => "UpdateAndReturnGeneratedKey",
        };
        f.debug_tuple(shape).field(self.query()).finish()
    }
}

/// Result of running an [`Action`], one variant per shape.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome<T> {
    Single(Option<T>),
    List(Vec<T>),
    Executed(bool),
    Updated(u64),
    GeneratedKey(Option<i64>),
}

impl<T> ActionOutcome<T> {
    /// # Errors
    ///
    /// Returns `SqlSessionError::ExecutionError` if the action was not a single-row action.
    pub fn into_single(self) -> Result<Option<T>, SqlSessionError> {
        match self {
            ActionOutcome::Single(value) => Ok(value),
            other => Err(unexpected("single", &other)),
        }
    }

    /// # Errors
    ///
    /// Returns `SqlSessionError::ExecutionError` if the action was not a list action.
    pub fn into_list(self) -> Result<Vec<T>, SqlSessionError> {
        match self {
            ActionOutcome::List(values) => Ok(values),
            other => Err(unexpected("list", &other)),
        }
    }

    /// # Errors
    ///
    /// Returns `SqlSessionError::ExecutionError` if the action was not an update action.
    pub fn into_updated(self) -> Result<u64, SqlSessionError> {
        match self {
            ActionOutcome::Updated(count) => Ok(count),
            other => Err(unexpected("update", &other)),
        }
    }

    /// # Errors
    ///
    /// Returns `SqlSessionError::ExecutionError` if the action was not an execute action.
    pub fn into_executed(self) -> Result<bool, SqlSessionError> {
        match self {
            ActionOutcome::Executed(has_rows) => Ok(has_rows),
            other => Err(unexpected("execute", &other)),
        }
    }

    /// # Errors
    ///
    /// Returns `SqlSessionError::ExecutionError` if the action did not ask for a generated key.
    pub fn into_generated_key(self) -> Result<Option<i64>, SqlSessionError> {
        match self {
            ActionOutcome::GeneratedKey(key) => Ok(key),
            other => Err(unexpected("generated key", &other)),
        }
    }

    fn shape(&self) -> &'static str {
        match self {
            ActionOutcome::Single(_) => "single",
            ActionOutcome::List(_) => "list",
            ActionOutcome::Executed(_) => "execute",
            ActionOutcome::Updated(_) => "update",
            ActionOutcome::GeneratedKey(_) => "generated key",
        }
    }
}

fn unexpected<T>(wanted: &str, outcome: &ActionOutcome<T>) -> SqlSessionError {
    SqlSessionError::ExecutionError(format!(
        "expected a {wanted} outcome, got {}",
        outcome.shape()
    ))
}

/// A query with an extractor, waiting for a single/list decision.
pub struct ResultQueryActionBuilder<'a, T> {
    query: Query,
    extractor: Extractor<'a, T>,
}

impl<'a, T> ResultQueryActionBuilder<'a, T> {
    #[must_use]
    pub fn as_single(self) -> Action<'a, T> {
        Action::Single(self.query, self.extractor)
    }

    #[must_use]
    pub fn as_list(self) -> Action<'a, T> {
        Action::List(self.query, self.extractor)
    }
}

impl Query {
    /// Attach a row extractor; finish with `as_single` or `as_list`.
    pub fn map<'a, T, F>(self, extractor: F) -> ResultQueryActionBuilder<'a, T>
    where
        F: FnMut(&Row<'_>) -> Result<Option<T>, SqlSessionError> + 'a,
    {
        ResultQueryActionBuilder {
            query: self,
            extractor: Box::new(extractor),
        }
    }

    #[must_use]
    pub fn as_execute(self) -> Action<'static> {
        Action::Execute(self)
    }

    #[must_use]
    pub fn as_update(self) -> Action<'static> {
        Action::Update(self)
    }

    #[must_use]
    pub fn as_update_and_return_generated_key(self) -> Action<'static> {
        Action::UpdateAndReturnGeneratedKey(self)
    }
}

impl StatementExecutor<'_> {
    /// Interpret `action` against this executor.
    ///
    /// # Errors
    ///
    /// Returns whatever the selected shape returns.
    pub fn run<T>(&mut self, action: Action<'_, T>) -> Result<ActionOutcome<T>, SqlSessionError> {
        match action {
            Action::Single(query, extractor) => {
                self.single(&query, extractor).map(ActionOutcome::Single)
            }
            Action::List(query, extractor) => {
                self.list(&query, extractor).map(ActionOutcome::List)
            }
            Action::Execute(query) => self.execute(&query).map(ActionOutcome::Executed),
            Action::Update(query) => self.update(&query).map(ActionOutcome::Updated),
            Action::UpdateAndReturnGeneratedKey(query) => self
                .update_and_return_generated_key(&query)
                .map(ActionOutcome::GeneratedKey),
        }
    }
}
