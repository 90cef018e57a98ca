use crate::driver::DriverCursor;
use crate::error::SqlSessionError;

use super::row::Row;

/// Lazy, forward-only walk over a result set.
///
/// Rows are lent out one at a time; advancing invalidates the previous [`Row`]:
/// ```rust,no_run
/// # use sql_session::prelude::*;
/// # fn demo(cursor: &mut RowCursor<'_>) -> Result<(), SqlSessionError> {
/// while let Some(row) = cursor.next()? {
///     let id: i64 = row.get("id")?;
///     # let _ = id;
/// }
/// # Ok(())
/// # }
/// ```
pub struct RowCursor<'s> {
    inner: Box<dyn DriverCursor + 's>,
    columns: Vec<String>,
    position: usize,
}

impl<'s> RowCursor<'s> {
    pub(crate) fn new(inner: Box<dyn DriverCursor + 's>) -> Self {
        let columns = inner.column_names().to_vec();
        Self {
            inner,
            columns,
            position: 0,
        }
    }

    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    /// Advance to the next row.
    ///
    /// # Errors
    ///
    /// Returns the driver's failure if stepping the cursor fails.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<Option<Row<'_>>, SqlSessionError> {
        let Some(raw) = self.inner.advance()? else {
            return Ok(None);
        };
        let row = Row::new(raw, &self.columns, self.position);
        self.position += 1;
        Ok(Some(row))
    }
}
