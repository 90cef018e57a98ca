mod cursor;
mod row;

pub use cursor::RowCursor;
pub use row::{ColumnIndex, FromColumn, Row};
