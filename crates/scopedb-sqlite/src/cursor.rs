//! Row cursors over SQLite results.
//!
//! [`SqliteCursor`] borrows the live `rusqlite::Row` a statement is
//! positioned on. [`SqliteRow`] is an owned snapshot of one row, which can
//! be held across `.await` points and so also serves the async read path.

use crate::error::{SqliteError, SqliteResult};
use async_trait::async_trait;
use rusqlite::types::{FromSql, Value, ValueRef};
use rusqlite::{Connection, Params, Row};
use scopedb_core::{AsyncRowCursor, RowCursor};

/// Borrowed view of the current row of a running statement.
#[derive(Clone, Copy)]
pub struct SqliteCursor<'a, 'stmt> {
    row: &'a Row<'stmt>,
}

impl<'a, 'stmt> SqliteCursor<'a, 'stmt> {
    pub fn new(row: &'a Row<'stmt>) -> Self {
        Self { row }
    }

    /// Typed read of column `index`.
    pub fn get<T: FromSql>(&self, index: usize) -> rusqlite::Result<T> {
        self.row.get(index)
    }
}

impl RowCursor for SqliteCursor<'_, '_> {
    type Error = rusqlite::Error;

    fn field_count(&self) -> rusqlite::Result<usize> {
        Ok(self.row.as_ref().column_count())
    }

    fn is_absent_at(&self, index: usize) -> rusqlite::Result<bool> {
        Ok(matches!(self.row.get_ref(index)?, ValueRef::Null))
    }
}

/// Owned copy of one result row.
#[derive(Debug, Clone, PartialEq)]
pub struct SqliteRow {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl SqliteRow {
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let stmt = row.as_ref();
        let count = stmt.column_count();
        let columns = stmt.column_names().into_iter().map(String::from).collect();
        let values = (0..count)
            .map(|i| row.get::<_, Value>(i))
            .collect::<rusqlite::Result<_>>()?;
        Ok(Self { columns, values })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn column_index(&self, name: &str) -> SqliteResult<usize> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
            .ok_or_else(|| SqliteError::NoSuchColumn {
                name: name.to_string(),
            })
    }

    fn value(&self, index: usize) -> SqliteResult<&Value> {
        self.values
            .get(index)
            .ok_or(SqliteError::ColumnOutOfRange {
                index,
                count: self.values.len(),
            })
    }

    /// Typed read of column `index`, with the same conversions as
    /// `rusqlite::Row::get`.
    pub fn get<T: FromSql>(&self, index: usize) -> SqliteResult<T> {
        let value = self.value(index)?;
        T::column_result(ValueRef::from(value))
            .map_err(|source| SqliteError::Conversion { index, source })
    }

    pub fn get_by_name<T: FromSql>(&self, name: &str) -> SqliteResult<T> {
        self.get(self.column_index(name)?)
    }
}

impl RowCursor for SqliteRow {
    type Error = SqliteError;

    fn field_count(&self) -> Result<usize, SqliteError> {
        Ok(self.values.len())
    }

    fn is_absent_at(&self, index: usize) -> Result<bool, SqliteError> {
        Ok(matches!(self.value(index)?, Value::Null))
    }
}

#[async_trait]
impl AsyncRowCursor for SqliteRow {
    type Error = SqliteError;

    fn field_count(&self) -> Result<usize, SqliteError> {
        RowCursor::field_count(self)
    }

    async fn is_absent_at(&self, index: usize) -> Result<bool, SqliteError> {
        RowCursor::is_absent_at(self, index)
    }
}

/// Run `sql` and snapshot every result row.
pub fn query_rows<P: Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> SqliteResult<Vec<SqliteRow>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, SqliteRow::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    tracing::trace!(sql, rows = rows.len(), "query snapshot");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scopedb_core::{read_or_default, read_or_skip, read_required, FieldError};

    fn conn() -> Connection {
        Connection::open_in_memory().unwrap()
    }

    #[test]
    fn live_cursor_reads_under_policies() {
        let conn = conn();
        let mut stmt = conn.prepare("SELECT NULL AS a, 7 AS b").unwrap();
        let mut rows = stmt.query([]).unwrap();
        let row = rows.next().unwrap().unwrap();
        let cursor = SqliteCursor::new(row);

        let a = read_or_skip(&cursor, 0, |c, i| c.get::<i64>(i)).unwrap();
        assert_eq!((a.extracted, a.value), (false, 0));

        let a = read_or_default(&cursor, 0, |c, i| c.get::<i64>(i)).unwrap();
        assert_eq!((a.extracted, a.value), (true, 0));

        assert_eq!(read_required(&cursor, 1, |c, i| c.get::<i64>(i)).unwrap(), 7);
        let err = read_required(&cursor, 5, |c, i| c.get::<i64>(i)).unwrap_err();
        assert!(matches!(err, FieldError::Unavailable { index: 5 }));
    }

    #[test]
    fn snapshot_keeps_names_and_values() {
        let rows = query_rows(&conn(), "SELECT 1 AS id, 'x' AS label, NULL AS note", []).unwrap();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.columns(), ["id", "label", "note"]);
        assert_eq!(row.get::<i64>(0).unwrap(), 1);
        assert_eq!(row.get_by_name::<String>("LABEL").unwrap(), "x");
        assert_eq!(row.get::<Option<String>>(2).unwrap(), None);
        assert!(RowCursor::is_absent_at(row, 2).unwrap());
    }

    #[test]
    fn snapshot_conversion_and_range_errors() {
        let rows = query_rows(&conn(), "SELECT 'text'", []).unwrap();
        assert!(rows[0].get::<i64>(0).unwrap_err().is_conversion());
        assert!(matches!(
            rows[0].get::<i64>(3),
            Err(SqliteError::ColumnOutOfRange { index: 3, count: 1 })
        ));
        assert!(matches!(
            rows[0].get_by_name::<i64>("missing"),
            Err(SqliteError::NoSuchColumn { .. })
        ));
    }
}
