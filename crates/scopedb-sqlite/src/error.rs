use rusqlite::types::FromSqlError;
use thiserror::Error;

pub type SqliteResult<T> = Result<T, SqliteError>;

#[derive(Debug, Error)]
pub enum SqliteError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A snapshot value could not be converted to the requested type.
    #[error("column {index}: {source}")]
    Conversion {
        index: usize,
        #[source]
        source: FromSqlError,
    },

    #[error("column index {index} out of range (row has {count} columns)")]
    ColumnOutOfRange { index: usize, count: usize },

    #[error("no such column: {name}")]
    NoSuchColumn { name: String },
}

impl SqliteError {
    pub fn is_conversion(&self) -> bool {
        matches!(self, Self::Conversion { .. })
    }
}
