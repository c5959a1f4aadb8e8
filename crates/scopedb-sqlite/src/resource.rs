use crate::descriptor::TransactionMode;
use crate::error::{SqliteError, SqliteResult};
use async_trait::async_trait;
use rusqlite::Connection;
use scopedb_core::{AsyncResource, Resource};

/// One SQLite connection, optionally inside an open transaction.
///
/// Dropping the handle without closing it closes the connection, and SQLite
/// rolls back whatever transaction was still open.
#[derive(Debug)]
pub struct SqliteResource {
    conn: Connection,
}

impl SqliteResource {
    /// Wrap `conn`, starting a transaction according to `mode`.
    pub fn begin(conn: Connection, mode: TransactionMode) -> SqliteResult<Self> {
        if let Some(sql) = mode.begin_sql() {
            conn.execute_batch(sql)?;
            tracing::trace!(mode = ?mode, "sqlite transaction started");
        }
        Ok(Self { conn })
    }

    /// Wrap `conn` as-is. Whether it is transactional is read from the
    /// connection, so a `BEGIN` issued by the caller is honoured.
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn in_transaction(&self) -> bool {
        !self.conn.is_autocommit()
    }

    fn commit_now(&mut self) -> SqliteResult<()> {
        self.conn.execute_batch("COMMIT")?;
        Ok(())
    }

    fn rollback_now(&mut self) -> SqliteResult<()> {
        self.conn.execute_batch("ROLLBACK")?;
        Ok(())
    }

    fn close_now(self) -> SqliteResult<()> {
        self.conn.close().map_err(|(_, e)| SqliteError::from(e))
    }
}

impl Resource for SqliteResource {
    type Error = SqliteError;

    fn is_transactional(&self) -> bool {
        self.in_transaction()
    }

    fn commit(&mut self) -> Result<(), SqliteError> {
        self.commit_now()
    }

    fn rollback(&mut self) -> Result<(), SqliteError> {
        self.rollback_now()
    }

    fn close(self) -> Result<(), SqliteError> {
        self.close_now()
    }
}

// rusqlite is blocking; the async form runs each step inline.
#[async_trait]
impl AsyncResource for SqliteResource {
    type Error = SqliteError;

    fn is_transactional(&self) -> bool {
        self.in_transaction()
    }

    async fn commit(&mut self) -> Result<(), SqliteError> {
        self.commit_now()
    }

    async fn rollback(&mut self) -> Result<(), SqliteError> {
        self.rollback_now()
    }

    async fn close(self) -> Result<(), SqliteError> {
        self.close_now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transactional_tracks_connection_state() {
        let conn = Connection::open_in_memory().unwrap();
        let mut res = SqliteResource::begin(conn, TransactionMode::Deferred).unwrap();
        assert!(Resource::is_transactional(&res));

        Resource::commit(&mut res).unwrap();
        assert!(!Resource::is_transactional(&res));
        Resource::close(res).unwrap();
    }

    #[test]
    fn autocommit_handle_is_not_transactional() {
        let conn = Connection::open_in_memory().unwrap();
        let res = SqliteResource::begin(conn, TransactionMode::None).unwrap();
        assert!(!Resource::is_transactional(&res));
    }

    #[test]
    fn rollback_without_transaction_fails() {
        let conn = Connection::open_in_memory().unwrap();
        let mut res = SqliteResource::from_connection(conn);
        assert!(Resource::rollback(&mut res).is_err());
    }
}
