use crate::descriptor::SqliteDescriptor;
use crate::error::{SqliteError, SqliteResult};
use crate::resource::SqliteResource;
use rusqlite::Connection;
use scopedb_core::{ConstructError, ResourceFactory};
use std::time::Duration;

/// Opens [`SqliteResource`] handles from [`SqliteDescriptor`]s.
///
/// Every new connection gets `foreign_keys = ON`, the configured busy
/// timeout, and then the optional init script, before any transaction is
/// started.
#[derive(Debug, Clone)]
pub struct SqliteFactory {
    busy_timeout: Duration,
    init_sql: Option<String>,
}

impl Default for SqliteFactory {
    fn default() -> Self {
        Self {
            busy_timeout: Duration::from_secs(5),
            init_sql: None,
        }
    }
}

impl SqliteFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// SQL batch run on each fresh connection, e.g. schema creation.
    pub fn with_init_sql(mut self, sql: impl Into<String>) -> Self {
        self.init_sql = Some(sql.into());
        self
    }

    /// Parse `raw` and open it.
    pub fn open_str(&self, raw: &str) -> Result<SqliteResource, ConstructError> {
        let descriptor = SqliteDescriptor::parse(raw)?;
        self.open(&descriptor)
    }

    fn connect(&self, descriptor: &SqliteDescriptor) -> SqliteResult<SqliteResource> {
        let conn = match descriptor {
            SqliteDescriptor::File { path, .. } => Connection::open(path)?,
            SqliteDescriptor::Memory { .. } => Connection::open_in_memory()?,
        };
        self.init_connection(&conn)?;
        SqliteResource::begin(conn, descriptor.transaction())
    }

    fn init_connection(&self, conn: &Connection) -> SqliteResult<()> {
        conn.execute_batch("PRAGMA foreign_keys = ON")?;
        conn.busy_timeout(self.busy_timeout)?;
        if let Some(sql) = &self.init_sql {
            conn.execute_batch(sql)?;
        }
        Ok(())
    }
}

impl ResourceFactory for SqliteFactory {
    type Descriptor = SqliteDescriptor;
    type Resource = SqliteResource;

    fn open(&self, descriptor: &SqliteDescriptor) -> Result<SqliteResource, ConstructError> {
        tracing::debug!(%descriptor, "opening sqlite resource");
        self.connect(descriptor).map_err(|e| {
            tracing::debug!(%descriptor, error = %e, "sqlite open failed");
            ConstructError::failed(descriptor.to_string(), e)
        })
    }
}
