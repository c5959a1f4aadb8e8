//! SQLite provider for scopedb.
//!
//! Connections are opened by [`SqliteFactory`] from a [`SqliteDescriptor`]
//! and run inside a [`scopedb_core::Scope`]:
//!
//! ```
//! use scopedb_core::{ExecutionOptions, Scope};
//! use scopedb_sqlite::{SqliteFactory, TransactionMode, SqliteDescriptor};
//!
//! let factory = SqliteFactory::new().with_init_sql("CREATE TABLE kv (k TEXT, v TEXT)");
//! let descriptor = SqliteDescriptor::memory().with_transaction(TransactionMode::Deferred);
//!
//! let inserted = Scope::open(&factory, &descriptor)
//!     .unwrap()
//!     .with_options(ExecutionOptions::commit_on_success())
//!     .execute(|db| db.connection().execute("INSERT INTO kv VALUES ('a', '1')", []))
//!     .into_result()
//!     .unwrap();
//! assert_eq!(inserted, 1);
//! ```

pub mod cursor;
pub mod descriptor;
pub mod error;
pub mod factory;
pub mod resource;

pub use cursor::{query_rows, SqliteCursor, SqliteRow};
pub use descriptor::{SqliteDescriptor, TransactionMode};
pub use error::{SqliteError, SqliteResult};
pub use factory::SqliteFactory;
pub use resource::SqliteResource;
