//! Scoped execution against transactional database resources.
//!
//! Two pieces:
//!
//! - [`scope`]: run a primary operation against an exclusively owned
//!   resource handle, with an optional recovery operation, an opt-in commit
//!   policy and guaranteed single release. Sync and async (cooperatively
//!   cancellable) forms.
//! - [`field`]: read one column of the current row under a skip / default /
//!   require policy for absent values. Sync and async forms.
//!
//! Providers plug in through [`Resource`] / [`AsyncResource`],
//! [`RowCursor`] / [`AsyncRowCursor`] and an injected [`ResourceFactory`].
//!
//! ```
//! use scopedb_core::{ExecutionOptions, Resource, Scope};
//!
//! struct Noop;
//!
//! impl Resource for Noop {
//!     type Error = std::io::Error;
//!     fn is_transactional(&self) -> bool { false }
//!     fn commit(&mut self) -> Result<(), Self::Error> { Ok(()) }
//!     fn rollback(&mut self) -> Result<(), Self::Error> { Ok(()) }
//!     fn close(self) -> Result<(), Self::Error> { Ok(()) }
//! }
//!
//! let value = Scope::new(Noop)
//!     .with_options(ExecutionOptions::commit_on_success())
//!     .execute_or_recover(
//!         |_| Err::<u32, String>("primary failed".into()),
//!         |_, _err| Ok(7),
//!     )
//!     .into_result()
//!     .unwrap();
//! assert_eq!(value, 7);
//! ```

pub mod cancel;
pub mod field;
pub mod options;
pub mod resource;
pub mod scope;

pub use cancel::{cancellable, CancellationToken, Cancelled, IsCancelled};
pub use field::{
    read_field, read_field_async, read_or_default, read_or_default_async, read_or_skip,
    read_or_skip_async, read_required, read_required_async, AbsencePolicy, AsyncRowCursor,
    FieldError, FieldRead, RowCursor,
};
pub use options::{ConfigError, ExecutionOptions, GlobalOptionsGuard};
pub use resource::{AsyncResource, BoxError, ConstructError, FnFactory, Resource, ResourceFactory};
pub use scope::{
    AggregateError, Completion, Outcome, ReleaseError, ReleaseStage, Scope, ScopeError,
    ScopeState,
};

// Re-exported so callers can name the boxed futures async operations return.
pub use futures::future::BoxFuture;
