//! Boundary contracts for resource handles and their construction.
//!
//! A resource handle is an open connection, optionally paired with an active
//! transaction. Providers implement [`Resource`] (and [`AsyncResource`] when
//! they can be driven from async code); construction goes through an injected
//! [`ResourceFactory`] instead of any process-wide registration hook.

use async_trait::async_trait;
use std::error::Error as StdError;
use thiserror::Error;

/// Boxed error used where provider errors cross the boundary untyped.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Transaction control surface of a synchronous resource handle.
pub trait Resource {
    type Error: StdError + Send + Sync + 'static;

    /// True while a transaction is open on this handle.
    fn is_transactional(&self) -> bool;

    fn commit(&mut self) -> Result<(), Self::Error>;

    fn rollback(&mut self) -> Result<(), Self::Error>;

    /// Close the handle. Consumes it, so a second close cannot be expressed.
    fn close(self) -> Result<(), Self::Error>;
}

/// Transaction control surface of an asynchronous resource handle.
///
/// Release calls are awaited but never raced against cancellation.
#[async_trait]
pub trait AsyncResource: Send {
    type Error: StdError + Send + Sync + 'static;

    fn is_transactional(&self) -> bool;

    async fn commit(&mut self) -> Result<(), Self::Error>;

    async fn rollback(&mut self) -> Result<(), Self::Error>;

    async fn close(self) -> Result<(), Self::Error>
    where
        Self: Sized;
}

/// Classified "cannot construct" failure raised by a factory.
#[derive(Debug, Error)]
pub enum ConstructError {
    /// The factory does not handle this kind of descriptor.
    #[error("unsupported connection descriptor: {descriptor}")]
    Unsupported { descriptor: String },

    /// The provider failed while opening the connection or transaction.
    #[error("failed to open {descriptor}: {source}")]
    Failed {
        descriptor: String,
        #[source]
        source: BoxError,
    },
}

impl ConstructError {
    pub fn unsupported(descriptor: impl Into<String>) -> Self {
        Self::Unsupported {
            descriptor: descriptor.into(),
        }
    }

    pub fn failed(descriptor: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Failed {
            descriptor: descriptor.into(),
            source: source.into(),
        }
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }
}

/// Builds an open resource handle from a connection descriptor.
pub trait ResourceFactory {
    type Descriptor: ?Sized;
    type Resource;

    fn open(&self, descriptor: &Self::Descriptor) -> Result<Self::Resource, ConstructError>;
}

impl<F: ResourceFactory + ?Sized> ResourceFactory for &F {
    type Descriptor = F::Descriptor;
    type Resource = F::Resource;

    fn open(&self, descriptor: &Self::Descriptor) -> Result<Self::Resource, ConstructError> {
        (**self).open(descriptor)
    }
}

/// Adapts a plain function into a [`ResourceFactory`].
///
/// ```
/// use scopedb_core::{ConstructError, FnFactory, ResourceFactory};
///
/// let factory = FnFactory::new(|name: &str| -> Result<String, ConstructError> {
///     if name.is_empty() {
///         return Err(ConstructError::unsupported("<empty>"));
///     }
///     Ok(format!("handle:{name}"))
/// });
/// assert_eq!(factory.open("main").unwrap(), "handle:main");
/// assert!(factory.open("").unwrap_err().is_unsupported());
/// ```
pub struct FnFactory<F, D: ?Sized, R> {
    build: F,
    _marker: std::marker::PhantomData<fn(&D) -> R>,
}

impl<F, D, R> FnFactory<F, D, R>
where
    F: Fn(&D) -> Result<R, ConstructError>,
    D: ?Sized,
{
    pub fn new(build: F) -> Self {
        Self {
            build,
            _marker: std::marker::PhantomData,
        }
    }
}

impl<F, D, R> ResourceFactory for FnFactory<F, D, R>
where
    F: Fn(&D) -> Result<R, ConstructError>,
    D: ?Sized,
{
    type Descriptor = D;
    type Resource = R;

    fn open(&self, descriptor: &D) -> Result<R, ConstructError> {
        (self.build)(descriptor)
    }
}
