//! Async column reads.
//!
//! Same checks and policies as the sync reads. The null check and the raw
//! read are both cancellable suspension points; cancellation there aborts
//! the read with [`FieldError::Cancelled`] and is never treated as absence.

use async_trait::async_trait;
use futures::future::BoxFuture;

use super::{AbsencePolicy, FieldError, FieldRead};
use crate::cancel::{cancellable, CancellationToken};

/// Row surface whose null check may suspend.
#[async_trait]
pub trait AsyncRowCursor: Sync {
    type Error: Send;

    fn field_count(&self) -> Result<usize, Self::Error>;

    async fn is_absent_at(&self, index: usize) -> Result<bool, Self::Error>;
}

/// Async counterpart of [`read_field`](super::read_field).
pub async fn read_field_async<C, T, F>(
    cursor: &C,
    index: usize,
    policy: AbsencePolicy,
    cancel: &CancellationToken,
    read: F,
) -> Result<FieldRead<T>, FieldError<C::Error>>
where
    C: AsyncRowCursor + ?Sized,
    T: Default,
    F: for<'c> FnOnce(&'c C, usize) -> BoxFuture<'c, Result<T, C::Error>>,
{
    let in_range = index < cursor.field_count().map_err(FieldError::Cursor)?;
    if in_range {
        let absent = cancellable(cancel, cursor.is_absent_at(index))
            .await?
            .map_err(FieldError::Cursor)?;
        if !absent {
            let value = cancellable(cancel, read(cursor, index))
                .await?
                .map_err(FieldError::Cursor)?;
            return Ok(FieldRead::present(value));
        }
    }
    policy.on_absent(index)
}

pub async fn read_or_skip_async<C, T, F>(
    cursor: &C,
    index: usize,
    cancel: &CancellationToken,
    read: F,
) -> Result<FieldRead<T>, FieldError<C::Error>>
where
    C: AsyncRowCursor + ?Sized,
    T: Default,
    F: for<'c> FnOnce(&'c C, usize) -> BoxFuture<'c, Result<T, C::Error>>,
{
    read_field_async(cursor, index, AbsencePolicy::Skip, cancel, read).await
}

pub async fn read_or_default_async<C, T, F>(
    cursor: &C,
    index: usize,
    cancel: &CancellationToken,
    read: F,
) -> Result<FieldRead<T>, FieldError<C::Error>>
where
    C: AsyncRowCursor + ?Sized,
    T: Default,
    F: for<'c> FnOnce(&'c C, usize) -> BoxFuture<'c, Result<T, C::Error>>,
{
    read_field_async(cursor, index, AbsencePolicy::Default, cancel, read).await
}

pub async fn read_required_async<C, T, F>(
    cursor: &C,
    index: usize,
    cancel: &CancellationToken,
    read: F,
) -> Result<T, FieldError<C::Error>>
where
    C: AsyncRowCursor + ?Sized,
    T: Default,
    F: for<'c> FnOnce(&'c C, usize) -> BoxFuture<'c, Result<T, C::Error>>,
{
    read_field_async(cursor, index, AbsencePolicy::Require, cancel, read)
        .await
        .map(|r| r.value)
}
