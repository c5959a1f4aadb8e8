//! Field extraction policy engine.
//!
//! Reads one column of the current row under an absence policy. A column is
//! absent when its index is at or past the cursor's field count, or when the
//! value there is null; both cases are handled identically. The checks run in
//! that order, before the raw read:
//!
//! 1. `index >= field_count()` -> absent
//! 2. `is_absent_at(index)` -> absent
//! 3. otherwise the caller's reader runs and the value is present
//!
//! | policy    | present           | absent                      |
//! |-----------|-------------------|-----------------------------|
//! | `Skip`    | `(true, value)`   | `(false, T::default())`     |
//! | `Default` | `(true, value)`   | `(true, T::default())`      |
//! | `Require` | `(true, value)`   | [`FieldError::Unavailable`] |
//!
//! Errors raised by the checks themselves are cursor-state failures and
//! bypass the policy.

mod asynchronous;
mod error;

pub use asynchronous::{
    read_field_async, read_or_default_async, read_or_skip_async, read_required_async,
    AsyncRowCursor,
};
pub use error::FieldError;

use serde::{Deserialize, Serialize};

/// Minimal row surface needed to decide absence.
pub trait RowCursor {
    type Error;

    /// Number of columns in the current row.
    fn field_count(&self) -> Result<usize, Self::Error>;

    /// Whether the value at `index` is the null marker.
    fn is_absent_at(&self, index: usize) -> Result<bool, Self::Error>;
}

impl<C: RowCursor + ?Sized> RowCursor for &C {
    type Error = C::Error;

    fn field_count(&self) -> Result<usize, Self::Error> {
        (**self).field_count()
    }

    fn is_absent_at(&self, index: usize) -> Result<bool, Self::Error> {
        (**self).is_absent_at(index)
    }
}

/// What to do when a column is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbsencePolicy {
    /// Report `extracted = false` with the type's default value.
    Skip,
    /// Report `extracted = true` with the type's default value.
    Default,
    /// Fail with [`FieldError::Unavailable`].
    #[serde(alias = "throw")]
    Require,
}

impl AbsencePolicy {
    pub(crate) fn on_absent<T: Default, CE>(
        self,
        index: usize,
    ) -> Result<FieldRead<T>, FieldError<CE>> {
        tracing::trace!(index, policy = ?self, "column absent");
        match self {
            Self::Skip => Ok(FieldRead {
                extracted: false,
                value: T::default(),
            }),
            Self::Default => Ok(FieldRead {
                extracted: true,
                value: T::default(),
            }),
            Self::Require => Err(FieldError::Unavailable { index }),
        }
    }
}

/// Result of one column read: whether a value was extracted, and the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FieldRead<T> {
    pub extracted: bool,
    pub value: T,
}

impl<T> FieldRead<T> {
    pub fn present(value: T) -> Self {
        Self {
            extracted: true,
            value,
        }
    }

    /// The value if it was extracted.
    pub fn into_option(self) -> Option<T> {
        self.extracted.then_some(self.value)
    }
}

impl<T> From<FieldRead<T>> for (bool, T) {
    fn from(read: FieldRead<T>) -> Self {
        (read.extracted, read.value)
    }
}

/// Read column `index` of `cursor` under `policy`, using `read` for the raw
/// typed read once the column is known to be present.
pub fn read_field<C, T, F>(
    cursor: &C,
    index: usize,
    policy: AbsencePolicy,
    read: F,
) -> Result<FieldRead<T>, FieldError<C::Error>>
where
    C: RowCursor + ?Sized,
    T: Default,
    F: FnOnce(&C, usize) -> Result<T, C::Error>,
{
    let in_range = index < cursor.field_count().map_err(FieldError::Cursor)?;
    if in_range && !cursor.is_absent_at(index).map_err(FieldError::Cursor)? {
        let value = read(cursor, index).map_err(FieldError::Cursor)?;
        return Ok(FieldRead::present(value));
    }
    policy.on_absent(index)
}

/// [`AbsencePolicy::Skip`]: `(false, default)` when absent.
pub fn read_or_skip<C, T, F>(
    cursor: &C,
    index: usize,
    read: F,
) -> Result<FieldRead<T>, FieldError<C::Error>>
where
    C: RowCursor + ?Sized,
    T: Default,
    F: FnOnce(&C, usize) -> Result<T, C::Error>,
{
    read_field(cursor, index, AbsencePolicy::Skip, read)
}

/// [`AbsencePolicy::Default`]: `(true, default)` when absent.
pub fn read_or_default<C, T, F>(
    cursor: &C,
    index: usize,
    read: F,
) -> Result<FieldRead<T>, FieldError<C::Error>>
where
    C: RowCursor + ?Sized,
    T: Default,
    F: FnOnce(&C, usize) -> Result<T, C::Error>,
{
    read_field(cursor, index, AbsencePolicy::Default, read)
}

/// [`AbsencePolicy::Require`]: the value, or [`FieldError::Unavailable`].
pub fn read_required<C, T, F>(cursor: &C, index: usize, read: F) -> Result<T, FieldError<C::Error>>
where
    C: RowCursor + ?Sized,
    T: Default,
    F: FnOnce(&C, usize) -> Result<T, C::Error>,
{
    read_field(cursor, index, AbsencePolicy::Require, read).map(|r| r.value)
}
