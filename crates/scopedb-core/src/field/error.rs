use crate::cancel::{Cancelled, IsCancelled};
use thiserror::Error;

/// Failure of a single column read.
///
/// `CE` is the cursor's own error type. Cursor-state failures (no current
/// row, type mismatch in the raw read) pass through as [`FieldError::Cursor`]
/// whatever the absence policy.
#[derive(Debug, Error)]
pub enum FieldError<CE> {
    /// The column was absent (null or out of range) under
    /// [`AbsencePolicy::Require`](super::AbsencePolicy::Require).
    #[error("value unavailable at column {index}")]
    Unavailable { index: usize },

    #[error(transparent)]
    Cursor(CE),

    /// An async null check or raw read observed cancellation.
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}

impl<CE> FieldError<CE> {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }

    /// Column index of an unavailable value.
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::Unavailable { index } => Some(*index),
            _ => None,
        }
    }

    pub fn into_cursor_error(self) -> Option<CE> {
        match self {
            Self::Cursor(e) => Some(e),
            _ => None,
        }
    }
}

impl<CE> IsCancelled for FieldError<CE> {
    fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }
}
