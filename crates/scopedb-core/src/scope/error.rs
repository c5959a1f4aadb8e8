//! Error types produced by the execution engine.

use crate::cancel::IsCancelled;
use crate::resource::BoxError;
use std::error::Error as StdError;
use std::fmt;
use thiserror::Error;

/// Which release step failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseStage {
    Commit,
    Rollback,
    Close,
}

impl fmt::Display for ReleaseStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Commit => "commit",
            Self::Rollback => "rollback",
            Self::Close => "close",
        })
    }
}

/// A commit, rollback or close failure.
///
/// Always secondary: it is attached to the outcome that was already decided
/// and never replaces it.
#[derive(Debug, Error)]
#[error("{stage} failed: {source}")]
pub struct ReleaseError {
    pub stage: ReleaseStage,
    #[source]
    pub source: BoxError,
}

impl ReleaseError {
    pub fn new(stage: ReleaseStage, source: impl Into<BoxError>) -> Self {
        Self {
            stage,
            source: source.into(),
        }
    }
}

/// Primary and recovery both failed. Exactly two causes, in that order.
///
/// `source()` walks into the primary cause only; the recovery cause is
/// reached through [`causes`](Self::causes) or the `recovery` field.
#[derive(Debug, Error)]
#[error("recovery failed after primary failure (primary: {primary}; recovery: {recovery})")]
pub struct AggregateError<E> {
    #[source]
    pub primary: E,
    pub recovery: E,
}

impl<E> AggregateError<E> {
    pub fn new(primary: E, recovery: E) -> Self {
        Self { primary, recovery }
    }

    /// Both causes, primary first.
    pub fn causes(&self) -> [&E; 2] {
        [&self.primary, &self.recovery]
    }

    pub fn into_causes(self) -> (E, E) {
        (self.primary, self.recovery)
    }
}

impl<E: IsCancelled> AggregateError<E> {
    pub fn primary_cancelled(&self) -> bool {
        self.primary.is_cancelled()
    }

    pub fn recovery_cancelled(&self) -> bool {
        self.recovery.is_cancelled()
    }

    pub fn both_cancelled(&self) -> bool {
        self.primary_cancelled() && self.recovery_cancelled()
    }
}

/// Failure side of [`Completion::into_result`](super::Completion::into_result).
///
/// `T` is the value type of the execution; only [`ScopeError::Release`]
/// carries one.
#[derive(Debug)]
pub enum ScopeError<E, T = ()> {
    /// The primary operation failed and nothing recovered it. `error` is the
    /// primary error exactly as raised; Display and `source()` pass through.
    Failed {
        error: E,
        suppressed: Vec<ReleaseError>,
    },

    /// Primary and recovery both failed.
    Aggregate {
        error: AggregateError<E>,
        suppressed: Vec<ReleaseError>,
    },

    /// The operation succeeded (or was recovered) but committing or
    /// releasing the resource failed afterwards. The value is kept.
    Release {
        value: T,
        errors: Vec<ReleaseError>,
    },
}

impl<E, T> ScopeError<E, T> {
    /// The primary operation's error, if one was raised.
    pub fn primary(&self) -> Option<&E> {
        match self {
            Self::Failed { error, .. } => Some(error),
            Self::Aggregate { error, .. } => Some(&error.primary),
            Self::Release { .. } => None,
        }
    }

    pub fn aggregate(&self) -> Option<&AggregateError<E>> {
        match self {
            Self::Aggregate { error, .. } => Some(error),
            _ => None,
        }
    }

    pub fn is_aggregate(&self) -> bool {
        matches!(self, Self::Aggregate { .. })
    }

    pub fn is_release(&self) -> bool {
        matches!(self, Self::Release { .. })
    }

    /// The value produced before release failed.
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Release { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Take the produced value out of a [`ScopeError::Release`].
    pub fn into_value(self) -> Result<T, Self> {
        match self {
            Self::Release { value, .. } => Ok(value),
            other => Err(other),
        }
    }

    /// Release failures carried alongside the outcome.
    pub fn suppressed(&self) -> &[ReleaseError] {
        match self {
            Self::Failed { suppressed, .. } | Self::Aggregate { suppressed, .. } => suppressed,
            Self::Release { errors, .. } => errors,
        }
    }

    /// Unwrap the unrecovered primary error, dropping suppressed errors.
    pub fn into_primary(self) -> Result<E, Self> {
        match self {
            Self::Failed { error, .. } => Ok(error),
            other => Err(other),
        }
    }
}

impl<E: IsCancelled, T> IsCancelled for ScopeError<E, T> {
    fn is_cancelled(&self) -> bool {
        match self {
            Self::Failed { error, .. } => error.is_cancelled(),
            Self::Aggregate { error, .. } => error.both_cancelled(),
            Self::Release { .. } => false,
        }
    }
}

impl<E: fmt::Display, T> fmt::Display for ScopeError<E, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed { error, .. } => fmt::Display::fmt(error, f),
            Self::Aggregate { error, .. } => fmt::Display::fmt(error, f),
            Self::Release { errors, .. } => match errors.as_slice() {
                [] => f.write_str("resource release failed"),
                [only] => write!(f, "resource release failed: {only}"),
                [first, rest @ ..] => write!(
                    f,
                    "resource release failed: {first} (+{} more)",
                    rest.len()
                ),
            },
        }
    }
}

impl<E: StdError + 'static, T: fmt::Debug> StdError for ScopeError<E, T> {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Failed { error, .. } => error.source(),
            Self::Aggregate { error, .. } => error.source(),
            Self::Release { errors, .. } => errors.first().map(|e| e as &(dyn StdError + 'static)),
        }
    }
}
