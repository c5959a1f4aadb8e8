use super::error::{AggregateError, ReleaseError, ScopeError};
use super::state::ScopeState;

/// What one execution produced. Exactly one per execution.
#[derive(Debug)]
pub enum Outcome<T, E> {
    /// The primary operation returned a value.
    Success(T),
    /// The primary operation failed and no recovery was supplied.
    Failure(E),
    /// The primary operation failed and the recovery returned a value.
    Recovered(T),
    /// Primary and recovery both failed.
    AggregateFailure(AggregateError<E>),
}

impl<T, E> Outcome<T, E> {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_) | Self::Recovered(_))
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Success(v) | Self::Recovered(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Success(v) | Self::Recovered(v) => Some(v),
            _ => None,
        }
    }
}

/// Result of running a [`Scope`](super::Scope): the outcome plus any release
/// failures that happened after it was decided.
#[derive(Debug)]
#[must_use = "a Completion carries the outcome and any release failures"]
pub struct Completion<T, E> {
    pub(crate) outcome: Outcome<T, E>,
    pub(crate) suppressed: Vec<ReleaseError>,
    pub(crate) state: ScopeState,
}

impl<T, E> Completion<T, E> {
    pub fn outcome(&self) -> &Outcome<T, E> {
        &self.outcome
    }

    /// Commit, rollback and close failures, in the order they occurred.
    pub fn suppressed(&self) -> &[ReleaseError] {
        &self.suppressed
    }

    /// The state the execution settled in before release.
    pub fn state(&self) -> ScopeState {
        self.state
    }

    /// True when a value was produced and the resource released cleanly.
    pub fn is_success(&self) -> bool {
        self.outcome.is_success() && self.suppressed.is_empty()
    }

    pub fn into_parts(self) -> (Outcome<T, E>, Vec<ReleaseError>) {
        (self.outcome, self.suppressed)
    }

    /// Collapse into a `Result`.
    ///
    /// Failures keep their release errors as `suppressed`. A produced value
    /// whose commit or release failed becomes [`ScopeError::Release`], which
    /// still carries the value.
    pub fn into_result(self) -> Result<T, ScopeError<E, T>> {
        let Completion {
            outcome,
            suppressed,
            ..
        } = self;
        match outcome {
            Outcome::Success(v) | Outcome::Recovered(v) if suppressed.is_empty() => Ok(v),
            Outcome::Success(value) | Outcome::Recovered(value) => Err(ScopeError::Release {
                value,
                errors: suppressed,
            }),
            Outcome::Failure(error) => Err(ScopeError::Failed { error, suppressed }),
            Outcome::AggregateFailure(error) => Err(ScopeError::Aggregate { error, suppressed }),
        }
    }
}
