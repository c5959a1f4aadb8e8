//! Scoped execution engine.
//!
//! A [`Scope`] owns one resource handle and runs a primary operation against
//! it, optionally followed by a recovery operation when the primary fails.
//! Whatever happens, the handle is released exactly once, after every
//! operation has settled:
//!
//! - primary succeeds: optional commit, release, [`Outcome::Success`]
//! - primary fails, no recovery: rollback, release, [`Outcome::Failure`]
//!   holding the primary error untouched
//! - recovery succeeds: optional commit, release, [`Outcome::Recovered`]
//! - recovery fails: rollback, release, [`Outcome::AggregateFailure`] with
//!   `[primary, recovery]` in that order
//!
//! There are no retries. Commit and release failures never replace the
//! outcome; they are collected on the [`Completion`].

mod asynchronous;
mod error;
mod outcome;
mod release;
mod state;

pub use error::{AggregateError, ReleaseError, ReleaseStage, ScopeError};
pub use outcome::{Completion, Outcome};
pub use state::ScopeState;

use crate::options::ExecutionOptions;
use crate::resource::{ConstructError, Resource, ResourceFactory};
use release::ReleaseGuard;
use state::{Machine, ScopeState as S};

/// Exclusive owner of one resource handle for one execution.
#[derive(Debug)]
pub struct Scope<R> {
    resource: R,
    options: Option<ExecutionOptions>,
}

impl<R> Scope<R> {
    pub fn new(resource: R) -> Self {
        Self {
            resource,
            options: None,
        }
    }

    /// Open a handle through an injected factory and wrap it.
    pub fn open<F>(factory: &F, descriptor: &F::Descriptor) -> Result<Self, ConstructError>
    where
        F: ResourceFactory<Resource = R> + ?Sized,
    {
        factory.open(descriptor).map(Self::new)
    }

    /// Per-call options. Without them the process-wide default, as it is
    /// when the execution starts, applies.
    pub fn with_options(mut self, options: ExecutionOptions) -> Self {
        self.options = Some(options);
        self
    }

    pub fn resource(&self) -> &R {
        &self.resource
    }

    fn into_parts(self) -> (R, ExecutionOptions) {
        (self.resource, ExecutionOptions::resolve(self.options))
    }
}

type NoRecovery<R, T, E> = fn(&mut R, &E) -> Result<T, E>;

impl<R: Resource> Scope<R> {
    /// Run `primary`; a failure is handed back unchanged.
    pub fn execute<T, E, P>(self, primary: P) -> Completion<T, E>
    where
        P: FnOnce(&mut R) -> Result<T, E>,
    {
        self.run(primary, None::<NoRecovery<R, T, E>>)
    }

    /// Run `primary`, falling back to `recovery` with the captured primary
    /// error if it fails.
    pub fn execute_or_recover<T, E, P, C>(self, primary: P, recovery: C) -> Completion<T, E>
    where
        P: FnOnce(&mut R) -> Result<T, E>,
        C: FnOnce(&mut R, &E) -> Result<T, E>,
    {
        self.run(primary, Some(recovery))
    }

    fn run<T, E, P, C>(self, primary: P, recovery: Option<C>) -> Completion<T, E>
    where
        P: FnOnce(&mut R) -> Result<T, E>,
        C: FnOnce(&mut R, &E) -> Result<T, E>,
    {
        let _span = tracing::debug_span!("scope", mode = "sync").entered();
        let (resource, options) = self.into_parts();
        let mut guard = ReleaseGuard::new(resource);
        let mut machine = Machine::new();
        let mut suppressed = Vec::new();

        machine.advance(S::Trying);
        let outcome = match primary(guard.get()) {
            Ok(value) => {
                machine.advance(S::Succeeded);
                guard.commit_if(options.commit_on_primary_success, &mut suppressed);
                Outcome::Success(value)
            }
            Err(primary_err) => {
                machine.advance(S::Failed);
                match recovery {
                    None => {
                        machine.advance(S::Unrecovered);
                        Outcome::Failure(primary_err)
                    }
                    Some(recover) => {
                        machine.advance(S::Recovering);
                        match recover(guard.get(), &primary_err) {
                            Ok(value) => {
                                machine.advance(S::Recovered);
                                guard.commit_if(
                                    options.commit_on_recovery_success,
                                    &mut suppressed,
                                );
                                Outcome::Recovered(value)
                            }
                            Err(recovery_err) => {
                                machine.advance(S::AggregateFailed);
                                Outcome::AggregateFailure(AggregateError::new(
                                    primary_err,
                                    recovery_err,
                                ))
                            }
                        }
                    }
                }
            }
        };

        let settled = machine.outcome();
        machine.advance(S::Releasing);
        guard.finish(&mut suppressed);
        machine.advance(S::Done);

        Completion {
            outcome,
            suppressed,
            state: settled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use thiserror::Error;

    #[derive(Debug, Error, PartialEq)]
    #[error("{0}")]
    struct Boom(&'static str);

    #[derive(Default)]
    struct Journal {
        calls: Vec<&'static str>,
        fail_close: bool,
    }

    struct Recording {
        journal: Rc<RefCell<Journal>>,
        tx: bool,
    }

    impl Resource for Recording {
        type Error = Boom;

        fn is_transactional(&self) -> bool {
            self.tx
        }

        fn commit(&mut self) -> Result<(), Boom> {
            self.journal.borrow_mut().calls.push("commit");
            self.tx = false;
            Ok(())
        }

        fn rollback(&mut self) -> Result<(), Boom> {
            self.journal.borrow_mut().calls.push("rollback");
            self.tx = false;
            Ok(())
        }

        fn close(self) -> Result<(), Boom> {
            let mut j = self.journal.borrow_mut();
            j.calls.push("close");
            if j.fail_close {
                return Err(Boom("close"));
            }
            Ok(())
        }
    }

    fn recording(tx: bool) -> (Recording, Rc<RefCell<Journal>>) {
        let journal = Rc::new(RefCell::new(Journal::default()));
        (
            Recording {
                journal: journal.clone(),
                tx,
            },
            journal,
        )
    }

    #[test]
    fn commit_precedes_close() {
        let (res, journal) = recording(true);
        let done = Scope::new(res)
            .with_options(ExecutionOptions::commit_on_success())
            .execute(|_| Ok::<_, Boom>(1));
        assert_eq!(done.state(), ScopeState::Succeeded);
        assert_eq!(done.into_result().unwrap(), 1);
        assert_eq!(journal.borrow().calls, ["commit", "close"]);
    }

    #[test]
    fn uncommitted_success_rolls_back() {
        let (res, journal) = recording(true);
        let done = Scope::new(res)
            .with_options(ExecutionOptions::new())
            .execute(|_| Ok::<_, Boom>(()));
        assert!(done.is_success());
        assert_eq!(journal.borrow().calls, ["rollback", "close"]);
    }

    #[test]
    fn close_failure_does_not_mask_primary_error() {
        let (res, journal) = recording(false);
        journal.borrow_mut().fail_close = true;
        let err = Scope::new(res)
            .execute(|_| Err::<(), _>(Boom("primary")))
            .into_result()
            .unwrap_err();
        assert_eq!(err.primary(), Some(&Boom("primary")));
        assert_eq!(err.suppressed().len(), 1);
        assert_eq!(err.suppressed()[0].stage, ReleaseStage::Close);
    }

    #[test]
    fn panicking_primary_still_releases() {
        let (res, journal) = recording(true);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ = Scope::new(res).execute(|_| -> Result<(), Boom> { panic!("primary panicked") });
        }));
        assert!(result.is_err());
        assert_eq!(journal.borrow().calls, ["rollback", "close"]);
    }

    #[test]
    fn recovery_sees_primary_error() {
        let (res, _journal) = recording(false);
        let done = Scope::new(res).execute_or_recover(
            |_| Err(Boom("primary")),
            |_, e: &Boom| Ok(format!("recovered from {e}")),
        );
        assert_eq!(done.state(), ScopeState::Recovered);
        assert_eq!(done.into_result().unwrap(), "recovered from primary");
    }
}
