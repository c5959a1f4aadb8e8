//! Async form of the engine.
//!
//! Same outcome algebra as the sync form. The cancellation token is handed to
//! the operations and only matters where they suspend on it; the engine
//! never polls it, and release is never raced against it. A primary that is
//! cancelled fails like any other primary and still gets its recovery.
//!
//! A panic inside an operation releases the resource before the panic
//! resumes. Dropping the returned future before it completes drops the
//! resource without an explicit release; providers are expected to roll back
//! on drop.

use futures::future::BoxFuture;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use tracing::Instrument;

use super::error::AggregateError;
use super::outcome::{Completion, Outcome};
use super::release::{commit_if_async, release_and_resume, release_async};
use super::state::{Machine, ScopeState as S};
use super::Scope;
use crate::cancel::CancellationToken;
use crate::resource::AsyncResource;

type NoRecovery<R, T, E> =
    for<'r> fn(&'r mut R, &'r E, CancellationToken) -> BoxFuture<'r, Result<T, E>>;

impl<R: AsyncResource> Scope<R> {
    /// Run `primary`; a failure, cancellation included, is handed back
    /// unchanged.
    pub async fn execute_async<T, E, P>(
        self,
        cancel: &CancellationToken,
        primary: P,
    ) -> Completion<T, E>
    where
        P: for<'r> FnOnce(&'r mut R, CancellationToken) -> BoxFuture<'r, Result<T, E>>,
    {
        self.run_async(cancel, primary, None::<NoRecovery<R, T, E>>).await
    }

    /// Run `primary`, falling back to `recovery` if it fails. Recovery
    /// receives the same token and only starts once the primary has settled.
    pub async fn execute_or_recover_async<T, E, P, C>(
        self,
        cancel: &CancellationToken,
        primary: P,
        recovery: C,
    ) -> Completion<T, E>
    where
        P: for<'r> FnOnce(&'r mut R, CancellationToken) -> BoxFuture<'r, Result<T, E>>,
        C: for<'r> FnOnce(&'r mut R, &'r E, CancellationToken) -> BoxFuture<'r, Result<T, E>>,
    {
        self.run_async(cancel, primary, Some(recovery)).await
    }

    async fn run_async<T, E, P, C>(
        self,
        cancel: &CancellationToken,
        primary: P,
        recovery: Option<C>,
    ) -> Completion<T, E>
    where
        P: for<'r> FnOnce(&'r mut R, CancellationToken) -> BoxFuture<'r, Result<T, E>>,
        C: for<'r> FnOnce(&'r mut R, &'r E, CancellationToken) -> BoxFuture<'r, Result<T, E>>,
    {
        let span = tracing::debug_span!("scope", mode = "async");
        async move {
            let (mut resource, options) = self.into_parts();
            let mut machine = Machine::new();
            let mut suppressed = Vec::new();
            let mut committed = false;

            machine.advance(S::Trying);
            let primary_run = AssertUnwindSafe(primary(&mut resource, cancel.clone()))
                .catch_unwind()
                .await;
            let primary_result = match primary_run {
                Ok(result) => result,
                Err(panic) => return release_and_resume(resource, panic).await,
            };
            let outcome = match primary_result {
                Ok(value) => {
                    machine.advance(S::Succeeded);
                    committed = commit_if_async(
                        &mut resource,
                        options.commit_on_primary_success,
                        &mut suppressed,
                    )
                    .await;
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
                            let recovery_run = AssertUnwindSafe(recover(
                                &mut resource,
                                &primary_err,
                                cancel.clone(),
                            ))
                            .catch_unwind()
                            .await;
                            let recovered = match recovery_run {
                                Ok(result) => result,
                                Err(panic) => return release_and_resume(resource, panic).await,
                            };
                            match recovered {
                                Ok(value) => {
                                    machine.advance(S::Recovered);
                                    committed = commit_if_async(
                                        &mut resource,
                                        options.commit_on_recovery_success,
                                        &mut suppressed,
                                    )
                                    .await;
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
            release_async(resource, committed, &mut suppressed).await;
            machine.advance(S::Done);

            Completion {
                outcome,
                suppressed,
                state: settled,
            }
        }
        .instrument(span)
        .await
    }
}
