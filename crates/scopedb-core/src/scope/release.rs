//! Commit and release steps shared by the sync and async engines.
//!
//! Release order is fixed: rollback (only if a transaction is still open and
//! was not committed), then close. Every failure is collected, never raised.

use super::error::{ReleaseError, ReleaseStage};
use crate::resource::{AsyncResource, Resource};
use std::any::Any;

/// Owns a sync resource for the duration of one execution.
///
/// `finish` releases it exactly once. If the execution unwinds before
/// `finish` runs, `Drop` performs the same release and discards its errors,
/// since there is no outcome left to attach them to.
pub(crate) struct ReleaseGuard<R: Resource> {
    resource: Option<R>,
    committed: bool,
}

impl<R: Resource> ReleaseGuard<R> {
    pub(crate) fn new(resource: R) -> Self {
        Self {
            resource: Some(resource),
            committed: false,
        }
    }

    pub(crate) fn get(&mut self) -> &mut R {
        match self.resource.as_mut() {
            Some(resource) => resource,
            None => unreachable!("resource used after release"),
        }
    }

    pub(crate) fn commit_if(&mut self, enabled: bool, suppressed: &mut Vec<ReleaseError>) {
        let resource = self.get();
        if !enabled || !resource.is_transactional() {
            return;
        }
        tracing::debug!("committing transaction");
        match resource.commit() {
            Ok(()) => self.committed = true,
            Err(e) => suppressed.push(ReleaseError::new(ReleaseStage::Commit, e)),
        }
    }

    pub(crate) fn finish(mut self, suppressed: &mut Vec<ReleaseError>) {
        if let Some(resource) = self.resource.take() {
            release(resource, self.committed, suppressed);
        }
    }
}

impl<R: Resource> Drop for ReleaseGuard<R> {
    fn drop(&mut self) {
        if let Some(resource) = self.resource.take() {
            tracing::debug!("releasing resource during unwind");
            let mut discarded = Vec::new();
            release(resource, self.committed, &mut discarded);
        }
    }
}

fn release<R: Resource>(mut resource: R, committed: bool, suppressed: &mut Vec<ReleaseError>) {
    if resource.is_transactional() && !committed {
        tracing::debug!("rolling back transaction");
        if let Err(e) = resource.rollback() {
            suppressed.push(ReleaseError::new(ReleaseStage::Rollback, e));
        }
    }
    tracing::trace!("closing resource");
    if let Err(e) = resource.close() {
        suppressed.push(ReleaseError::new(ReleaseStage::Close, e));
    }
}

/// Commit an async resource if `enabled` and a transaction is open.
/// Returns whether the commit went through.
pub(crate) async fn commit_if_async<R: AsyncResource>(
    resource: &mut R,
    enabled: bool,
    suppressed: &mut Vec<ReleaseError>,
) -> bool {
    if !enabled || !resource.is_transactional() {
        return false;
    }
    tracing::debug!("committing transaction");
    match resource.commit().await {
        Ok(()) => true,
        Err(e) => {
            suppressed.push(ReleaseError::new(ReleaseStage::Commit, e));
            false
        }
    }
}

pub(crate) async fn release_async<R: AsyncResource>(
    mut resource: R,
    committed: bool,
    suppressed: &mut Vec<ReleaseError>,
) {
    if resource.is_transactional() && !committed {
        tracing::debug!("rolling back transaction");
        if let Err(e) = resource.rollback().await {
            suppressed.push(ReleaseError::new(ReleaseStage::Rollback, e));
        }
    }
    tracing::trace!("closing resource");
    if let Err(e) = resource.close().await {
        suppressed.push(ReleaseError::new(ReleaseStage::Close, e));
    }
}

/// Release an async resource whose operation panicked, then resume the
/// panic. Nothing was committed at that point; release errors are discarded.
pub(crate) async fn release_and_resume<R: AsyncResource, X>(
    resource: R,
    panic: Box<dyn Any + Send>,
) -> X {
    tracing::debug!("releasing resource after operation panic");
    let mut discarded = Vec::new();
    release_async(resource, false, &mut discarded).await;
    std::panic::resume_unwind(panic)
}
