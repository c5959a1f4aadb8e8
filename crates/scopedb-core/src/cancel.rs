//! Cooperative cancellation.
//!
//! Cancellation is point-based: it only becomes observable where a unit of
//! work actually suspends. [`cancellable`] is that suspension point. The
//! execution engine never polls the token on its own.

use std::future::Future;
use std::pin::pin;
use std::task::Poll;

use thiserror::Error;
pub use tokio_util::sync::CancellationToken;

/// Raised when a suspension point observes a cancellation request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Error)]
#[error("operation cancelled")]
pub struct Cancelled;

/// Lets callers special-case cancellation without knowing the concrete error.
pub trait IsCancelled {
    fn is_cancelled(&self) -> bool;
}

impl IsCancelled for Cancelled {
    fn is_cancelled(&self) -> bool {
        true
    }
}

/// Await `fut` as a cancellable suspension point.
///
/// A future that completes on its first poll completes even when `token` has
/// already fired: nothing suspended, so there was nothing to cancel. Once the
/// future is pending, whichever of completion or cancellation comes first wins.
pub async fn cancellable<F>(token: &CancellationToken, fut: F) -> Result<F::Output, Cancelled>
where
    F: Future,
{
    let mut fut = pin!(fut);

    let first = std::future::poll_fn(|cx| Poll::Ready(fut.as_mut().poll(cx))).await;
    if let Poll::Ready(out) = first {
        return Ok(out);
    }

    tokio::select! {
        biased;
        out = fut.as_mut() => Ok(out),
        _ = token.cancelled() => {
            tracing::trace!("suspension point observed cancellation");
            Err(Cancelled)
        }
    }
}
