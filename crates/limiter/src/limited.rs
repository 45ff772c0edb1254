//! Wrapping an async function so that every call is throttled.

use std::future::Future;
use std::sync::Arc;

use crate::error::Result;
use crate::limiter::ConcurrencyLimiter;

/// An async operation paired with the limiter that throttles it.
///
/// Calls with identical arguments are not merged: each one takes a slot and
/// runs the operation.
pub struct Limited<F> {
    limiter: ConcurrencyLimiter,
    op: Arc<F>,
}

impl<F> Limited<F> {
    pub fn new(limiter: ConcurrencyLimiter, op: F) -> Self {
        Self {
            limiter,
            op: Arc::new(op),
        }
    }

    /// Call the wrapped operation, waiting for a slot if the limiter is saturated.
    pub fn call<A, Fut>(&self, args: A) -> impl Future<Output = Fut::Output> + use<F, A, Fut>
    where
        F: Fn(A) -> Fut,
        Fut: Future,
    {
        let op = Arc::clone(&self.op);
        self.limiter.run(move || op(args))
    }

    pub fn limiter(&self) -> &ConcurrencyLimiter {
        &self.limiter
    }
}

impl<F> Clone for Limited<F> {
    fn clone(&self) -> Self {
        Self {
            limiter: self.limiter.clone(),
            op: Arc::clone(&self.op),
        }
    }
}

/// Wrap `op` so that no more than `bound` calls to it are unresolved at once.
///
/// # Errors
/// [`crate::LimiterError::ZeroBound`] when `bound` is 0.
pub fn limit<F>(bound: usize, op: F) -> Result<Limited<F>> {
    let limiter = ConcurrencyLimiter::new("limited", bound)?;
    Ok(Limited::new(limiter, op))
}
