//! Concurrency limiter with an explicit FIFO queue.
//!
//! ## State
//! - `in_flight`: slots currently held, never above `bound`
//! - `queue`: one wake-up handle per call that arrived while saturated
//!
//! ## Transitions
//! - call arrives with a free slot: `in_flight += 1`, dispatch
//! - call arrives saturated: push to the back of the queue
//! - a dispatched call settles (success, error, panic or drop): the slot is
//!   handed straight to the oldest live waiter, or `in_flight -= 1` when
//!   nobody is waiting
//!
//! Admission happens when the call is made, not when its future is first
//! polled, so call order alone decides the order queued work starts in.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;
use tracing::trace;

use crate::error::{LimiterError, Result};

/// Gate that lets at most `bound` operations run at once.
///
/// Cloning is cheap and every clone shares the same slots and queue, so one
/// limiter is created per remote endpoint and handed to everything that calls it.
#[derive(Debug, Clone)]
pub struct ConcurrencyLimiter {
    shared: Arc<Shared>,
}

#[derive(Debug)]
struct Shared {
    name: String,
    bound: usize,
    state: Mutex<State>,
}

#[derive(Debug, Default)]
struct State {
    in_flight: usize,
    queue: VecDeque<oneshot::Sender<()>>,
}

impl ConcurrencyLimiter {
    /// Create a limiter.
    ///
    /// # Arguments
    /// * `name` - Label used in log output (e.g. the site being throttled)
    /// * `bound` - Maximum number of operations in flight at once
    ///
    /// # Errors
    /// [`LimiterError::ZeroBound`] when `bound` is 0.
    pub fn new(name: impl Into<String>, bound: usize) -> Result<Self> {
        let name = name.into();
        if bound == 0 {
            return Err(LimiterError::ZeroBound { name });
        }

        Ok(Self {
            shared: Arc::new(Shared {
                name,
                bound,
                state: Mutex::new(State::default()),
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    pub fn bound(&self) -> usize {
        self.shared.bound
    }

    /// Number of operations currently holding a slot.
    pub fn in_flight(&self) -> usize {
        self.shared.lock().in_flight
    }

    /// Number of calls still waiting for a slot.
    pub fn queued(&self) -> usize {
        self.shared
            .lock()
            .queue
            .iter()
            .filter(|waiter| !waiter.is_closed())
            .count()
    }

    /// Run `op` once a slot is free.
    ///
    /// The slot is claimed (or the call queued) right here, before the
    /// returned future is polled. The future resolves to whatever `op`
    /// produces; errors are not inspected, retried or wrapped.
    ///
    /// A returned future that is never polled keeps its place until dropped.
    pub fn run<F, Fut>(&self, op: F) -> impl Future<Output = Fut::Output> + use<F, Fut>
    where
        F: FnOnce() -> Fut,
        Fut: Future,
    {
        let admission = self.shared.admit();

        async move {
            let _slot = admission.into_slot().await;
            op().await
        }
    }

    /// Wrap `op` so every call goes through this limiter.
    pub fn wrap<F>(&self, op: F) -> crate::Limited<F> {
        crate::Limited::new(self.clone(), op)
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn admit(self: &Arc<Self>) -> Admission {
        let mut state = self.lock();

        if state.in_flight < self.bound {
            state.in_flight += 1;
            trace!(
                limiter = %self.name,
                in_flight = state.in_flight,
                "Dispatching call"
            );
            return Admission::Ready(Slot {
                shared: Arc::clone(self),
            });
        }

        let (tx, rx) = oneshot::channel();
        state.queue.push_back(tx);
        trace!(
            limiter = %self.name,
            queued = state.queue.len(),
            "Limiter saturated, queueing call"
        );

        Admission::Queued(Waiter {
            shared: Arc::clone(self),
            rx,
        })
    }

    /// Called whenever a slot holder settles.
    fn release(&self) {
        let mut state = self.lock();

        // waiters whose caller gave up have a closed receiver; skip them
        while let Some(waiter) = state.queue.pop_front() {
            if waiter.send(()).is_ok() {
                trace!(
                    limiter = %self.name,
                    queued = state.queue.len(),
                    "Handing slot to next queued call"
                );
                return;
            }
        }

        state.in_flight = state.in_flight.saturating_sub(1);
        trace!(
            limiter = %self.name,
            in_flight = state.in_flight,
            "Slot released"
        );
    }
}

enum Admission {
    Ready(Slot),
    Queued(Waiter),
}

impl Admission {
    async fn into_slot(self) -> Slot {
        let mut admission = self;
        loop {
            match admission {
                Admission::Ready(slot) => return slot,
                Admission::Queued(waiter) => {
                    let shared = Arc::clone(&waiter.shared);
                    match waiter.wait().await {
                        Some(slot) => return slot,
                        // only reachable if the wake-up handle vanished unsent
                        None => admission = shared.admit(),
                    }
                }
            }
        }
    }
}

/// A held concurrency slot. Dropping it is the "finally" of every call.
struct Slot {
    shared: Arc<Shared>,
}

impl Drop for Slot {
    fn drop(&mut self) {
        self.shared.release();
    }
}

struct Waiter {
    shared: Arc<Shared>,
    rx: oneshot::Receiver<()>,
}

impl Waiter {
    async fn wait(mut self) -> Option<Slot> {
        match (&mut self.rx).await {
            Ok(()) => Some(Slot {
                shared: Arc::clone(&self.shared),
            }),
            Err(_) => None,
        }
    }
}

impl Drop for Waiter {
    fn drop(&mut self) {
        // a slot handed over after the caller stopped listening must go to the next waiter
        if self.rx.try_recv().is_ok() {
            self.shared.release();
        }
    }
}
