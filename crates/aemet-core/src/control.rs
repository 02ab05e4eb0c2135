//! Cancellation for long-running station runs.
//!
//! A `CancelToken` is shared by the CLI's Ctrl-C handler and every driver.
//! Backoff and politeness waits go through `Sleeper::sleep`, which returns as
//! soon as the token is cancelled instead of after the full delay; the curl
//! transport polls the same token from its progress callback.

use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Returned by any wait or request interrupted by cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("operation cancelled")]
pub struct Cancelled;

/// Blocking suspension point. Implemented by `CancelToken`; tests substitute
/// a recorder so backoff schedules can be asserted without waiting.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, delay: Duration) -> Result<(), Cancelled>;
}

#[derive(Default)]
struct CancelState {
    cancelled: Mutex<bool>,
    wake: Condvar,
}

/// Shared cancellation flag with an interruptible wait.
#[derive(Clone, Default)]
pub struct CancelToken {
    state: Arc<CancelState>,
}

impl std::fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation and wake every thread blocked in `wait_for`.
    pub fn cancel(&self) {
        let mut flag = self
            .state
            .cancelled
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *flag = true;
        self.state.wake.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        *self
            .state
            .cancelled
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }

    /// Block for `delay`, returning early with `Cancelled` if the token fires.
    /// A delay too large to express as an `Instant` waits until cancelled.
    pub fn wait_for(&self, delay: Duration) -> Result<(), Cancelled> {
        let deadline = Instant::now().checked_add(delay);
        let mut flag = self
            .state
            .cancelled
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        loop {
            if *flag {
                return Err(Cancelled);
            }
            flag = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Ok(());
                    }
                    self.state
                        .wake
                        .wait_timeout(flag, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
                None => self
                    .state
                    .wake
                    .wait(flag)
                    .unwrap_or_else(PoisonError::into_inner),
            };
        }
    }
}

impl Sleeper for CancelToken {
    fn sleep(&self, delay: Duration) -> Result<(), Cancelled> {
        self.wait_for(delay)
    }
}
