//! Retry loop: run a closure until success or the policy says stop.

use thiserror::Error;

use crate::control::{Cancelled, Sleeper};
use crate::outcome::{FatalReason, Stage};

use super::error::{Failure, FailureKind};
use super::policy::{AttemptBudget, Decision, RetryPolicy};

/// Successful end of a stage loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved<T> {
    Value(T),
    /// The policy classified a failure as "no data in range".
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StageError {
    #[error(transparent)]
    Fatal(FatalReason),
    #[error("cancelled")]
    Cancelled,
}

impl From<Cancelled> for StageError {
    fn from(_: Cancelled) -> Self {
        StageError::Cancelled
    }
}

/// Runs `f` until it succeeds or the policy stops it. `f` receives the 1-based
/// attempt number and returns `Err(Cancelled)` to abort the loop outright.
/// Waits go through `sleeper` so cancellation interrupts them.
pub fn run_with_retry<T, F>(
    policy: &RetryPolicy,
    stage: Stage,
    sleeper: &dyn Sleeper,
    mut f: F,
) -> Result<Resolved<T>, StageError>
where
    F: FnMut(u32) -> Result<Result<T, Failure>, Cancelled>,
{
    let mut budget = AttemptBudget {
        attempt: 1,
        malformed: 0,
    };
    loop {
        let failure = match f(budget.attempt)? {
            Ok(value) => return Ok(Resolved::Value(value)),
            Err(failure) => failure,
        };
        if failure.kind == FailureKind::Malformed {
            budget.malformed += 1;
        }
        match policy.decide(stage, budget, &failure) {
            Decision::Retry(delay) => {
                tracing::warn!(
                    %stage,
                    attempt = budget.attempt,
                    delay_ms = delay.as_millis() as u64,
                    failure = %failure,
                    "retrying"
                );
                sleeper.sleep(delay)?;
            }
            Decision::RateLimited(delay) => {
                tracing::warn!(
                    %stage,
                    attempt = budget.attempt,
                    delay_ms = delay.as_millis() as u64,
                    "rate limited, backing off"
                );
                sleeper.sleep(delay)?;
            }
            Decision::TerminalEmpty => {
                tracing::debug!(%stage, attempt = budget.attempt, "no data in range");
                return Ok(Resolved::Empty);
            }
            Decision::Fatal(reason) => return Err(StageError::Fatal(reason)),
        }
        budget.attempt += 1;
    }
}
