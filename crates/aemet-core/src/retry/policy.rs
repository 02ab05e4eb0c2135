use std::time::Duration;

use crate::outcome::{FatalReason, Stage};

use super::error::{Failure, FailureKind};

/// What the caller should do after a failed attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Transient failure: wait, then try again.
    Retry(Duration),
    /// Server asked us to slow down: wait, then try again.
    RateLimited(Duration),
    /// The API says there is no data for this chunk. Not an error.
    TerminalEmpty,
    /// Give up on the chunk (and therefore the station run).
    Fatal(FatalReason),
}

/// Attempt counters for one stage of one chunk. Both are 1-based and include
/// the attempt being judged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptBudget {
    pub attempt: u32,
    pub malformed: u32,
}

/// Linear backoff with jitter and a ceiling, plus a separate slower schedule
/// for rate limiting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of attempts per stage (including the first).
    pub max_attempts: u32,
    /// Backoff step; attempt `n` waits `base_delay * n` plus jitter.
    pub base_delay: Duration,
    /// Upper bound of the uniform random jitter added to each backoff.
    pub jitter: Duration,
    /// Step used for 429 responses without a usable `Retry-After`.
    pub rate_limit_base: Duration,
    /// Ceiling for every computed delay. A server-provided `Retry-After` is
    /// honored verbatim and not capped.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(1500),
            jitter: Duration::from_millis(800),
            rate_limit_base: Duration::from_secs(60),
            max_delay: Duration::from_secs(600),
        }
    }
}

/// A malformed body gets one more chance; the second one is fatal.
const MALFORMED_LIMIT: u32 = 2;

impl RetryPolicy {
    /// Classify one failed attempt of `stage`.
    pub fn decide(&self, stage: Stage, budget: AttemptBudget, failure: &Failure) -> Decision {
        match failure.kind {
            FailureKind::NotFound if stage == Stage::Index => return Decision::TerminalEmpty,
            FailureKind::NotFound => {
                return Decision::Fatal(FatalReason::UnexpectedStatus {
                    stage,
                    status: 404,
                    detail: failure.detail.clone(),
                })
            }
            FailureKind::Status(status) => {
                return Decision::Fatal(FatalReason::UnexpectedStatus {
                    stage,
                    status,
                    detail: failure.detail.clone(),
                })
            }
            FailureKind::MissingPointer | FailureKind::Other => {
                return Decision::Fatal(FatalReason::Unrecoverable {
                    stage,
                    detail: failure.detail.clone(),
                })
            }
            FailureKind::Malformed if budget.malformed >= MALFORMED_LIMIT => {
                return Decision::Fatal(FatalReason::MalformedPayload {
                    stage,
                    detail: failure.detail.clone(),
                })
            }
            _ => {}
        }

        if budget.attempt >= self.max_attempts {
            return Decision::Fatal(FatalReason::ExhaustedRetries {
                stage,
                attempts: budget.attempt,
                last: failure.to_string(),
            });
        }

        match failure.kind {
            FailureKind::RateLimited {
                retry_after: Some(hint),
            } => Decision::RateLimited(hint),
            FailureKind::RateLimited { retry_after: None } => {
                Decision::RateLimited(self.rate_limit_delay(budget.attempt))
            }
            _ => Decision::Retry(self.backoff(budget.attempt)),
        }
    }

    /// `min(base * attempt + U(0, jitter), max_delay)`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let raw = self
            .base_delay
            .saturating_mul(attempt.max(1))
            .saturating_add(random_up_to(self.jitter));
        raw.min(self.max_delay)
    }

    /// `min(rate_limit_base * attempt, max_delay)`.
    pub fn rate_limit_delay(&self, attempt: u32) -> Duration {
        self.rate_limit_base
            .saturating_mul(attempt.max(1))
            .min(self.max_delay)
    }
}

/// Uniform random duration in `[0, upper]`.
pub(crate) fn random_up_to(upper: Duration) -> Duration {
    if upper.is_zero() {
        return Duration::ZERO;
    }
    upper.mul_f64(fastrand::f64())
}
