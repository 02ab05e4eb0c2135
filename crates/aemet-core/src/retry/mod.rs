//! Retry and backoff policy.
//!
//! This module classifies each failed attempt (transport errors, HTTP
//! statuses, empty or unparseable bodies) and turns it into a decision:
//! wait and retry, honor a rate-limit hint, accept "no data", or give up.
//! Both stages of the fetcher share the same policy and loop.

mod classify;
mod error;
mod policy;
mod run;

pub use classify::{classify_status, classify_transport, parse_retry_after};
pub use error::{Failure, FailureKind};
pub use policy::{AttemptBudget, Decision, RetryPolicy};
pub use run::{run_with_retry, Resolved, StageError};

pub(crate) use policy::random_up_to;
