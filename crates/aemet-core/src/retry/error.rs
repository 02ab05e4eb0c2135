//! Failure description fed to the retry policy.

use std::fmt;
use std::time::Duration;

/// High-level classification of one failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Connect or transfer timed out.
    Timeout,
    /// Network-level failure (connection refused/reset, DNS, TLS handshake).
    Connection,
    /// Remote 5xx.
    Server(u16),
    /// HTTP 429, with the server's `Retry-After` if it sent a valid one.
    RateLimited { retry_after: Option<Duration> },
    /// HTTP 404 (or an envelope with `estado: 404`).
    NotFound,
    /// Payload response with an empty body.
    EmptyBody,
    /// Body present but not parseable, even leniently.
    Malformed,
    /// Successful index document without a `datos` pointer.
    MissingPointer,
    /// Any other non-success status.
    Status(u16),
    /// Transport error that retrying cannot fix (bad URL, unsupported protocol).
    Other,
}

/// A failed attempt: its kind plus a human-readable detail for logs and reasons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub kind: FailureKind,
    pub detail: String,
}

impl Failure {
    pub fn new(kind: FailureKind, detail: impl Into<String>) -> Self {
        Failure {
            kind,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.detail)
    }
}
