//! Classify HTTP status and transport errors into failure kinds.

use std::time::Duration;

use crate::http::TransportError;

use super::error::FailureKind;

/// Classify a non-success HTTP status (or an envelope's `estado`).
pub fn classify_status(code: u16, retry_after: Option<Duration>) -> FailureKind {
    match code {
        429 => FailureKind::RateLimited { retry_after },
        404 => FailureKind::NotFound,
        500..=599 => FailureKind::Server(code),
        _ => FailureKind::Status(code),
    }
}

/// Classify a transport error. Cancellation is handled by the caller and
/// never reaches the policy.
pub fn classify_transport(e: &TransportError) -> FailureKind {
    match e {
        TransportError::Timeout(_) => FailureKind::Timeout,
        TransportError::Connection(_) => FailureKind::Connection,
        TransportError::Aborted | TransportError::Other(_) => FailureKind::Other,
    }
}

/// Parse a `Retry-After` value given as integer seconds.
///
/// HTTP-date values and anything else non-numeric are treated as absent so
/// the policy falls back to its own schedule.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    let value = value.trim();
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse::<u64>().ok().map(Duration::from_secs)
}
