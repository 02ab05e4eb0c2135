//! Stage B: download and interpret the payload behind a `datos` pointer.

use crate::http::{decode_body, HttpResponse};
use crate::outcome::Record;
use crate::retry::{classify_status, parse_retry_after, Failure, FailureKind};

use super::lenient;
use super::parse::{parse_payload, Payload};

/// Judge one data response. `Ok` carries the records in payload order.
pub(crate) fn judge_data(resp: &HttpResponse) -> Result<Vec<Record>, Failure> {
    if !resp.is_success() {
        let retry_after = resp.header("Retry-After").and_then(parse_retry_after);
        return Err(Failure::new(
            classify_status(resp.status, retry_after),
            format!("data HTTP {}", resp.status),
        ));
    }

    let text = decode_body(&resp.body);
    if text.trim().is_empty() {
        return Err(Failure::new(FailureKind::EmptyBody, "data body is empty"));
    }

    match parse_payload(&text) {
        Some(Payload::Records(records)) => Ok(records),
        Some(Payload::Envelope {
            estado: Some(estado),
            descripcion,
        }) if !(200..300).contains(&estado) => Err(Failure::new(
            classify_status(estado, None),
            format!("data estado {estado}: {descripcion}"),
        )),
        Some(Payload::Envelope { descripcion, .. }) => Err(Failure::new(
            FailureKind::Malformed,
            format!("status document instead of data: {descripcion}"),
        )),
        None => match lenient::parse_dump(&text) {
            Some(records) => {
                tracing::debug!(records = records.len(), "recovered records leniently");
                Ok(records)
            }
            None => Err(Failure::new(
                FailureKind::Malformed,
                format!("unparseable payload ({} bytes)", resp.body.len()),
            )),
        },
    }
}
