//! Stage A: resolve a chunk to its `datos` pointer.

use serde_json::Value;

use crate::http::{decode_body, HttpResponse};
use crate::planner::Chunk;
use crate::retry::{classify_status, parse_retry_after, Failure, FailureKind};

use super::parse;

/// `<base>/fechaini/<s>T00:00:00UTC/fechafin/<e>T00:00:00UTC/estacion/<id>`.
/// The API treats `fechafin` as inclusive, so the boundary day is served by
/// both neighbouring chunks and deduplicated downstream.
pub(crate) fn index_url(base: &str, station: &str, chunk: &Chunk) -> String {
    format!(
        "{}/fechaini/{}T00:00:00UTC/fechafin/{}T00:00:00UTC/estacion/{}",
        base.trim_end_matches('/'),
        chunk.start.format("%Y-%m-%d"),
        chunk.end.format("%Y-%m-%d"),
        station
    )
}

/// Judge one index response. `Ok` carries the pointer.
pub(crate) fn judge_index(resp: &HttpResponse) -> Result<String, Failure> {
    let retry_after = resp.header("Retry-After").and_then(parse_retry_after);
    if resp.status == 429 || (500..600).contains(&resp.status) {
        return Err(Failure::new(
            classify_status(resp.status, retry_after),
            format!("index HTTP {}", resp.status),
        ));
    }

    let text = decode_body(&resp.body);
    let map = match serde_json::from_str::<Value>(&text) {
        Ok(Value::Object(map)) => map,
        _ if resp.is_success() => {
            return Err(Failure::new(
                FailureKind::Malformed,
                format!("index document is not a JSON object: {}", snippet(&text)),
            ))
        }
        _ => {
            return Err(Failure::new(
                classify_status(resp.status, retry_after),
                format!("index HTTP {}: {}", resp.status, snippet(&text)),
            ))
        }
    };

    let status = parse::estado(&map).unwrap_or(resp.status);
    let descripcion = parse::descripcion(&map);
    if !(200..300).contains(&status) {
        return Err(Failure::new(
            classify_status(status, retry_after),
            format!("estado {status}: {descripcion}"),
        ));
    }
    parse::datos(&map).ok_or_else(|| {
        Failure::new(
            FailureKind::MissingPointer,
            format!("estado {status} without datos: {descripcion}"),
        )
    })
}

/// Failures for which the query-parameter credential form is tried.
pub(crate) fn wants_query_fallback(kind: FailureKind) -> bool {
    matches!(
        kind,
        FailureKind::NotFound
            | FailureKind::Status(_)
            | FailureKind::MissingPointer
            | FailureKind::Malformed
    )
}

fn snippet(text: &str) -> String {
    text.chars().take(200).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn resp(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn builds_index_url() {
        let chunk = Chunk {
            start: NaiveDate::from_ymd_opt(1980, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(1980, 4, 1).unwrap(),
        };
        assert_eq!(
            index_url("https://api.example/datos/", "0200E", &chunk),
            "https://api.example/datos/fechaini/1980-01-01T00:00:00UTC/fechafin/1980-04-01T00:00:00UTC/estacion/0200E"
        );
    }

    #[test]
    fn success_yields_pointer() {
        let r = resp(200, r#"{"descripcion":"exito","estado":200,"datos":"https://x/d","metadatos":"https://x/m"}"#);
        assert_eq!(judge_index(&r).unwrap(), "https://x/d");
    }

    #[test]
    fn estado_overrides_http_status() {
        let r = resp(200, r#"{"descripcion":"No hay datos","estado":404}"#);
        assert_eq!(judge_index(&r).unwrap_err().kind, FailureKind::NotFound);
        let r = resp(200, r#"{"descripcion":"API key invalido","estado":401}"#);
        assert_eq!(judge_index(&r).unwrap_err().kind, FailureKind::Status(401));
    }

    #[test]
    fn throttling_is_read_from_http_first() {
        let r = HttpResponse {
            status: 429,
            headers: vec![("Retry-After".into(), "7".into())],
            body: b"Too Many Requests".to_vec(),
        };
        assert_eq!(
            judge_index(&r).unwrap_err().kind,
            FailureKind::RateLimited {
                retry_after: Some(std::time::Duration::from_secs(7))
            }
        );
        assert_eq!(
            judge_index(&resp(503, "")).unwrap_err().kind,
            FailureKind::Server(503)
        );
    }

    #[test]
    fn success_without_pointer() {
        let r = resp(200, r#"{"descripcion":"exito","estado":200}"#);
        assert_eq!(judge_index(&r).unwrap_err().kind, FailureKind::MissingPointer);
        assert!(wants_query_fallback(FailureKind::MissingPointer));
        assert!(!wants_query_fallback(FailureKind::Server(500)));
    }

    #[test]
    fn non_json_bodies() {
        assert_eq!(judge_index(&resp(200, "<html>")).unwrap_err().kind, FailureKind::Malformed);
        assert_eq!(judge_index(&resp(404, "<html>")).unwrap_err().kind, FailureKind::NotFound);
    }
}
