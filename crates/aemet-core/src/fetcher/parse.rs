//! Strict interpretation of index and data documents.

use serde_json::{Map, Value};

use crate::outcome::Record;

/// What a successfully parsed data body contains.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Payload {
    Records(Vec<Record>),
    /// Status document instead of data.
    Envelope { estado: Option<u16>, descripcion: String },
}

const ENVELOPE_KEYS: [&str; 4] = ["estado", "descripcion", "datos", "metadatos"];

/// Strict JSON: an array of objects, or one object. `None` for anything else.
pub(crate) fn parse_payload(text: &str) -> Option<Payload> {
    match serde_json::from_str::<Value>(text).ok()? {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(map) => Some(to_record(map)),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()
            .map(Payload::Records),
        Value::Object(map) if is_envelope(&map) => Some(Payload::Envelope {
            estado: estado(&map),
            descripcion: descripcion(&map),
        }),
        Value::Object(map) => Some(Payload::Records(vec![to_record(map)])),
        _ => None,
    }
}

fn is_envelope(map: &Map<String, Value>) -> bool {
    map.contains_key("estado") && map.keys().all(|k| ENVELOPE_KEYS.contains(&k.as_str()))
}

/// `estado` as served: a number or a numeric string.
pub(crate) fn estado(map: &Map<String, Value>) -> Option<u16> {
    match map.get("estado")? {
        Value::Number(n) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub(crate) fn descripcion(map: &Map<String, Value>) -> String {
    map.get("descripcion")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Non-empty `datos` pointer, if any.
pub(crate) fn datos(map: &Map<String, Value>) -> Option<String> {
    map.get("datos")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Values are kept as raw strings; numbers keep their JSON spelling.
fn to_record(map: Map<String, Value>) -> Record {
    map.into_iter()
        .map(|(k, v)| {
            let v = match v {
                Value::String(s) => s,
                Value::Null => String::new(),
                other => other.to_string(),
            };
            (k, v)
        })
        .collect()
}
