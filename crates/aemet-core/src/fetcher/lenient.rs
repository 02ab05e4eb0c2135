//! Best-effort record extraction from payloads that are not valid JSON.
//!
//! Grammar, applied after an optional pass that collapses doubled quotes:
//!
//! ```text
//! dump   := (junk | object)*
//! object := '{' body '}'          body contains no braces
//! body   := (junk | pair)*
//! pair   := '"' key '"' ws* ':' ws* '"' value '"'
//! key    := [^"]+      value := [^"]*
//! ```
//!
//! Every object with at least one pair becomes one record. A text without
//! any braces is read as a single body.

use std::sync::OnceLock;

use regex::Regex;

use crate::outcome::Record;

fn object_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{[^{}]*\}").unwrap_or_else(|_| unreachable!()))
}

fn pair_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#""([^"]+)"\s*:\s*"([^"]*)""#).unwrap_or_else(|_| unreachable!()))
}

/// Extract records from a loosely JSON-shaped dump. `None` when nothing
/// matches the grammar.
pub fn parse_dump(text: &str) -> Option<Vec<Record>> {
    let records = extract(text);
    if !records.is_empty() {
        return Some(records);
    }
    // CSV-escaped dumps double every quote.
    if text.contains("\"\"") {
        let collapsed = text.replace("\"\"", "\"");
        let records = extract(&collapsed);
        if !records.is_empty() {
            return Some(records);
        }
    }
    None
}

fn extract(text: &str) -> Vec<Record> {
    if !text.contains('{') {
        return parse_body(text).into_iter().collect();
    }
    object_re()
        .find_iter(text)
        .filter_map(|m| parse_body(m.as_str()))
        .collect()
}

fn parse_body(body: &str) -> Option<Record> {
    let record: Record = pair_re()
        .captures_iter(body)
        .map(|c| (c[1].to_string(), c[2].to_string()))
        .collect();
    (!record.is_empty()).then_some(record)
}
