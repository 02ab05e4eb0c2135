//! Parse raw header lines and decode response bodies.

/// Split one raw header line into name and value. Status lines, blank lines
/// and lines without a colon yield `None`.
pub fn parse_header_line(line: &str) -> Option<(String, String)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with("HTTP/") {
        return None;
    }
    let (name, value) = line.split_once(':')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name.to_string(), value.trim().to_string()))
}

/// Decode a body as UTF-8, falling back to Latin-1 (each byte is one char).
/// AEMET serves payloads as ISO-8859-15, which agrees with Latin-1 for
/// everything that appears in station records.
pub fn decode_body(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}
