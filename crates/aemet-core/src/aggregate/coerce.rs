//! Numeric coercion of raw AEMET values.

use super::AggregateOptions;

/// Read a raw value as a number.
///
/// - surrounding whitespace is ignored
/// - decimal comma becomes a point (`"3,4"` → 3.4)
/// - the negligible token (`Ip`) is 0.0
/// - the unspecified token (`Varias`), empty strings and anything
///   unparseable or non-finite are missing
pub fn coerce_numeric(raw: &str, opts: &AggregateOptions) -> Option<f64> {
    let value = raw.trim();
    if value.is_empty() || value.eq_ignore_ascii_case(&opts.unspecified_token) {
        return None;
    }
    if value.eq_ignore_ascii_case(&opts.negligible_token) {
        return Some(0.0);
    }
    value
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}
