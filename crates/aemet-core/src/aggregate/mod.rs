//! Concatenate chunk outcomes into one deduplicated, gap-explicit daily
//! series. Pure: no I/O except the optional CSV write on the result.

mod coerce;
mod series;

pub use coerce::coerce_numeric;
pub use series::{CanonicalSeries, Cell, SeriesError, SeriesRow};

use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

use crate::config::AggregateConfig;
use crate::outcome::{ChunkOutcome, Record};

#[derive(Debug, Clone, PartialEq)]
pub struct AggregateOptions {
    pub date_field: String,
    pub entity_field: String,
    pub numeric_fields: BTreeSet<String>,
    pub negligible_token: String,
    pub unspecified_token: String,
}

impl From<&AggregateConfig> for AggregateOptions {
    fn from(cfg: &AggregateConfig) -> Self {
        AggregateOptions {
            date_field: cfg.date_field.clone(),
            entity_field: cfg.entity_field.clone(),
            numeric_fields: cfg.numeric_fields.iter().cloned().collect(),
            negligible_token: cfg.negligible_token.clone(),
            unspecified_token: cfg.unspecified_token.clone(),
        }
    }
}

impl Default for AggregateOptions {
    fn default() -> Self {
        AggregateOptions::from(&AggregateConfig::default())
    }
}

/// Build the canonical series for `station` from outcomes in chunk order.
///
/// Records are kept first-come per date (chunks overlap on their boundary
/// day). Records naming another station, or without a readable date, are
/// dropped with a warning.
pub fn aggregate(station: &str, outcomes: &[ChunkOutcome], opts: &AggregateOptions) -> CanonicalSeries {
    let mut by_date: BTreeMap<NaiveDate, &Record> = BTreeMap::new();
    let mut columns: BTreeSet<&str> = BTreeSet::new();
    let mut dropped = 0usize;

    for record in outcomes.iter().flat_map(ChunkOutcome::records) {
        if let Some(entity) = record.get(&opts.entity_field) {
            if entity.trim() != station {
                dropped += 1;
                continue;
            }
        }
        let Some(date) = record.get(&opts.date_field).and_then(|raw| parse_date(raw)) else {
            dropped += 1;
            continue;
        };
        if by_date.contains_key(&date) {
            continue;
        }
        columns.extend(
            record
                .keys()
                .map(String::as_str)
                .filter(|k| *k != opts.date_field),
        );
        by_date.insert(date, record);
    }
    if dropped > 0 {
        tracing::warn!(station, dropped, "records without a usable date or for another station");
    }

    let columns: Vec<String> = columns.into_iter().map(String::from).collect();
    let mut rows = Vec::new();
    if let (Some((&first, _)), Some((&last, _))) = (by_date.first_key_value(), by_date.last_key_value()) {
        for date in first.iter_days().take_while(|d| *d <= last) {
            let cells = match by_date.get(&date) {
                Some(record) => columns
                    .iter()
                    .map(|col| cell(col, record.get(col), opts))
                    .collect(),
                None => vec![Cell::Missing; columns.len()],
            };
            rows.push(SeriesRow { date, cells });
        }
    }

    CanonicalSeries {
        station: station.to_string(),
        date_field: opts.date_field.clone(),
        columns,
        rows,
    }
}

fn cell(column: &str, raw: Option<&String>, opts: &AggregateOptions) -> Cell {
    let Some(raw) = raw else {
        return Cell::Missing;
    };
    if opts.numeric_fields.contains(column) {
        return coerce_numeric(raw, opts).map_or(Cell::Missing, Cell::Number);
    }
    let text = raw.trim();
    if text.is_empty() {
        Cell::Missing
    } else {
        Cell::Text(text.to_string())
    }
}

/// `YYYY-MM-DD`, tolerating a trailing time part.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let day = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests;
