//! Chunk type and month-step planning.

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ConfigError;

/// A date interval [start, end) (half-open).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Chunk {
    /// First day (inclusive).
    pub start: NaiveDate,
    /// Upper bound (exclusive).
    pub end: NaiveDate,
}

impl Chunk {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Chunk { start, end }
    }

    /// Normalized bounds used in snapshot file names: `YYYYMMDD_YYYYMMDD`.
    pub fn key(&self) -> String {
        format!("{}_{}", self.start.format("%Y%m%d"), self.end.format("%Y%m%d"))
    }

    /// Number of days covered.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days().max(0)
    }
}

impl fmt::Display for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Builds the chunk plan for `[start, end]` stepping `months` calendar months.
///
/// Each chunk starts where the previous one ended and the last one is
/// clipped to `end`. Steps are taken from the previous chunk's start, so a
/// plan restarted from any of its own boundaries reproduces its tail.
/// `start == end` yields an empty plan.
pub fn plan_chunks(start: NaiveDate, end: NaiveDate, months: u32) -> Result<Vec<Chunk>, ConfigError> {
    if months == 0 {
        return Err(ConfigError::InvalidChunkSize(months));
    }
    if start > end {
        return Err(ConfigError::InvalidRange { start, end });
    }

    let mut out = Vec::new();
    let mut cursor = start;
    while cursor < end {
        let next = cursor
            .checked_add_months(Months::new(months))
            .unwrap_or(NaiveDate::MAX)
            .min(end);
        out.push(Chunk::new(cursor, next));
        cursor = next;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn two_quarters_for_first_half_of_1980() {
        let chunks = plan_chunks(d(1980, 1, 1), d(1980, 7, 1), 3).unwrap();
        assert_eq!(
            chunks,
            vec![
                Chunk::new(d(1980, 1, 1), d(1980, 4, 1)),
                Chunk::new(d(1980, 4, 1), d(1980, 7, 1)),
            ]
        );
    }

    #[test]
    fn last_chunk_is_clipped() {
        let chunks = plan_chunks(d(1980, 1, 1), d(1980, 5, 15), 3).unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1], Chunk::new(d(1980, 4, 1), d(1980, 5, 15)));
    }

    #[test]
    fn plans_are_contiguous_and_cover_range() {
        let starts = [d(1980, 1, 1), d(1983, 1, 31), d(1999, 12, 15), d(2024, 2, 29)];
        let ends = [d(1980, 1, 2), d(1981, 3, 31), d(2025, 12, 31)];
        for &start in &starts {
            for &end in &ends {
                if start >= end {
                    continue;
                }
                for months in 1..=13 {
                    let chunks = plan_chunks(start, end, months).unwrap();
                    assert_eq!(chunks.first().unwrap().start, start);
                    assert_eq!(chunks.last().unwrap().end, end);
                    for pair in chunks.windows(2) {
                        assert_eq!(pair[0].end, pair[1].start, "gap or overlap");
                    }
                    for c in &chunks {
                        assert!(c.start < c.end, "zero-length chunk {c}");
                    }
                }
            }
        }
    }

    #[test]
    fn month_end_steps_clamp_to_shorter_months() {
        let chunks = plan_chunks(d(1980, 1, 31), d(1980, 5, 1), 1).unwrap();
        assert_eq!(chunks[0], Chunk::new(d(1980, 1, 31), d(1980, 2, 29)));
        assert_eq!(chunks[1], Chunk::new(d(1980, 2, 29), d(1980, 3, 29)));
    }

    #[test]
    fn resumed_plan_matches_tail_of_full_plan() {
        let full = plan_chunks(d(1980, 1, 31), d(1990, 1, 1), 3).unwrap();
        for (i, chunk) in full.iter().enumerate() {
            let resumed = plan_chunks(chunk.start, d(1990, 1, 1), 3).unwrap();
            assert_eq!(resumed, full[i..].to_vec());
        }
    }

    #[test]
    fn zero_months_rejected() {
        assert_eq!(
            plan_chunks(d(1980, 1, 1), d(1981, 1, 1), 0),
            Err(ConfigError::InvalidChunkSize(0))
        );
    }

    #[test]
    fn inverted_range_rejected() {
        assert!(matches!(
            plan_chunks(d(1981, 1, 1), d(1980, 1, 1), 3),
            Err(ConfigError::InvalidRange { .. })
        ));
    }

    #[test]
    fn empty_range_plans_nothing() {
        assert!(plan_chunks(d(1980, 1, 1), d(1980, 1, 1), 3).unwrap().is_empty());
    }

    #[test]
    fn chunk_key_and_display() {
        let c = Chunk::new(d(1980, 1, 1), d(1980, 4, 1));
        assert_eq!(c.key(), "19800101_19800401");
        assert_eq!(c.to_string(), "[1980-01-01, 1980-04-01)");
        assert_eq!(c.days(), 91);
    }
}
