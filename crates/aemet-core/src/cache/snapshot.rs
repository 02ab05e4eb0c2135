//! On-disk shape of one chunk snapshot.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::outcome::{ChunkOutcome, Record};
use crate::planner::Chunk;

/// `status` distinguishes "attempted, no data" from a file with records;
/// an absent file means "not attempted".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub(crate) enum Snapshot {
    Fetched {
        station: String,
        start: NaiveDate,
        end: NaiveDate,
        records: Vec<Record>,
    },
    Empty {
        station: String,
        start: NaiveDate,
        end: NaiveDate,
    },
}

impl Snapshot {
    /// `None` for `Fatal`, which is never persisted.
    pub(crate) fn from_outcome(station: &str, chunk: &Chunk, outcome: &ChunkOutcome) -> Option<Self> {
        let station = station.to_string();
        match outcome {
            ChunkOutcome::Fetched(records) => Some(Snapshot::Fetched {
                station,
                start: chunk.start,
                end: chunk.end,
                records: records.clone(),
            }),
            ChunkOutcome::EmptyConfirmed => Some(Snapshot::Empty {
                station,
                start: chunk.start,
                end: chunk.end,
            }),
            ChunkOutcome::Fatal(_) => None,
        }
    }

    pub(crate) fn matches(&self, station: &str, chunk: &Chunk) -> bool {
        let (s, start, end) = match self {
            Snapshot::Fetched {
                station, start, end, ..
            }
            | Snapshot::Empty {
                station, start, end, ..
            } => (station, start, end),
        };
        s == station && *start == chunk.start && *end == chunk.end
    }

    pub(crate) fn into_outcome(self) -> ChunkOutcome {
        match self {
            Snapshot::Fetched { records, .. } => ChunkOutcome::Fetched(records),
            Snapshot::Empty { .. } => ChunkOutcome::EmptyConfirmed,
        }
    }
}
