//! Result of resolving one chunk.

use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// One raw record: field name → value exactly as served (no coercion).
pub type Record = BTreeMap<String, String>;

/// Which request of the two-stage protocol a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Index request resolving a chunk to a `datos` pointer.
    Index,
    /// Payload request against the pointer.
    Data,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Index => f.write_str("index"),
            Stage::Data => f.write_str("data"),
        }
    }
}

/// Why a chunk could not be resolved. Aborts the station's run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FatalReason {
    #[error("{stage} stage gave up after {attempts} attempt(s); last failure: {last}")]
    ExhaustedRetries {
        stage: Stage,
        attempts: u32,
        last: String,
    },

    #[error("{stage} stage returned status {status}: {detail}")]
    UnexpectedStatus {
        stage: Stage,
        status: u16,
        detail: String,
    },

    #[error("{stage} stage payload could not be parsed: {detail}")]
    MalformedPayload { stage: Stage, detail: String },

    #[error("{stage} stage request failed: {detail}")]
    Unrecoverable { stage: Stage, detail: String },
}

/// Tagged result of one chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkOutcome {
    /// Records served for the chunk, in payload order.
    Fetched(Vec<Record>),
    /// The API reported that no data exists in the chunk.
    EmptyConfirmed,
    /// Resolution failed for good.
    Fatal(FatalReason),
}

impl ChunkOutcome {
    /// Records carried by the outcome; empty unless `Fetched`.
    pub fn records(&self) -> &[Record] {
        match self {
            ChunkOutcome::Fetched(records) => records,
            ChunkOutcome::EmptyConfirmed | ChunkOutcome::Fatal(_) => &[],
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, ChunkOutcome::Fatal(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            ChunkOutcome::Fetched(_) => "fetched",
            ChunkOutcome::EmptyConfirmed => "empty",
            ChunkOutcome::Fatal(_) => "fatal",
        }
    }
}
