//! Error taxonomy shared by the pipeline components.
//!
//! Configuration problems are rejected before any request is issued.
//! Everything that can go wrong while resolving a chunk is either retried
//! inside the fetcher or surfaces here as a `PipelineError` that aborts the
//! station's run without touching committed progress.

use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

use crate::aggregate::SeriesError;
use crate::cache::CacheError;
use crate::outcome::FatalReason;
use crate::planner::Chunk;
use crate::progress::ProgressError;

/// Startup-time configuration errors. Never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("credential missing: environment variable {0} is unset or empty")]
    MissingCredential(String),

    #[error("chunk size must be at least one month (got {0})")]
    InvalidChunkSize(u32),

    #[error("invalid date range: start {start} is after end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("empty date range: start and end are both {0}")]
    EmptyRange(NaiveDate),

    #[error("invalid station id {0:?}: expected ASCII letters and digits")]
    InvalidStation(String),

    #[error("retry policy must allow at least one attempt")]
    ZeroAttempts,

    #[error("{field} must be a finite number of seconds between 0 and {max} (got {value})")]
    InvalidDelay {
        field: &'static str,
        value: String,
        max: u64,
    },

    #[error("invalid API base URL {url:?}: {reason}")]
    InvalidApiBase { url: String, reason: String },
}

/// Failure of one station's pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("station {station}: chunk {chunk} failed: {reason}")]
    Fatal {
        station: String,
        chunk: Chunk,
        reason: FatalReason,
    },

    #[error("station {station}: run cancelled")]
    Cancelled { station: String },

    #[error("station {station} is already being processed (lock held on {path})")]
    Locked { station: String, path: PathBuf },

    #[error("failed to open lock file '{0}'")]
    LockIo(PathBuf, #[source] std::io::Error),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Progress(#[from] ProgressError),

    #[error(transparent)]
    Series(#[from] SeriesError),
}

impl PipelineError {
    /// True when the run stopped because of a shutdown request rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, PipelineError::Cancelled { .. })
    }
}
