//! Resume cursor for one (station, start, end) request.
//!
//! The file holds the exclusive upper bound of the last resolved chunk.
//! It is rewritten in full after every chunk via temp-then-rename, so a
//! crash leaves either the previous cursor or the new one.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::request::FetchRequest;
use crate::storage::write_atomic;

#[derive(Debug, Error)]
pub enum ProgressError {
    #[error("progress file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("progress file '{path}' is not valid state JSON: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode progress state: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Persisted progress. Field names match the on-disk JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressState {
    pub station: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub months: u32,
    pub last_done: NaiveDate,
}

impl ProgressState {
    pub fn fresh(request: &FetchRequest) -> Self {
        ProgressState {
            station: request.station.clone(),
            start: request.start,
            end: request.end,
            months: request.months,
            last_done: request.start,
        }
    }

    /// Move the cursor forward. Never moves it back.
    pub fn advance(&mut self, to: NaiveDate) {
        if to > self.last_done {
            self.last_done = to;
        }
    }

    /// Clamp `last_done` into `[start, end]`.
    fn heal(&mut self) -> bool {
        let healed = self.last_done.clamp(self.start, self.end.max(self.start));
        let changed = healed != self.last_done;
        self.last_done = healed;
        changed
    }

    pub fn is_complete(&self) -> bool {
        self.last_done >= self.end
    }

    /// Share of the range behind the cursor, in `[0, 1]`.
    pub fn fraction_done(&self) -> f64 {
        let total = (self.end - self.start).num_days();
        if total <= 0 {
            return 1.0;
        }
        let done = (self.last_done - self.start).num_days().clamp(0, total);
        done as f64 / total as f64
    }
}

/// Progress files under one directory.
#[derive(Debug, Clone)]
pub struct ProgressStore {
    dir: PathBuf,
}

const SUFFIX: &str = ".state.json";

impl ProgressStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        ProgressStore { dir: dir.into() }
    }

    pub fn path_for(&self, request: &FetchRequest) -> PathBuf {
        self.dir.join(format!("{}{SUFFIX}", request.stem()))
    }

    /// Load the state for `request`, or a fresh one when no file exists.
    /// A cursor outside the range is healed back into it.
    pub fn load(&self, request: &FetchRequest) -> Result<ProgressState, ProgressError> {
        let path = self.path_for(request);
        let bytes = match fs::read(&path) {
            Ok(b) => b,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Ok(ProgressState::fresh(request))
            }
            Err(source) => return Err(ProgressError::Io { path, source }),
        };
        let mut state: ProgressState = serde_json::from_slice(&bytes)
            .map_err(|source| ProgressError::Decode { path: path.clone(), source })?;
        if state.months != request.months {
            tracing::warn!(
                station = %request.station,
                stored = state.months,
                requested = request.months,
                "chunk size changed since last run; continuing with the requested size"
            );
            state.months = request.months;
        }
        if state.heal() {
            tracing::warn!(
                station = %state.station,
                last_done = %state.last_done,
                "progress cursor was outside the range; healed"
            );
        }
        Ok(state)
    }

    pub fn save(&self, state: &ProgressState) -> Result<(), ProgressError> {
        let path = self.dir.join(format!(
            "{}_{}_{}{SUFFIX}",
            state.station, state.start, state.end
        ));
        let json = serde_json::to_vec_pretty(state).map_err(ProgressError::Encode)?;
        write_atomic(&path, &json).map_err(|source| ProgressError::Io { path, source })
    }

    /// Every readable progress file, sorted by path. Unreadable files are
    /// skipped with a warning.
    pub fn list(&self) -> Result<Vec<(PathBuf, ProgressState)>, ProgressError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(ProgressError::Io {
                    path: self.dir.clone(),
                    source,
                })
            }
        };
        let mut out = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| ProgressError::Io {
                path: self.dir.clone(),
                source,
            })?;
            let path = entry.path();
            if !is_state_file(&path) {
                continue;
            }
            match read_state(&path) {
                Ok(state) => out.push((path, state)),
                Err(e) => tracing::warn!("skipping {}: {}", path.display(), e),
            }
        }
        out.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(out)
    }
}

fn is_state_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(SUFFIX))
}

fn read_state(path: &Path) -> Result<ProgressState, ProgressError> {
    let bytes = fs::read(path).map_err(|source| ProgressError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| ProgressError::Decode {
        path: path.to_path_buf(),
        source,
    })
}
