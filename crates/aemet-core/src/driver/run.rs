use chrono::NaiveDate;
use std::path::{Path, PathBuf};

use crate::aggregate::{aggregate, CanonicalSeries, SeriesError};
use crate::control::Sleeper;
use crate::error::PipelineError;
use crate::http::Transport;
use crate::outcome::ChunkOutcome;
use crate::planner::{plan_chunks, Chunk};
use crate::request::FetchRequest;
use crate::storage::StationLock;

use super::{artifact_name, PipelineDriver};

/// Counters for one station run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub chunks: usize,
    /// Chunks already behind the progress cursor when the run started.
    pub committed: usize,
    pub from_cache: usize,
    /// Chunks resolved over the network.
    pub fetched: usize,
    pub empty: usize,
    pub records: usize,
}

/// Result of a completed station run.
#[derive(Debug, Clone)]
pub struct StationRun {
    pub request: FetchRequest,
    pub series: CanonicalSeries,
    pub stats: RunStats,
}

/// Compact per-station report, as listed by the batch runner.
#[derive(Debug, Clone, PartialEq)]
pub struct StationSummary {
    pub station: String,
    pub rows: usize,
    pub gap_days: usize,
    pub span: Option<(NaiveDate, NaiveDate)>,
    pub artifact: Option<PathBuf>,
    pub stats: RunStats,
}

impl StationRun {
    /// Write `aemet_<id>_<start>_<end>.csv` into `out_dir`.
    pub fn write_artifact(&self, out_dir: &Path) -> Result<PathBuf, SeriesError> {
        let path = out_dir.join(artifact_name(
            &self.request.station,
            self.request.start,
            self.request.end,
        ));
        self.series.write_csv(&path)?;
        tracing::info!(station = %self.request.station, "wrote {}", path.display());
        Ok(path)
    }

    pub fn summary(&self, artifact: Option<PathBuf>) -> StationSummary {
        StationSummary {
            station: self.request.station.clone(),
            rows: self.series.rows.len(),
            gap_days: self.series.gap_days(),
            span: self.series.span(),
            artifact,
            stats: self.stats,
        }
    }
}

impl<T: Transport, S: Sleeper> PipelineDriver<T, S> {
    /// Run one station to completion, resuming from persisted progress.
    ///
    /// Holds the station lock for the whole run. A fatal chunk, a
    /// cancellation or a persistence failure stops the run; progress already
    /// committed is left as it was.
    pub fn run(&self, request: &FetchRequest) -> Result<StationRun, PipelineError> {
        let station = request.station.as_str();
        let lock_path = self.paths.lock_path(station);
        let lock = StationLock::try_acquire(&lock_path)
            .map_err(|e| PipelineError::LockIo(lock_path.clone(), e))?
            .ok_or_else(|| PipelineError::Locked {
                station: station.to_string(),
                path: lock_path.clone(),
            })?;

        tracing::debug!(station, lock = %lock.path().display(), "station lock acquired");

        let mut state = self.progress.load(request)?;
        if state.is_complete() {
            tracing::info!(station, "range already complete; rebuilding from the cache");
        }
        let cursor = state.last_done.max(request.start);
        let committed = plan_chunks(request.start, cursor, request.months)?;
        let pending = plan_chunks(cursor, request.end, request.months)?;
        let mut stats = RunStats {
            chunks: committed.len() + pending.len(),
            committed: committed.len(),
            ..RunStats::default()
        };
        tracing::info!(
            station,
            start = %request.start,
            end = %request.end,
            months = request.months,
            committed = committed.len(),
            pending = pending.len(),
            "station run starting"
        );

        let mut outcomes = Vec::with_capacity(stats.chunks);
        for chunk in &committed {
            let (outcome, from_network) = self.resolve(station, chunk, &mut stats)?;
            if from_network {
                tracing::warn!(station, %chunk, "snapshot behind the cursor was missing; refetched");
                self.pause(station)?;
            }
            outcomes.push(outcome);
        }
        for chunk in &pending {
            let (outcome, from_network) = self.resolve(station, chunk, &mut stats)?;
            state.advance(chunk.end);
            self.progress.save(&state)?;
            tracing::info!(
                station,
                %chunk,
                days = chunk.days(),
                outcome = outcome.label(),
                records = outcome.records().len(),
                "chunk committed"
            );
            outcomes.push(outcome);
            if from_network {
                self.pause(station)?;
            }
        }

        let series = aggregate(station, &outcomes, &self.aggregate);
        stats.records = outcomes.iter().map(|o| o.records().len()).sum();
        tracing::info!(
            station,
            rows = series.rows.len(),
            gaps = series.gap_days(),
            fetched = stats.fetched,
            from_cache = stats.from_cache,
            "station run finished"
        );
        Ok(StationRun {
            request: request.clone(),
            series,
            stats,
        })
    }

    /// Cache first, then the network. Fetched outcomes are written to the
    /// cache before returning. The flag tells whether the network was used.
    fn resolve(
        &self,
        station: &str,
        chunk: &Chunk,
        stats: &mut RunStats,
    ) -> Result<(ChunkOutcome, bool), PipelineError> {
        if self.cancel.is_cancelled() {
            return Err(cancelled(station));
        }
        if let Some(outcome) = self.cache.get(station, chunk)? {
            tracing::debug!(station, %chunk, outcome = outcome.label(), "cache hit");
            stats.from_cache += 1;
            if matches!(outcome, ChunkOutcome::EmptyConfirmed) {
                stats.empty += 1;
            }
            return Ok((outcome, false));
        }

        let outcome = self
            .fetcher
            .fetch(station, chunk, &self.sleeper, &self.cancel)
            .map_err(|_| cancelled(station))?;
        if let ChunkOutcome::Fatal(reason) = outcome {
            tracing::error!(station, %chunk, %reason, "chunk failed; aborting station run");
            return Err(PipelineError::Fatal {
                station: station.to_string(),
                chunk: *chunk,
                reason,
            });
        }
        if matches!(outcome, ChunkOutcome::EmptyConfirmed) {
            tracing::info!(station, %chunk, "no data in range; skipping");
            stats.empty += 1;
        }
        self.cache.put(station, chunk, &outcome)?;
        stats.fetched += 1;
        Ok((outcome, true))
    }

    fn pause(&self, station: &str) -> Result<(), PipelineError> {
        let delay = self.politeness.next_delay();
        if delay.is_zero() {
            return Ok(());
        }
        tracing::debug!(station, delay_ms = delay.as_millis() as u64, "politeness pause");
        self.sleeper.sleep(delay).map_err(|_| cancelled(station))
    }
}

fn cancelled(station: &str) -> PipelineError {
    PipelineError::Cancelled {
        station: station.to_string(),
    }
}
