//! Per-station pipeline: plan, then for each chunk consult the cache, fetch
//! on a miss, persist the snapshot, advance the progress cursor, and pause
//! politely; finally aggregate everything into the canonical series.
//!
//! Progress is committed after every chunk, so a rerun of the same request
//! resumes from the first unresolved chunk. Chunks behind the cursor are
//! read back from the cache (refetched if their snapshot is gone) so the
//! result of a resumed run matches that of an uninterrupted one.

mod replay;
mod run;

pub use replay::{replay_from_cache, Replay};
pub use run::{RunStats, StationRun, StationSummary};

use std::time::Duration;

use crate::aggregate::AggregateOptions;
use crate::config::AemetConfig;
use crate::control::{CancelToken, Sleeper};
use crate::credential::ApiKey;
use crate::fetcher::TwoStageFetcher;
use crate::http::{CurlTransport, Transport};
use crate::progress::ProgressStore;
use crate::cache::ChunkCache;
use crate::retry::random_up_to;
use crate::storage::StatePaths;

/// Pause after every chunk that needed the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Politeness {
    pub delay: Duration,
    pub jitter: Duration,
}

impl Politeness {
    pub fn next_delay(&self) -> Duration {
        self.delay.saturating_add(random_up_to(self.jitter))
    }
}

/// File name of a station's final CSV.
pub fn artifact_name(station: &str, start: chrono::NaiveDate, end: chrono::NaiveDate) -> String {
    format!("aemet_{station}_{start}_{end}.csv")
}

pub struct PipelineDriver<T, S = CancelToken> {
    fetcher: TwoStageFetcher<T>,
    cache: ChunkCache,
    progress: ProgressStore,
    paths: StatePaths,
    sleeper: S,
    cancel: CancelToken,
    politeness: Politeness,
    aggregate: AggregateOptions,
}

impl PipelineDriver<CurlTransport, CancelToken> {
    /// Production driver: curl transport, waits interrupted by `cancel`.
    pub fn from_config(
        cfg: &AemetConfig,
        api_key: ApiKey,
        paths: StatePaths,
        cancel: CancelToken,
    ) -> Self {
        let transport = CurlTransport::new(cfg.user_agent.clone())
            .with_connect_timeout(Duration::from_secs(cfg.connect_timeout_secs));
        let fetcher =
            TwoStageFetcher::new(transport, api_key, cfg.fetch_settings(), cfg.retry_policy());
        PipelineDriver::new(
            fetcher,
            paths,
            cancel.clone(),
            cancel,
            cfg.politeness(),
            cfg.aggregate_options(),
        )
    }
}

impl<T: Transport, S: Sleeper> PipelineDriver<T, S> {
    pub fn new(
        fetcher: TwoStageFetcher<T>,
        paths: StatePaths,
        sleeper: S,
        cancel: CancelToken,
        politeness: Politeness,
        aggregate: AggregateOptions,
    ) -> Self {
        PipelineDriver {
            fetcher,
            cache: ChunkCache::new(paths.chunks_dir()),
            progress: ProgressStore::new(paths.progress_dir()),
            paths,
            sleeper,
            cancel,
            politeness,
            aggregate,
        }
    }

    pub fn fetcher(&self) -> &TwoStageFetcher<T> {
        &self.fetcher
    }

    pub fn sleeper(&self) -> &S {
        &self.sleeper
    }

    pub fn cache(&self) -> &ChunkCache {
        &self.cache
    }

    pub fn progress(&self) -> &ProgressStore {
        &self.progress
    }

    pub fn paths(&self) -> &StatePaths {
        &self.paths
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }
}
