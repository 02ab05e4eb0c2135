use crate::aggregate::{aggregate, AggregateOptions, CanonicalSeries};
use crate::cache::ChunkCache;
use crate::error::PipelineError;
use crate::planner::Chunk;
use crate::request::FetchRequest;

/// Series rebuilt from snapshots alone.
#[derive(Debug, Clone)]
pub struct Replay {
    pub series: CanonicalSeries,
    /// Planned chunks with no snapshot on disk.
    pub missing: Vec<Chunk>,
}

/// Rebuild a station's series from the cache without touching the network.
/// Chunks without a snapshot are reported, not fetched.
pub fn replay_from_cache(
    cache: &ChunkCache,
    request: &FetchRequest,
    opts: &AggregateOptions,
) -> Result<Replay, PipelineError> {
    let mut outcomes = Vec::new();
    let mut missing = Vec::new();
    for chunk in request.plan()? {
        match cache.get(&request.station, &chunk)? {
            Some(outcome) => outcomes.push(outcome),
            None => missing.push(chunk),
        }
    }
    if !missing.is_empty() {
        tracing::warn!(
            station = %request.station,
            missing = missing.len(),
            "replaying with chunks missing from the cache"
        );
    }
    Ok(Replay {
        series: aggregate(&request.station, &outcomes, opts),
        missing,
    })
}
