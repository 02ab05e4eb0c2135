//! Run many stations with a bounded number in flight.
//!
//! Each station runs on the blocking pool (the pipeline is blocking I/O).
//! A station's failure is logged and recorded; the others carry on. Once
//! the cancel token fires no new station is started.

use std::collections::HashSet;
use std::sync::Arc;

use crate::control::CancelToken;
use crate::driver::StationSummary;
use crate::error::PipelineError;
use crate::request::FetchRequest;

/// How one station ended.
#[derive(Debug, Clone, PartialEq)]
pub enum StationStatus {
    Done(StationSummary),
    Failed(String),
    /// Stopped by, or never started because of, a shutdown request.
    Cancelled,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StationResult {
    pub station: String,
    pub status: StationStatus,
}

/// Per-station results in request order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub results: Vec<StationResult>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.count(|s| matches!(s, StationStatus::Done(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, StationStatus::Failed(_)))
    }

    pub fn cancelled(&self) -> usize {
        self.count(|s| matches!(s, StationStatus::Cancelled))
    }

    pub fn all_succeeded(&self) -> bool {
        self.succeeded() == self.results.len()
    }

    fn count(&self, f: impl Fn(&StationStatus) -> bool) -> usize {
        self.results.iter().filter(|r| f(&r.status)).count()
    }
}

/// Runs `run_one` for every request with up to `jobs` stations at once.
/// A station listed twice runs once.
pub async fn run_batch<F>(
    requests: Vec<FetchRequest>,
    jobs: usize,
    cancel: CancelToken,
    run_one: F,
) -> BatchReport
where
    F: Fn(&FetchRequest) -> Result<StationSummary, PipelineError> + Send + Sync + 'static,
{
    let jobs = jobs.max(1);
    let run_one = Arc::new(run_one);

    let mut seen = HashSet::new();
    let requests: Vec<FetchRequest> = requests
        .into_iter()
        .filter(|r| seen.insert(r.station.clone()))
        .collect();

    let mut slots: Vec<Option<StationStatus>> = vec![None; requests.len()];
    let mut queue = requests.iter().cloned().enumerate();
    let mut join_set = tokio::task::JoinSet::new();

    loop {
        while join_set.len() < jobs && !cancel.is_cancelled() {
            let Some((idx, request)) = queue.next() else {
                break;
            };
            let run_one = Arc::clone(&run_one);
            join_set.spawn_blocking(move || {
                let status = match (*run_one)(&request) {
                    Ok(summary) => StationStatus::Done(summary),
                    Err(e) if e.is_cancelled() => StationStatus::Cancelled,
                    Err(e) => {
                        tracing::error!(station = %request.station, "station failed: {e}");
                        StationStatus::Failed(e.to_string())
                    }
                };
                (idx, status)
            });
        }

        if join_set.is_empty() {
            break;
        }

        let Some(res) = join_set.join_next().await else {
            break;
        };
        match res {
            Ok((idx, status)) => slots[idx] = Some(status),
            Err(e) => tracing::error!("station task join: {}", e),
        }
    }

    let results = requests
        .into_iter()
        .zip(slots)
        .map(|(request, status)| StationResult {
            station: request.station,
            status: status.unwrap_or_else(|| {
                if cancel.is_cancelled() {
                    StationStatus::Cancelled
                } else {
                    StationStatus::Failed("station task panicked".into())
                }
            }),
        })
        .collect();
    BatchReport { results }
}
