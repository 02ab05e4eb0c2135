//! `aemet-sync batch` – several stations, bounded concurrency, failures isolated.

use aemet_core::batch::{run_batch, StationStatus};
use aemet_core::config::AemetConfig;
use aemet_core::control::CancelToken;
use aemet_core::credential::ApiKey;
use aemet_core::driver::PipelineDriver;
use aemet_core::request::FetchRequest;
use aemet_core::storage::StatePaths;
use anyhow::{bail, Result};
use std::path::PathBuf;
use std::sync::Arc;

use super::fetch::print_summary;

pub async fn run_batch_cmd(
    cfg: &AemetConfig,
    paths: StatePaths,
    requests: Vec<FetchRequest>,
    jobs: usize,
    out_dir: PathBuf,
    cancel: CancelToken,
) -> Result<()> {
    let api_key = ApiKey::from_env(&cfg.api_key_env)?;
    let driver = Arc::new(PipelineDriver::from_config(
        cfg,
        api_key,
        paths,
        cancel.clone(),
    ));

    let report = run_batch(requests, jobs, cancel, move |request: &FetchRequest| {
        let run = driver.run(request)?;
        let artifact = run.write_artifact(&out_dir)?;
        Ok(run.summary(Some(artifact)))
    })
    .await;

    for result in &report.results {
        match &result.status {
            StationStatus::Done(summary) => print_summary(summary),
            StationStatus::Failed(msg) => println!("{}: FAILED {}", result.station, msg),
            StationStatus::Cancelled => println!("{}: cancelled", result.station),
        }
    }
    tracing::info!(
        succeeded = report.succeeded(),
        failed = report.failed(),
        cancelled = report.cancelled(),
        "batch finished"
    );

    if report.failed() > 0 {
        bail!(
            "{} of {} station(s) failed",
            report.failed(),
            report.results.len()
        );
    }
    if report.cancelled() > 0 {
        bail!("interrupted; {} station(s) not completed", report.cancelled());
    }
    Ok(())
}
