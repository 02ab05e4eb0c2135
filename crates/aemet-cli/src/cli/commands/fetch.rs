//! `aemet-sync fetch` – download one station and write its CSV.

use aemet_core::checksum;
use aemet_core::config::AemetConfig;
use aemet_core::control::CancelToken;
use aemet_core::credential::ApiKey;
use aemet_core::driver::{PipelineDriver, StationSummary};
use aemet_core::request::FetchRequest;
use aemet_core::storage::StatePaths;
use anyhow::{Context, Result};
use std::path::PathBuf;

pub async fn run_fetch(
    cfg: &AemetConfig,
    paths: StatePaths,
    request: FetchRequest,
    out_dir: PathBuf,
    cancel: CancelToken,
) -> Result<()> {
    let api_key = ApiKey::from_env(&cfg.api_key_env)?;
    let driver = PipelineDriver::from_config(cfg, api_key, paths, cancel);

    // The pipeline does blocking I/O and blocking waits.
    let summary = tokio::task::spawn_blocking(move || -> Result<StationSummary> {
        let run = driver.run(&request)?;
        let artifact = run.write_artifact(&out_dir)?;
        Ok(run.summary(Some(artifact)))
    })
    .await
    .context("station task")??;

    print_summary(&summary);
    if let Some(path) = &summary.artifact {
        let digest = checksum::sha256_path(path)
            .with_context(|| format!("checksum {}", path.display()))?;
        println!("{}  {}", digest, path.display());
    }
    Ok(())
}

pub(super) fn print_summary(s: &StationSummary) {
    let span = s
        .span
        .map(|(a, b)| format!("{a}..{b}"))
        .unwrap_or_else(|| "-".to_string());
    println!(
        "{}: {} rows ({} gap days) {}  chunks {} [{} cached, {} fetched, {} empty]",
        s.station,
        s.rows,
        s.gap_days,
        span,
        s.stats.chunks,
        s.stats.from_cache,
        s.stats.fetched,
        s.stats.empty
    );
}
