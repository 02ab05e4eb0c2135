//! `aemet-sync aggregate` – rebuild the CSV from cached chunks, offline.

use aemet_core::cache::ChunkCache;
use aemet_core::config::AemetConfig;
use aemet_core::driver::{artifact_name, replay_from_cache};
use aemet_core::request::FetchRequest;
use aemet_core::storage::StatePaths;
use anyhow::Result;
use std::path::Path;

pub fn run_aggregate(
    cfg: &AemetConfig,
    paths: &StatePaths,
    request: &FetchRequest,
    out_dir: &Path,
) -> Result<()> {
    let cache = ChunkCache::new(paths.chunks_dir());
    let replay = replay_from_cache(&cache, request, &cfg.aggregate_options())?;

    let path = out_dir.join(artifact_name(&request.station, request.start, request.end));
    replay.series.write_csv(&path)?;
    println!(
        "{}: {} rows ({} gap days) -> {}",
        request.station,
        replay.series.rows.len(),
        replay.series.gap_days(),
        path.display()
    );
    if !replay.missing.is_empty() {
        println!("{} chunk(s) not in the cache:", replay.missing.len());
        for chunk in &replay.missing {
            println!("  {chunk}");
        }
    }
    Ok(())
}
