//! `aemet-sync status` – show progress of every station range.

use aemet_core::progress::ProgressStore;
use aemet_core::storage::StatePaths;
use anyhow::Result;

pub fn run_status(paths: &StatePaths) -> Result<()> {
    let states = ProgressStore::new(paths.progress_dir()).list()?;
    if states.is_empty() {
        println!("No progress under {}.", paths.root().display());
    } else {
        println!(
            "{:<8} {:<10} {:<10} {:<6} {:<10} {}",
            "STATION", "START", "END", "MONTHS", "LAST DONE", "DONE"
        );
        for (_, s) in states {
            let done = if s.is_complete() {
                "complete".to_string()
            } else {
                format!("{:.1}%", s.fraction_done() * 100.0)
            };
            println!(
                "{:<8} {:<10} {:<10} {:<6} {:<10} {}",
                s.station, s.start, s.end, s.months, s.last_done, done
            );
        }
    }
    Ok(())
}
