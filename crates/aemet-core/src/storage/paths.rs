use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::config::AemetConfig;

/// Root of all persisted pipeline state.
///
/// ```text
/// <root>/progress/<id>_<start>_<end>.state.json
/// <root>/chunks/<id>/<id>_<YYYYMMDD>_<YYYYMMDD>.json
/// <root>/locks/<id>.lock
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatePaths {
    root: PathBuf,
}

impl StatePaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        StatePaths { root: root.into() }
    }

    /// `~/.local/state/aemet-sync` on Debian.
    pub fn default_location() -> Result<Self> {
        let xdg_dirs = xdg::BaseDirectories::with_prefix("aemet-sync")?;
        Ok(StatePaths::new(
            xdg_dirs.get_state_home().join("aemet-sync"),
        ))
    }

    /// `state_dir` from the config when set, else the XDG default.
    pub fn from_config(cfg: &AemetConfig) -> Result<Self> {
        match &cfg.state_dir {
            Some(dir) => Ok(StatePaths::new(dir)),
            None => Self::default_location(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn chunks_dir(&self) -> PathBuf {
        self.root.join("chunks")
    }

    pub fn progress_dir(&self) -> PathBuf {
        self.root.join("progress")
    }

    pub fn locks_dir(&self) -> PathBuf {
        self.root.join("locks")
    }

    pub fn lock_path(&self, station: &str) -> PathBuf {
        self.locks_dir().join(format!("{station}.lock"))
    }
}
