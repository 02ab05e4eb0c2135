//! Per-chunk result cache.
//!
//! One JSON file per (station, chunk) holding the raw records exactly as
//! served, or an explicit empty marker. Files are replaced atomically and a
//! rewrite with identical content is skipped.

mod snapshot;

use std::fs;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::checksum::{sha256_bytes, sha256_path};
use crate::outcome::ChunkOutcome;
use crate::planner::Chunk;
use crate::storage::write_atomic;

use snapshot::Snapshot;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("chunk snapshot '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode chunk snapshot: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("fatal outcomes are not cached")]
    FatalNotCacheable,
}

/// Result of `ChunkCache::put`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutResult {
    Written,
    /// An identical snapshot was already on disk.
    Unchanged,
}

#[derive(Debug, Clone)]
pub struct ChunkCache {
    root: PathBuf,
}

impl ChunkCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        ChunkCache { root: root.into() }
    }

    /// `<root>/<id>/<id>_<YYYYMMDD>_<YYYYMMDD>.json`
    pub fn snapshot_path(&self, station: &str, chunk: &Chunk) -> PathBuf {
        self.root
            .join(station)
            .join(format!("{}_{}.json", station, chunk.key()))
    }

    /// Cached outcome, or `None` when the chunk was never resolved. A file
    /// that does not decode, or that belongs to other bounds, counts as a
    /// miss so the chunk is refetched and the file rewritten.
    pub fn get(&self, station: &str, chunk: &Chunk) -> Result<Option<ChunkOutcome>, CacheError> {
        let path = self.snapshot_path(station, chunk);
        let bytes = match fs::read(&path) {
            Ok(b) => b,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(CacheError::Io { path, source }),
        };
        match serde_json::from_slice::<Snapshot>(&bytes) {
            Ok(snap) if snap.matches(station, chunk) => Ok(Some(snap.into_outcome())),
            Ok(_) => {
                tracing::warn!(
                    station,
                    %chunk,
                    "snapshot {} belongs to another station or range; ignoring",
                    path.display()
                );
                Ok(None)
            }
            Err(e) => {
                tracing::warn!(station, %chunk, "unreadable snapshot {}: {}", path.display(), e);
                Ok(None)
            }
        }
    }

    /// Persist a resolved outcome. `Fatal` is rejected.
    pub fn put(
        &self,
        station: &str,
        chunk: &Chunk,
        outcome: &ChunkOutcome,
    ) -> Result<PutResult, CacheError> {
        let snap =
            Snapshot::from_outcome(station, chunk, outcome).ok_or(CacheError::FatalNotCacheable)?;
        let json = serde_json::to_vec_pretty(&snap).map_err(CacheError::Encode)?;
        let path = self.snapshot_path(station, chunk);

        match sha256_path(&path) {
            Ok(existing) if existing == sha256_bytes(&json) => return Ok(PutResult::Unchanged),
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(source) => return Err(CacheError::Io { path, source }),
        }
        write_atomic(&path, &json).map_err(|source| CacheError::Io {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(station, %chunk, outcome = outcome.label(), "snapshot written");
        Ok(PutResult::Written)
    }
}
