//! On-disk layout and the two file primitives everything persistent uses:
//! atomic replace (temp file in the same directory, fsync, rename) and a
//! per-station advisory lock.

mod atomic;
mod lock;
mod paths;

pub use atomic::write_atomic;
pub use lock::StationLock;
pub use paths::StatePaths;
