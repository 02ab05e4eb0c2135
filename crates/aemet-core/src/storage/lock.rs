use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

/// Exclusive advisory lock on a station's lock file. Released on drop.
#[derive(Debug)]
pub struct StationLock {
    file: File,
    path: PathBuf,
}

impl StationLock {
    /// Take the lock without blocking. `Ok(None)` when another process (or
    /// another handle in this one) already holds it.
    pub fn try_acquire(path: &Path) -> io::Result<Option<StationLock>> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)?;
        if !try_lock_exclusive(&file)? {
            return Ok(None);
        }
        Ok(Some(StationLock {
            file,
            path: path.to_path_buf(),
        }))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(unix)]
fn try_lock_exclusive(file: &File) -> io::Result<bool> {
    use std::os::unix::io::AsRawFd;
    let r = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
    if r == 0 {
        return Ok(true);
    }
    let err = io::Error::last_os_error();
    if err.kind() == io::ErrorKind::WouldBlock {
        Ok(false)
    } else {
        Err(err)
    }
}

#[cfg(not(unix))]
fn try_lock_exclusive(_file: &File) -> io::Result<bool> {
    Ok(true)
}

impl Drop for StationLock {
    fn drop(&mut self) {
        #[cfg(unix)]
        {
            use std::os::unix::io::AsRawFd;
            unsafe {
                libc::flock(self.file.as_raw_fd(), libc::LOCK_UN);
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_is_refused_until_release() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("locks/0200E.lock");
        let first = StationLock::try_acquire(&path).unwrap();
        assert!(first.is_some());
        assert!(StationLock::try_acquire(&path).unwrap().is_none());
        drop(first);
        assert!(StationLock::try_acquire(&path).unwrap().is_some());
    }
}
