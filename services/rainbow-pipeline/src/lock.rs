//! Single-run guard for a forecast tree.
//!
//! The guard is an OS advisory lock on a file in the data directory. The
//! kernel drops the lock when the holding process exits, so a crashed run
//! never wedges the next one. The file itself is left in place and only
//! records the PID of the last holder.

use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use fs4::FileExt;
use tracing::{debug, warn};

use crate::{PipelineError, PipelineResult};

pub const LOCK_FILE: &str = ".pipeline.lock";

/// Exclusive lock on the data directory, released on drop.
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
    file: File,
}

impl RunLock {
    pub fn acquire(data_dir: &Path) -> PipelineResult<Self> {
        std::fs::create_dir_all(data_dir)?;
        let path = data_dir.join(LOCK_FILE);

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        match file.try_lock_exclusive() {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::WouldBlock => {
                return Err(PipelineError::Locked(path));
            }
            Err(e) => return Err(e.into()),
        }

        // From here on the guard owns the lock and releases it on any error.
        let mut lock = Self { path, file };
        lock.file.set_len(0)?;
        writeln!(lock.file, "{}", std::process::id())?;

        debug!(path = %lock.path.display(), "Acquired run lock");
        Ok(lock)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            warn!(path = %self.path.display(), error = %e, "Failed to release run lock");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_fails_until_release() {
        let dir = tempfile::tempdir().unwrap();

        let lock = RunLock::acquire(dir.path()).unwrap();
        assert!(lock.path().exists());
        assert!(matches!(
            RunLock::acquire(dir.path()),
            Err(PipelineError::Locked(_))
        ));

        drop(lock);
        assert!(RunLock::acquire(dir.path()).is_ok());
    }

    #[test]
    fn test_leftover_file_from_dead_run_is_reclaimed() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(LOCK_FILE), "999999\n").unwrap();

        let lock = RunLock::acquire(dir.path()).unwrap();
        let contents = std::fs::read_to_string(lock.path()).unwrap();
        assert_eq!(contents.trim(), std::process::id().to_string());
    }

    #[test]
    fn test_creates_missing_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("static").join("gfs");

        let lock = RunLock::acquire(&nested).unwrap();
        assert!(nested.join(LOCK_FILE).exists());
        drop(lock);
    }
}
