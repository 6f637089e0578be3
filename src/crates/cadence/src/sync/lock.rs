//! Single-instance file lock.
//!
//! An exclusive, non-blocking lock on a well-known file serializes sync
//! runs across processes. The lock is released when the guard drops, so
//! every exit path (including panics unwinding) lets the next run in.

use crate::error::{CadenceError, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Guard holding the exclusive instance lock.
#[derive(Debug)]
pub struct SingleInstance {
    file: File,
    path: PathBuf,
}

impl SingleInstance {
    /// Try to acquire the lock without blocking.
    ///
    /// Fails with `CadenceError::LockContention` when another process
    /// holds it.
    pub fn acquire(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .open(path)?;

        file.try_lock_exclusive()
            .map_err(|_| CadenceError::LockContention(path.display().to_string()))?;

        debug!(path = %path.display(), "instance lock acquired");
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for SingleInstance {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to release lock");
        } else {
            debug!(path = %self.path.display(), "instance lock released");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_fails_while_held() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sync.lock");

        let guard = SingleInstance::acquire(&path).unwrap();
        let err = SingleInstance::acquire(&path).unwrap_err();
        assert!(matches!(err, CadenceError::LockContention(_)));
        assert_eq!(err.exit_code(), 2);

        drop(guard);
        SingleInstance::acquire(&path).unwrap();
    }

    #[test]
    fn creates_missing_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/locks/sync.lock");
        let guard = SingleInstance::acquire(&path).unwrap();
        assert!(guard.path().exists());
    }
}
