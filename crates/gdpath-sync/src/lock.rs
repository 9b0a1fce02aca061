//! Cross-process folder-creation lock
//!
//! A single well-known file is the lock. Acquisition takes a non-blocking
//! exclusive `flock(2)` on it, polling once per second until the wait budget
//! runs out. Releasing removes the file and closes the handle; [`FolderLock`]
//! does both on drop, so every exit path of the guarded section releases it.
//!
//! A releasing holder unlinks the file while a waiter may already have it
//! open. After winning the `flock` the guard therefore checks that the path
//! still names the inode it locked, and starts over with a fresh file if not.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use nix::errno::Errno;
use nix::fcntl::{Flock, FlockArg};
use thiserror::Error;
use tracing::{debug, warn};

/// Delay between two acquisition attempts
const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Reopen attempts allowed when the locked file was unlinked under us
const STALE_RETRIES: u32 = 3;

/// Errors raised while taking the folder-creation lock
#[derive(Debug, Error)]
pub enum LockError {
    /// Another process held the lock for the whole wait budget
    #[error("Timed out after {waited:?} waiting for lock {path}")]
    Timeout { path: PathBuf, waited: Duration },

    /// The lock file could not be opened or locked
    #[error("Lock I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Held folder-creation lock; released on drop
#[derive(Debug)]
pub struct FolderLock {
    path: PathBuf,
    file: Option<Flock<File>>,
}

impl FolderLock {
    /// Takes the lock at `path`, polling once per second
    ///
    /// Makes at most `max(1, max_wait secs)` attempts before giving up with
    /// [`LockError::Timeout`].
    pub async fn acquire(path: &Path, max_wait: Duration) -> Result<Self, LockError> {
        let attempts = max_wait.as_secs().max(1);

        for attempt in 1..=attempts {
            if let Some(lock) = Self::try_acquire(path)? {
                debug!(path = %path.display(), attempt, "Folder lock acquired");
                return Ok(lock);
            }
            if attempt < attempts {
                debug!(path = %path.display(), attempt, "Folder lock busy, waiting");
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        }

        warn!(path = %path.display(), attempts, "Gave up waiting for folder lock");
        Err(LockError::Timeout {
            path: path.to_path_buf(),
            waited: max_wait,
        })
    }

    /// One acquisition attempt; `Ok(None)` when another holder has it
    pub fn try_acquire(path: &Path) -> Result<Option<Self>, LockError> {
        let io_err = |source| LockError::Io {
            path: path.to_path_buf(),
            source,
        };

        for _ in 0..STALE_RETRIES {
            let file = OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(false)
                .open(path)
                .map_err(io_err)?;

            let file = match Flock::lock(file, FlockArg::LockExclusiveNonblock) {
                Ok(locked) => locked,
                Err((_, errno)) if errno == Errno::EWOULDBLOCK => return Ok(None),
                Err((_, errno)) => return Err(io_err(io::Error::from(errno))),
            };

            let held = file.metadata().map_err(io_err)?;
            match fs::metadata(path) {
                Ok(current) if current.dev() == held.dev() && current.ino() == held.ino() => {
                    return Ok(Some(Self {
                        path: path.to_path_buf(),
                        file: Some(file),
                    }));
                }
                // Unlinked by the previous holder; lock a fresh file instead
                Ok(_) => continue,
                Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
                Err(err) => return Err(io_err(err)),
            }
        }

        Ok(None)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Releases the lock explicitly
    pub fn release(self) {}
}

impl Drop for FolderLock {
    fn drop(&mut self) {
        if let Err(err) = fs::remove_file(&self.path) {
            if err.kind() != io::ErrorKind::NotFound {
                warn!(path = %self.path.display(), error = %err, "Failed to remove lock file");
            }
        }
        // Unlocks, then closes the descriptor
        self.file.take();
        debug!(path = %self.path.display(), "Folder lock released");
    }
}
