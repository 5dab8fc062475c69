//! Advisory single-writer lock around the ledger file.

use crate::error::ErrorCode;
use fs2::FileExt;
use std::{
    fs::{self, File, OpenOptions},
    io,
    path::{Path, PathBuf},
    thread,
    time::{Duration, Instant},
};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("ledger is locked by another process: gave up after {waited:?} at {path:?}")]
    Timeout { path: PathBuf, waited: Duration },

    #[error("cannot create lock file: {0}")]
    IoError(#[from] io::Error),
}

impl LockError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Timeout { .. } => ErrorCode::LockContention,
            Self::IoError(_) => ErrorCode::StoreWriteFailed,
        }
    }

    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }
}

/// Exclusive lock on `<ledger>.lock`, released on drop.
#[derive(Debug)]
pub struct LedgerLock {
    file: File,
    path: PathBuf,
}

impl LedgerLock {
    /// Lock file used for `ledger_path`: a `.lock` sibling.
    #[must_use]
    pub fn path_for(ledger_path: &Path) -> PathBuf {
        let mut name = ledger_path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".lock");
        ledger_path.with_file_name(name)
    }

    /// Take the lock at `path`, retrying until `timeout` has elapsed.
    ///
    /// # Errors
    ///
    /// [`LockError::Timeout`] if the lock stays held by someone else, or
    /// [`LockError::IoError`] if the lock file cannot be opened.
    pub fn acquire(path: &Path, timeout: Duration) -> Result<Self, LockError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(path)?;

        let start = Instant::now();
        while FileExt::try_lock_exclusive(&file).is_err() {
            let waited = start.elapsed();
            if waited >= timeout {
                tracing::warn!(path = %path.display(), ?waited, "ledger lock timed out");
                return Err(LockError::Timeout {
                    path: path.to_path_buf(),
                    waited,
                });
            }
            thread::sleep(POLL_INTERVAL);
        }

        tracing::debug!(path = %path.display(), "acquired ledger lock");
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for LedgerLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

#[cfg(test)]
mod tests {
    use super::{LedgerLock, LockError};
    use crate::error::ErrorCode;
    use std::{
        path::{Path, PathBuf},
        sync::{Arc, Barrier},
        thread,
        time::Duration,
    };
    use tempfile::TempDir;

    #[test]
    fn acquire_then_drop_allows_reacquire() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prs.json.lock");

        let first = LedgerLock::acquire(&path, Duration::from_millis(50)).unwrap();
        assert_eq!(first.path(), path.as_path());
        drop(first);

        assert!(LedgerLock::acquire(&path, Duration::from_millis(50)).is_ok());
    }

    #[test]
    fn held_lock_times_out_with_contention_code() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prs.json.lock");
        let _held = LedgerLock::acquire(&path, Duration::from_millis(50)).unwrap();

        let err = LedgerLock::acquire(&path, Duration::from_millis(20)).unwrap_err();
        assert!(matches!(&err, LockError::Timeout { path: p, .. } if *p == path));
        assert_eq!(err.code(), ErrorCode::LockContention);
        assert!(err.hint().is_some());
    }

    #[test]
    fn missing_parent_directories_are_created() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/deeper/prs.json.lock");
        assert!(LedgerLock::acquire(&path, Duration::from_millis(50)).is_ok());
        assert!(path.exists());
    }

    #[test]
    fn lock_path_sits_next_to_the_ledger() {
        assert_eq!(
            LedgerLock::path_for(Path::new("data/prs.json")),
            PathBuf::from("data/prs.json.lock")
        );
        assert_eq!(
            LedgerLock::path_for(Path::new("prs.json")),
            PathBuf::from("prs.json.lock")
        );
    }

    #[test]
    fn waiter_succeeds_once_holder_thread_releases() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prs.json.lock");

        let held = Arc::new(Barrier::new(2));
        let release = Arc::new(Barrier::new(2));

        let holder = {
            let (held, release, path) = (Arc::clone(&held), Arc::clone(&release), path.clone());
            thread::spawn(move || {
                let _lock = LedgerLock::acquire(&path, Duration::from_millis(200)).unwrap();
                held.wait();
                release.wait();
            })
        };

        held.wait();
        assert!(matches!(
            LedgerLock::acquire(&path, Duration::from_millis(20)),
            Err(LockError::Timeout { .. })
        ));
        release.wait();
        holder.join().unwrap();

        assert!(LedgerLock::acquire(&path, Duration::from_millis(200)).is_ok());
    }
}
