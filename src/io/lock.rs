use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const LOCK_FILE: &str = ".lock";
const POLL_INTERVAL: Duration = Duration::from_millis(10);
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Advisory lock on the data directory, held for a whole
/// load → reconcile → apply → save cycle so concurrent `pri` runs serialize.
pub struct FileLock {
    _file: File,
    path: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("could not create lock file at {path}: {source}")]
    CreateError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("gave up on {path} after {waited:?}: another pri process may be writing")]
    Timeout { path: PathBuf, waited: Duration },
}

impl FileLock {
    /// Block up to `timeout` waiting for the lock.
    pub fn acquire(data_dir: &Path, timeout: Duration) -> Result<Self, LockError> {
        let lock_path = data_dir.join(LOCK_FILE);
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| LockError::CreateError {
                path: lock_path.clone(),
                source: e,
            })?;

        let start = Instant::now();
        while try_lock(&file).is_err() {
            let waited = start.elapsed();
            if waited >= timeout {
                return Err(LockError::Timeout {
                    path: lock_path,
                    waited,
                });
            }
            std::thread::sleep(POLL_INTERVAL);
        }
        tracing::trace!(path = %lock_path.display(), waited = ?start.elapsed(), "lock acquired");
        Ok(FileLock {
            _file: file,
            path: lock_path,
        })
    }

    pub fn acquire_default(data_dir: &Path) -> Result<Self, LockError> {
        Self::acquire(data_dir, DEFAULT_TIMEOUT)
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        // flock is released with the file handle
        let _ = fs::remove_file(&self.path);
    }
}

#[cfg(unix)]
fn try_lock(file: &File) -> Result<(), std::io::Error> {
    use std::os::unix::io::AsRawFd;
    let result = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
    if result == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
fn try_lock(_file: &File) -> Result<(), std::io::Error> {
    Ok(())
}
