use crate::error::{ForgeError, Result};
use crate::paths;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// LockRecord
// ---------------------------------------------------------------------------

/// Contents of `<root>/.ideaforge.lock`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockRecord {
    pub pid: u32,
    pub acquired_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// RunLock
// ---------------------------------------------------------------------------

/// Exclusive run lock, released when dropped.
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
}

impl RunLock {
    pub fn acquire(root: &Path, stale_after_secs: u64) -> Result<Self> {
        Self::acquire_at(root, stale_after_secs, Utc::now())
    }

    /// Take the lock as of `now`. An existing lock older than
    /// `stale_after_secs`, or one that cannot be read, is treated as
    /// abandoned and replaced.
    pub fn acquire_at(root: &Path, stale_after_secs: u64, now: DateTime<Utc>) -> Result<Self> {
        let path = paths::lock_path(root);
        let record = LockRecord {
            pid: std::process::id(),
            acquired_at: now,
        };
        let data = serde_yaml::to_string(&record)?;

        match create_new(&path, &data) {
            Ok(()) => return Ok(Self { path }),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) => return Err(e.into()),
        }

        let stale_after = Duration::seconds(i64::try_from(stale_after_secs).unwrap_or(i64::MAX));
        match read_record(&path) {
            Some(held) if now.signed_duration_since(held.acquired_at) < stale_after => {
                return Err(ForgeError::Busy(format!(
                    "{} (pid {}, since {})",
                    path.display(),
                    held.pid,
                    held.acquired_at.format("%Y-%m-%d %H:%M:%S UTC")
                )));
            }
            Some(held) => {
                tracing::warn!(
                    pid = held.pid,
                    since = %held.acquired_at,
                    "replacing stale run lock"
                );
            }
            None => tracing::warn!(path = %path.display(), "replacing unreadable run lock"),
        }

        std::fs::remove_file(&path)?;
        match create_new(&path, &data) {
            Ok(()) => Ok(Self { path }),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(ForgeError::Busy(path.display().to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::warn!(path = %self.path.display(), error = %e, "could not release run lock");
        }
    }
}

fn create_new(path: &Path, data: &str) -> std::io::Result<()> {
    let mut f = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)?;
    f.write_all(data.as_bytes())
}

fn read_record(path: &Path) -> Option<LockRecord> {
    let data = std::fs::read_to_string(path).ok()?;
    serde_yaml::from_str(&data).ok()
}
