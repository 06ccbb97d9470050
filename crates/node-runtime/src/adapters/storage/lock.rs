//! Exclusive lock on the data directory.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const LOCK_FILE_NAME: &str = "pas-node.lock";

/// Held for the node's lifetime. The OS releases it when the file closes,
/// including after a crash.
#[derive(Debug)]
pub struct DataDirLock {
    file: File,
    path: PathBuf,
}

impl DataDirLock {
    /// Create `data_dir` if needed and lock it, failing fast if another
    /// process holds it.
    pub fn acquire(data_dir: &Path) -> Result<Self> {
        fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create data dir {}", data_dir.display()))?;

        let path = data_dir.join(LOCK_FILE_NAME);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .with_context(|| format!("Failed to open lock file {}", path.display()))?;

        file.try_lock_exclusive().with_context(|| {
            format!(
                "Data dir {} is in use by another pas-node",
                data_dir.display()
            )
        })?;

        debug!(path = %path.display(), "Locked data dir");
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for DataDirLock {
    fn drop(&mut self) {
        let _ = fs2::FileExt::unlock(&self.file);
    }
}
