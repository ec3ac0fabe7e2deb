//! Local filesystem storage for uploaded image bytes.

use std::path::{Path, PathBuf};

/// Writes uploads under a single root directory, one file per stored
/// identity.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Absolute location of a stored file.
    ///
    /// `name` is always a normalized filename, so it cannot escape `root`.
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Write `bytes` under `name`, creating the root directory if needed.
    ///
    /// The returned [`StoredFile`] deletes the file when dropped unless
    /// [`StoredFile::keep`] is called. A failed write cleans up after itself
    /// the same way.
    pub async fn save(&self, name: &str, bytes: &[u8]) -> std::io::Result<StoredFile> {
        tokio::fs::create_dir_all(&self.root).await?;
        let stored = StoredFile {
            path: self.path_for(name),
            keep: false,
        };
        tokio::fs::write(&stored.path, bytes).await?;
        tracing::debug!(path = %stored.path.display(), size = bytes.len(), "Stored upload");
        Ok(stored)
    }
}

/// A file written by [`FileStorage::save`] whose owning row is not yet
/// committed.
///
/// Dropping it removes the file, which also covers a request future that is
/// cancelled mid-transaction.
#[derive(Debug)]
#[must_use = "dropping a StoredFile deletes it"]
pub struct StoredFile {
    path: PathBuf,
    keep: bool,
}

impl StoredFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Disarm the guard once the owning row is committed.
    pub fn keep(mut self) -> PathBuf {
        self.keep = true;
        std::mem::take(&mut self.path)
    }
}

impl Drop for StoredFile {
    fn drop(&mut self) {
        if self.keep {
            return;
        }
        // Synchronous so the file is gone before the caller releases its row.
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "Removed stored upload"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to remove stored upload")
            }
        }
    }
}
