//! Temporary paths that must outlive resolution but not the build.

use std::path::{Path, PathBuf};

/// Paths to remove once the build engine has finished, successful or not.
///
/// The resolver registers a path here as soon as it creates it, so a failed
/// resolution still leaves every temporary resource in the list. Remaining
/// paths are removed on drop.
#[derive(Debug, Default)]
pub struct CleanupList {
    paths: Vec<PathBuf>,
}

impl CleanupList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, path: impl Into<PathBuf>) {
        self.paths.push(path.into());
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Remove every registered path, files and directory trees alike.
    ///
    /// Paths that no longer exist are skipped. Failures are logged and the
    /// remaining paths are still attempted.
    pub fn remove_all(&mut self) {
        for path in self.paths.drain(..) {
            if let Err(e) = remove_path(&path) {
                tracing::warn!(path = %path.display(), error = %e, "Failed to remove temporary path");
            } else {
                tracing::debug!(path = %path.display(), "Removed temporary path");
            }
        }
    }
}

impl Drop for CleanupList {
    fn drop(&mut self) {
        self.remove_all();
    }
}

fn remove_path(path: &Path) -> std::io::Result<()> {
    match std::fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => std::fs::remove_dir_all(path),
        Ok(_) => std::fs::remove_file(path),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}
