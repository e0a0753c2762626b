//! Creation, purging and removal of the working directory.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs::DirBuilder;

use crate::error::{CleanupError, Error, Result};

/// The single directory under which all stress files live.
#[derive(Debug)]
pub struct Workspace {
    path: PathBuf,
}

impl Workspace {
    /// Creates the working directory if needed and purges anything a previous run left behind.
    ///
    /// Failing to create the directory is fatal. Entries that cannot be purged are logged and
    /// otherwise ignored.
    pub async fn prepare(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        DirBuilder::new()
            .recursive(true)
            .mode(0o777)
            .create(&path)
            .await
            .map_err(|source| Error::Workspace {
                path: path.clone(),
                source,
            })?;

        let workspace = Self { path };
        for failure in workspace.purge().await {
            tracing::warn!(error = &failure as &dyn std::error::Error, "stale file remains");
        }

        tracing::debug!(path = %workspace.path.display(), "workspace prepared");
        Ok(workspace)
    }

    /// The working directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Removes every entry inside the working directory, keeping the directory itself.
    ///
    /// Returns the entries that could not be removed. Entries that disappear concurrently, or a
    /// directory that no longer exists, are not reported.
    pub async fn purge(&self) -> Vec<CleanupError> {
        let mut failures = Vec::new();

        let mut entries = match tokio::fs::read_dir(&self.path).await {
            Ok(entries) => entries,
            Err(source) if source.kind() == ErrorKind::NotFound => return failures,
            Err(source) => {
                failures.push(CleanupError {
                    path: self.path.clone(),
                    source,
                });
                return failures;
            }
        };

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(source) => {
                    failures.push(CleanupError {
                        path: self.path.clone(),
                        source,
                    });
                    break;
                }
            };

            let path = entry.path();
            let removed = match entry.file_type().await {
                Ok(file_type) if file_type.is_dir() => tokio::fs::remove_dir_all(&path).await,
                _ => tokio::fs::remove_file(&path).await,
            };
            match removed {
                Ok(()) => {}
                Err(source) if source.kind() == ErrorKind::NotFound => {}
                Err(source) => failures.push(CleanupError { path, source }),
            }
        }

        failures
    }

    /// Purges the working directory and removes it.
    ///
    /// Cleanup is best-effort: all failures are returned for reporting and none of them stops
    /// the remaining steps.
    pub async fn teardown(self) -> Vec<CleanupError> {
        let mut failures = self.purge().await;
        failures.extend(self.remove().await);
        failures
    }

    /// Removes the emptied working directory.
    ///
    /// An `open` that was already running on the blocking pool when its worker got aborted can
    /// still create a file after the purge. In that case the directory is purged once more before
    /// removing it again.
    async fn remove(self) -> Vec<CleanupError> {
        let mut failures = Vec::new();

        let mut result = tokio::fs::remove_dir(&self.path).await;
        if matches!(&result, Err(error) if error.kind() == ErrorKind::DirectoryNotEmpty) {
            tracing::debug!(path = %self.path.display(), "files appeared after purge");
            failures.extend(self.purge().await);
            result = tokio::fs::remove_dir(&self.path).await;
        }

        match result {
            Ok(()) => tracing::debug!(path = %self.path.display(), "workspace removed"),
            Err(source) if source.kind() == ErrorKind::NotFound => {}
            Err(source) => failures.push(CleanupError {
                path: self.path,
                source,
            }),
        }

        failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn prepare_creates_nested_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a/b/work");

        let workspace = Workspace::prepare(&path).await.unwrap();

        assert!(path.is_dir());
        assert_eq!(workspace.path(), path);
    }

    #[tokio::test]
    async fn prepare_purges_stale_contents() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("writer_0_1_0.dat"), b"stale").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested/file"), b"stale").unwrap();

        Workspace::prepare(dir.path()).await.unwrap();

        assert!(dir.path().is_dir());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn prepare_fails_below_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let result = Workspace::prepare(blocker.join("work")).await;

        assert!(matches!(result, Err(Error::Workspace { .. })));
    }

    #[tokio::test]
    async fn teardown_removes_everything() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("work");
        let workspace = Workspace::prepare(&path).await.unwrap();
        std::fs::write(path.join("writer_0_1_0.dat"), vec![0; 4096]).unwrap();
        std::fs::write(path.join("random_0_1_0.dat"), vec![0; 512]).unwrap();

        let failures = workspace.teardown().await;

        assert!(failures.is_empty());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn teardown_of_vanished_directory_is_quiet() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("work");
        let workspace = Workspace::prepare(&path).await.unwrap();
        std::fs::remove_dir(&path).unwrap();

        assert!(workspace.teardown().await.is_empty());
    }

    #[tokio::test]
    async fn remove_purges_files_created_after_purge() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("work");
        let workspace = Workspace::prepare(&path).await.unwrap();
        std::fs::write(path.join("writer_0_1_0.dat"), b"late").unwrap();

        let failures = workspace.remove().await;

        assert!(failures.is_empty());
        assert!(!path.exists());
    }
}
