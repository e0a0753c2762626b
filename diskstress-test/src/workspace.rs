//! Temporary working directories for stress runs.
//!
//! ```
//! use diskstress_test::workspace::TestDir;
//!
//! let dir = TestDir::new();
//! assert!(!dir.work_dir().exists());
//! ```

use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A temporary parent directory with a not yet existing working directory inside.
///
/// Stress runs create and remove their working directory themselves, so it starts out missing.
/// The parent is deleted when this value is dropped.
#[derive(Debug)]
pub struct TestDir {
    parent: TempDir,
}

impl TestDir {
    /// Creates a fresh temporary parent directory.
    pub fn new() -> Self {
        Self {
            parent: tempfile::tempdir().unwrap(),
        }
    }

    /// The working directory for a stress run.
    pub fn work_dir(&self) -> PathBuf {
        self.parent.path().join("work")
    }

    /// The temporary parent directory.
    pub fn parent(&self) -> &Path {
        self.parent.path()
    }
}

impl Default for TestDir {
    fn default() -> Self {
        Self::new()
    }
}
