//! Error types for setting up and tearing down a stress run.
//!
//! Workers never surface errors: transient I/O failures are absorbed inside the worker loop.
//! Only the setup phase can fail a run.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::pool::PoolState;

/// Errors that abort a stress run before or while it starts.
#[derive(Debug, Error)]
pub enum Error {
    /// The working directory could not be created or opened.
    #[error("failed to prepare workspace at {}: {source}", .path.display())]
    Workspace {
        /// The working directory.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The configuration contains values the workers cannot run with.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Handlers for external termination requests could not be installed.
    #[error("failed to install signal handler: {0}")]
    Signal(#[source] io::Error),

    /// An operation was issued against the worker pool in the wrong lifecycle state.
    #[error("worker pool is {actual:?}, expected {expected:?}")]
    PoolState {
        /// The state the operation requires.
        expected: PoolState,
        /// The state the pool was in.
        actual: PoolState,
    },
}

/// Result type for stress run operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A best-effort cleanup step that failed during workspace purge or teardown.
#[derive(Debug, Error)]
#[error("failed to remove {}: {source}", .path.display())]
pub struct CleanupError {
    /// The file or directory that could not be removed.
    pub path: PathBuf,
    /// The underlying I/O error.
    #[source]
    pub source: io::Error,
}
