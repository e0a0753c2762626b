//! The common interface shared by all worker kinds.
//!
//! A [`Worker`] runs one access pattern in a loop until the [`StopSignal`] is set. The
//! [`WorkerPool`](crate::WorkerPool) spawns workers without knowing which kind they are; they
//! only talk back through the [`Counters`] in their [`WorkerContext`].

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use nix::fcntl::OFlag;
use tokio::fs::{File, OpenOptions};

use crate::counters::Counters;
use crate::stop::StopSignal;

/// Substring embedded in every file produced by a [`WriterWorker`](crate::WriterWorker).
///
/// Readers select the files they consume by this marker alone.
pub const WRITER_FILE_MARKER: &str = "writer";

/// The access pattern a worker runs.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum WorkerKind {
    /// Produces large files with synchronous writes.
    Writer,
    /// Streams back files produced by writers.
    Reader,
    /// Runs short create, write, read and delete cycles.
    RandomIo,
}

impl WorkerKind {
    /// The prefix for file names created by this kind of worker.
    pub fn file_prefix(self) -> &'static str {
        match self {
            WorkerKind::Writer => WRITER_FILE_MARKER,
            WorkerKind::Reader => "reader",
            WorkerKind::RandomIo => "random",
        }
    }
}

impl fmt::Display for WorkerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WorkerKind::Writer => "writer",
            WorkerKind::Reader => "reader",
            WorkerKind::RandomIo => "random-io",
        })
    }
}

/// Identity of a single worker instance: its kind and its index within that kind.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct WorkerId {
    /// The access pattern.
    pub kind: WorkerKind,
    /// Index among workers of the same kind, starting at zero.
    pub index: usize,
}

impl WorkerId {
    /// Creates a new worker identity.
    pub fn new(kind: WorkerKind, index: usize) -> Self {
        Self { kind, index }
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind, self.index)
    }
}

/// Everything a worker shares with the rest of the run.
#[derive(Clone, Debug)]
pub struct WorkerContext {
    /// The working directory all files are created in.
    pub work_dir: PathBuf,
    /// The run-wide stop signal.
    pub stop: StopSignal,
    /// The run-wide counters.
    pub counters: Arc<Counters>,
}

impl WorkerContext {
    /// Creates a new context.
    pub fn new(work_dir: impl Into<PathBuf>, stop: StopSignal, counters: Arc<Counters>) -> Self {
        Self {
            work_dir: work_dir.into(),
            stop,
            counters,
        }
    }
}

/// A single access pattern, run until the stop signal is observed.
///
/// Implementations must check [`StopSignal::is_set`] at least once per iteration of their
/// outer loop and must not start a new file once it returns `true`. Failures are absorbed
/// inside `run`; a worker communicates only through the counters in its context.
#[async_trait::async_trait]
pub trait Worker: Send + fmt::Debug {
    /// The identity of this worker.
    fn id(&self) -> WorkerId;

    /// Runs the access pattern until the stop signal is observed.
    async fn run(&mut self, ctx: WorkerContext);
}

/// Produces unique file paths for one worker instance.
///
/// Names have the form `{prefix}_{index}_{unix_seconds}_{sequence}.dat`. The sequence number
/// keeps two files created by the same worker within one second apart.
#[derive(Debug)]
pub struct FileNamer {
    id: WorkerId,
    sequence: u64,
}

impl FileNamer {
    /// Creates a namer for the given worker.
    pub fn new(id: WorkerId) -> Self {
        Self { id, sequence: 0 }
    }

    /// Returns the next unique path inside `dir`.
    pub fn next_path(&mut self, dir: &Path) -> PathBuf {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or_default();
        let sequence = self.sequence;
        self.sequence += 1;

        dir.join(format!(
            "{}_{}_{timestamp}_{sequence}.dat",
            self.id.kind.file_prefix(),
            self.id.index,
        ))
    }
}

/// Returns `true` if the file name was produced by a writer worker.
pub fn is_writer_file(name: &str) -> bool {
    name.contains(WRITER_FILE_MARKER)
}

/// Creates or truncates `path` for writing.
///
/// With `sync` set, the file is opened with `O_SYNC` so that every write returns only once the
/// data reached stable storage.
pub(crate) async fn create_file(path: &Path, sync: bool) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true).mode(0o644);
    if sync {
        options.custom_flags(OFlag::O_SYNC.bits());
    }
    options.open(path).await
}
