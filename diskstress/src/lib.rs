//! This is a stresstest library which saturates a local filesystem with several concurrent
//! [`Worker`]s for a bounded duration.
//!
//! Three access patterns run side by side against a single working directory:
//!
//! - [`WriterWorker`]s produce large files with synchronous writes and leave them behind.
//! - [`ReaderWorker`]s repeatedly scan the directory and stream every writer file back.
//! - [`RandomIoWorker`]s run short create, write, read and delete cycles on private files.
//!
//! All workers share one [`StopSignal`] and one set of [`Counters`]. The [`WorkerPool`] runs
//! the two-phase shutdown: workers get a grace period to notice the stop signal, after which
//! the remaining ones are aborted and reaped.
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod cli;
pub mod config;
pub mod counters;
pub mod error;
pub mod observability;
pub mod pool;
pub mod random_io;
pub mod reader;
pub mod report;
pub mod stop;
pub mod stresstest;
pub mod worker;
pub mod workspace;
pub mod writer;

pub use crate::config::Config;
pub use crate::counters::{Counter, CounterSnapshot, Counters};
pub use crate::error::{Error, Result};
pub use crate::pool::{PoolState, ShutdownOutcome, WorkerPool};
pub use crate::random_io::RandomIoWorker;
pub use crate::reader::ReaderWorker;
pub use crate::report::Report;
pub use crate::stop::{StopReason, StopSignal};
pub use crate::stresstest::{run, run_until_stopped};
pub use crate::worker::{Worker, WorkerContext, WorkerId, WorkerKind};
pub use crate::workspace::Workspace;
pub use crate::writer::WriterWorker;
