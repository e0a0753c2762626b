//! Process-wide I/O counters shared by every worker.
//!
//! [`Counters`] holds four independent `u64` accumulators. Increments are lock-free
//! `fetch_add`s, so no update is lost regardless of how many workers report at once. There is
//! no invariant spanning multiple counters, which is why a [`CounterSnapshot`] is read counter by
//! counter instead of under a lock.

use std::sync::atomic::{AtomicU64, Ordering};

/// Selects one of the aggregate counters in [`Counters`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Counter {
    /// Bytes successfully handed to the filesystem by write calls.
    BytesWritten,
    /// Bytes returned by read calls.
    BytesRead,
    /// Files that were created and fully written.
    FilesCreated,
    /// Files removed by their owning worker.
    FilesDeleted,
}

/// Monotonic counters mutated concurrently by all workers.
#[derive(Debug, Default)]
pub struct Counters {
    bytes_written: AtomicU64,
    bytes_read: AtomicU64,
    files_created: AtomicU64,
    files_deleted: AtomicU64,
}

impl Counters {
    /// Creates a new set of counters, all starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically adds `amount` to the given counter.
    pub fn increment(&self, counter: Counter, amount: u64) {
        self.slot(counter).fetch_add(amount, Ordering::Relaxed);
    }

    /// Returns the current value of a single counter.
    pub fn get(&self, counter: Counter) -> u64 {
        self.slot(counter).load(Ordering::Relaxed)
    }

    /// Reads all four counters.
    ///
    /// Each value is accurate at the time it is loaded, but the four loads are not taken at a
    /// single instant while workers are still running.
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            bytes_written: self.get(Counter::BytesWritten),
            bytes_read: self.get(Counter::BytesRead),
            files_created: self.get(Counter::FilesCreated),
            files_deleted: self.get(Counter::FilesDeleted),
        }
    }

    fn slot(&self, counter: Counter) -> &AtomicU64 {
        match counter {
            Counter::BytesWritten => &self.bytes_written,
            Counter::BytesRead => &self.bytes_read,
            Counter::FilesCreated => &self.files_created,
            Counter::FilesDeleted => &self.files_deleted,
        }
    }
}

/// Point-in-time copy of [`Counters`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct CounterSnapshot {
    /// Total bytes written.
    pub bytes_written: u64,
    /// Total bytes read.
    pub bytes_read: u64,
    /// Total files created.
    pub files_created: u64,
    /// Total files deleted.
    pub files_deleted: u64,
}
