//! Reader workers stream back the files produced by writers.

use std::io;
use std::path::Path;
use std::time::Duration;

use tokio::fs::File;
use tokio::io::AsyncReadExt;

use crate::config::ReaderConfig;
use crate::counters::Counter;
use crate::worker::{Worker, WorkerContext, WorkerId, WorkerKind, is_writer_file};

/// Repeatedly scans the working directory and reads every writer file sequentially.
///
/// Entries can vanish or still be growing while they are read; failures on a single entry only
/// skip that entry. Reading the same file again on a later pass is expected and counts again.
#[derive(Debug)]
pub struct ReaderWorker {
    id: WorkerId,
    buffer: Vec<u8>,
    pause: Duration,
}

impl ReaderWorker {
    /// Creates the reader with the given index.
    pub fn new(index: usize, config: &ReaderConfig) -> Self {
        Self {
            id: WorkerId::new(WorkerKind::Reader, index),
            buffer: vec![0; config.block_size.as_u64() as usize],
            pause: config.pause,
        }
    }

    /// Reads all writer files currently listed in the working directory once.
    async fn read_pass(&mut self, ctx: &WorkerContext) -> io::Result<()> {
        let mut entries = tokio::fs::read_dir(&ctx.work_dir).await?;

        while !ctx.stop.is_set() {
            let Some(entry) = entries.next_entry().await? else {
                break;
            };
            if !is_writer_file(&entry.file_name().to_string_lossy()) {
                continue;
            }

            let path = entry.path();
            if let Err(error) = self.read_file(&path, ctx).await {
                tracing::trace!(
                    worker = %self.id,
                    path = %path.display(),
                    error = &error as &dyn std::error::Error,
                    "skipping file"
                );
            }
        }

        Ok(())
    }

    async fn read_file(&mut self, path: &Path, ctx: &WorkerContext) -> io::Result<()> {
        let mut file = File::open(path).await?;

        while !ctx.stop.is_set() {
            let n = file.read(&mut self.buffer).await?;
            if n == 0 {
                break;
            }
            ctx.counters.increment(Counter::BytesRead, n as u64);
        }

        Ok(())
    }
}

#[async_trait::async_trait]
impl Worker for ReaderWorker {
    fn id(&self) -> WorkerId {
        self.id
    }

    async fn run(&mut self, ctx: WorkerContext) {
        while !ctx.stop.is_set() {
            if let Err(error) = self.read_pass(&ctx).await {
                tracing::trace!(
                    worker = %self.id,
                    error = &error as &dyn std::error::Error,
                    "failed to list working directory"
                );
            }

            ctx.stop.pause(self.pause).await;
        }
    }
}
