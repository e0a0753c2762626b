//! Random-I/O workers run short-lived create, write, read and delete cycles.
//!
//! Unlike writer files, each file here is private to one worker and removed before the next
//! cycle starts.

use std::io;
use std::path::Path;
use std::time::Duration;

use rand::rngs::SmallRng;
use rand::{Rng, RngCore, SeedableRng};
use tokio::fs::File;
use tokio::io::AsyncReadExt;

use crate::config::RandomIoConfig;
use crate::counters::Counter;
use crate::worker::{FileNamer, Worker, WorkerContext, WorkerId, WorkerKind, create_file};
use crate::writer::write_blocks;

/// Runs small create, write, read and delete cycles until the stop signal is set.
#[derive(Debug)]
pub struct RandomIoWorker {
    id: WorkerId,
    names: FileNamer,
    block: Vec<u8>,
    buffer: Vec<u8>,
    blocks: usize,
    min_pause: Duration,
    max_pause: Duration,
    sync: bool,
    rng: SmallRng,
}

impl RandomIoWorker {
    /// Creates the random-I/O worker with the given index.
    pub fn new(index: usize, config: &RandomIoConfig, sync: bool) -> Self {
        let id = WorkerId::new(WorkerKind::RandomIo, index);
        let block_size = config.block_size.as_u64() as usize;

        let mut rng = SmallRng::seed_from_u64(rand::random());
        let mut block = vec![0; block_size];
        rng.fill_bytes(&mut block);

        Self {
            id,
            names: FileNamer::new(id),
            block,
            buffer: vec![0; block_size],
            blocks: config.blocks,
            min_pause: config.min_pause,
            max_pause: config.max_pause,
            sync,
            rng,
        }
    }

    /// Runs one full cycle on a fresh file.
    ///
    /// Only a failed create ends the cycle early. A failed write or read-back abandons just that
    /// step, so the file is still removed before the next cycle.
    async fn cycle(&mut self, ctx: &WorkerContext) {
        let path = self.names.next_path(&ctx.work_dir);

        let file = match create_file(&path, self.sync).await {
            Ok(file) => file,
            Err(error) => {
                tracing::trace!(
                    worker = %self.id,
                    path = %path.display(),
                    error = &error as &dyn std::error::Error,
                    "failed to create file"
                );
                return;
            }
        };
        ctx.counters.increment(Counter::FilesCreated, 1);

        let target = (self.block.len() * self.blocks) as u64;
        let (written, result) = write_blocks(file, &self.block, target, ctx).await;
        if let Err(error) = result {
            tracing::trace!(
                worker = %self.id,
                path = %path.display(),
                written,
                error = &error as &dyn std::error::Error,
                "write failed"
            );
        }

        if let Err(error) = self.read_file(&path, ctx).await {
            tracing::trace!(
                worker = %self.id,
                path = %path.display(),
                error = &error as &dyn std::error::Error,
                "read back failed"
            );
        }

        // Once stopping, leave the file to workspace teardown instead of racing it.
        if ctx.stop.is_set() {
            return;
        }
        match tokio::fs::remove_file(&path).await {
            Ok(()) => ctx.counters.increment(Counter::FilesDeleted, 1),
            Err(error) => tracing::trace!(
                worker = %self.id,
                path = %path.display(),
                error = &error as &dyn std::error::Error,
                "failed to delete file"
            ),
        }
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

    fn next_pause(&mut self) -> Duration {
        self.rng.random_range(self.min_pause..=self.max_pause)
    }
}

#[async_trait::async_trait]
impl Worker for RandomIoWorker {
    fn id(&self) -> WorkerId {
        self.id
    }

    async fn run(&mut self, ctx: WorkerContext) {
        while !ctx.stop.is_set() {
            self.cycle(&ctx).await;

            if !ctx.stop.is_set() {
                let pause = self.next_pause();
                ctx.stop.pause(pause).await;
            }
        }
    }
}
