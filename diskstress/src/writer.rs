//! Writer workers produce large files with synchronous writes.
//!
//! Files are left behind for [`ReaderWorker`](crate::ReaderWorker)s to consume and are only
//! removed when the workspace is torn down.

use std::io;
use std::path::Path;
use std::time::Duration;

use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::config::WriterConfig;
use crate::counters::Counter;
use crate::worker::{FileNamer, Worker, WorkerContext, WorkerId, WorkerKind, create_file};

/// Repeatedly writes a new file up to a target size, until the stop signal is set.
#[derive(Debug)]
pub struct WriterWorker {
    id: WorkerId,
    names: FileNamer,
    block: Vec<u8>,
    file_size: u64,
    pause: Duration,
    sync: bool,
}

impl WriterWorker {
    /// Creates the writer with the given index.
    pub fn new(index: usize, config: &WriterConfig, sync: bool) -> Self {
        let id = WorkerId::new(WorkerKind::Writer, index);

        // The content is irrelevant, random bytes just keep compressing filesystems honest.
        let mut block = vec![0; config.block_size.as_u64() as usize];
        SmallRng::seed_from_u64(rand::random()).fill_bytes(&mut block);

        Self {
            id,
            names: FileNamer::new(id),
            block,
            file_size: config.file_size.as_u64(),
            pause: config.pause,
            sync,
        }
    }

    /// Creates and fills one file.
    ///
    /// Returns `true` if the file counts as created: it was opened and either at least one block
    /// landed or the write loop ended without a failure.
    async fn produce_file(&self, path: &Path, ctx: &WorkerContext) -> bool {
        let file = match create_file(path, self.sync).await {
            Ok(file) => file,
            Err(error) => {
                tracing::trace!(
                    worker = %self.id,
                    path = %path.display(),
                    error = &error as &dyn std::error::Error,
                    "failed to open file"
                );
                return false;
            }
        };

        let (written, result) = write_blocks(file, &self.block, self.file_size, ctx).await;
        match result {
            Ok(()) => {
                tracing::trace!(worker = %self.id, path = %path.display(), written, "file complete");
                true
            }
            Err(error) => {
                tracing::trace!(
                    worker = %self.id,
                    path = %path.display(),
                    written,
                    error = &error as &dyn std::error::Error,
                    "abandoning file"
                );
                written > 0
            }
        }
    }
}

#[async_trait::async_trait]
impl Worker for WriterWorker {
    fn id(&self) -> WorkerId {
        self.id
    }

    async fn run(&mut self, ctx: WorkerContext) {
        while !ctx.stop.is_set() {
            let path = self.names.next_path(&ctx.work_dir);

            if self.produce_file(&path, &ctx).await {
                ctx.counters.increment(Counter::FilesCreated, 1);
            }

            ctx.stop.pause(self.pause).await;
        }
    }
}

/// Writes `block` into `out` until `target` bytes are written or the stop signal is set.
///
/// Returns the number of bytes written together with how the loop ended. Every successful block
/// is added to [`Counter::BytesWritten`] right away. The first failed or zero-length write ends
/// the loop with an error; bytes written before that stay counted.
pub(crate) async fn write_blocks<W>(
    mut out: W,
    block: &[u8],
    target: u64,
    ctx: &WorkerContext,
) -> (u64, io::Result<()>)
where
    W: AsyncWrite + Unpin,
{
    let mut written = 0;
    let result = fill(&mut out, block, target, ctx, &mut written).await;
    (written, result)
}

async fn fill<W>(
    out: &mut W,
    block: &[u8],
    target: u64,
    ctx: &WorkerContext,
    written: &mut u64,
) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while *written < target && !ctx.stop.is_set() {
        let len = (target - *written).min(block.len() as u64) as usize;
        let n = out.write(&block[..len]).await?;
        if n == 0 {
            return Err(io::ErrorKind::WriteZero.into());
        }
        // `tokio::fs::File` completes writes in the background; flushing surfaces the outcome.
        out.flush().await?;

        *written += n as u64;
        ctx.counters.increment(Counter::BytesWritten, n as u64);
    }

    out.shutdown().await
}
