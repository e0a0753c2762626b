//! Run all workers against the working directory for a bounded duration and report the totals.

use std::sync::Arc;
use std::time::Duration;

use bytesize::ByteSize;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::signal::unix::{SignalKind, signal};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::config::Config;
use crate::counters::{CounterSnapshot, Counters};
use crate::error::{Error, Result};
use crate::pool::WorkerPool;
use crate::random_io::RandomIoWorker;
use crate::reader::ReaderWorker;
use crate::report::Report;
use crate::stop::{StopReason, StopSignal};
use crate::worker::{Worker, WorkerContext};
use crate::workspace::Workspace;
use crate::writer::WriterWorker;

/// How often the spinner refreshes the live counters.
const PROGRESS_INTERVAL: Duration = Duration::from_millis(500);

/// Runs a complete stress run, stopping early on `SIGINT` or `SIGTERM`.
///
/// Both signals lead to the same drain-then-abort shutdown as the regular deadline.
pub async fn run(config: Config) -> Result<Report> {
    let stop = StopSignal::new();
    let listener = listen_for_signals(stop.clone())?;

    let result = run_until_stopped(config, stop).await;

    listener.abort();
    result
}

/// Runs a complete stress run until the configured duration elapses or `stop` is set.
///
/// This prepares the workspace, spawns all workers, waits for the stop condition, shuts the pool
/// down and finally removes the workspace. Failures during removal are logged but do not fail
/// the run.
pub async fn run_until_stopped(config: Config, stop: StopSignal) -> Result<Report> {
    config.validate()?;

    let workspace = Workspace::prepare(&config.work_dir).await?;
    let counters = Arc::new(Counters::new());
    let context = WorkerContext::new(workspace.path(), stop.clone(), Arc::clone(&counters));

    tracing::info!(
        duration = ?config.duration,
        work_dir = %workspace.path().display(),
        writers = config.workers.writers,
        readers = config.workers.readers,
        random_io = config.workers.random_io,
        "starting stresstest"
    );

    let bar = ProgressBar::new_spinner()
        .with_style(
            ProgressStyle::with_template("{spinner} {msg} {elapsed}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        )
        .with_message("Running stresstest:");
    bar.enable_steady_tick(Duration::from_millis(100));

    let start = Instant::now();
    let mut pool = WorkerPool::new(context);
    pool.start(spawn_list(&config))?;

    wait_for_stop(&stop, config.duration, &counters, &bar).await;
    let run_time = start.elapsed();

    bar.set_message("Stopping workers:");
    let shutdown = pool.shutdown(config.grace_period).await?;
    let total_time = start.elapsed();
    bar.finish_and_clear();

    for failure in workspace.teardown().await {
        tracing::error!(error = &failure as &dyn std::error::Error, "cleanup failed");
    }

    Ok(Report {
        counters: counters.snapshot(),
        run_time,
        total_time,
        stop_reason: stop.reason().unwrap_or(StopReason::Requested),
        shutdown,
    })
}

/// Creates all configured workers, writers first.
fn spawn_list(config: &Config) -> Vec<Box<dyn Worker>> {
    let mut workers: Vec<Box<dyn Worker>> = Vec::with_capacity(config.workers.total());

    for index in 0..config.workers.writers {
        workers.push(Box::new(WriterWorker::new(
            index,
            &config.writer,
            config.sync_writes,
        )));
    }
    for index in 0..config.workers.readers {
        workers.push(Box::new(ReaderWorker::new(index, &config.reader)));
    }
    for index in 0..config.workers.random_io {
        workers.push(Box::new(RandomIoWorker::new(
            index,
            &config.random_io,
            config.sync_writes,
        )));
    }

    workers
}

/// Waits until the deadline passes or somebody else sets the stop signal.
async fn wait_for_stop(
    stop: &StopSignal,
    duration: Duration,
    counters: &Counters,
    bar: &ProgressBar,
) {
    // See <https://docs.rs/tokio/latest/tokio/time/struct.Sleep.html#examples>
    let deadline = tokio::time::sleep(duration);
    tokio::pin!(deadline);

    let mut ticker = tokio::time::interval(PROGRESS_INTERVAL);

    loop {
        tokio::select! {
            _ = &mut deadline => {
                if stop.trigger(StopReason::Deadline) {
                    tracing::info!("duration elapsed, stopping workers");
                }
                break;
            }
            _ = stop.stopped() => {
                tracing::info!(reason = ?stop.reason(), "stop requested");
                break;
            }
            _ = ticker.tick() => {
                bar.set_message(progress_message(&counters.snapshot()));
            }
        }
    }
}

fn progress_message(snapshot: &CounterSnapshot) -> String {
    format!(
        "Running stresstest: {} written, {} read, {} files",
        ByteSize::b(snapshot.bytes_written),
        ByteSize::b(snapshot.bytes_read),
        snapshot.files_created,
    )
}

/// Sets the stop signal on the first `SIGINT` or `SIGTERM`.
fn listen_for_signals(stop: StopSignal) -> Result<JoinHandle<()>> {
    let mut interrupt = signal(SignalKind::interrupt()).map_err(Error::Signal)?;
    let mut terminate = signal(SignalKind::terminate()).map_err(Error::Signal)?;

    Ok(tokio::spawn(async move {
        let reason = tokio::select! {
            _ = interrupt.recv() => StopReason::Interrupt,
            _ = terminate.recv() => StopReason::Terminate,
            _ = stop.stopped() => return,
        };

        if stop.trigger(reason) {
            tracing::info!(%reason, "received termination request");
        }
    }))
}
