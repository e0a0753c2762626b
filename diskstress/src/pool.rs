//! Supervision of the worker tasks and their two-phase shutdown.
//!
//! A [`WorkerPool`] moves through `Idle → Running → Draining → Terminated`:
//!
//! - [`start`](WorkerPool::start) spawns every worker as its own tokio task.
//! - [`shutdown`](WorkerPool::shutdown) sets the stop signal and gives workers a grace period
//!   to leave their loops on their own.
//! - Afterwards, all tasks that are still outstanding are aborted and every task is reaped. The
//!   pool reports `Terminated` only once no worker task is left.
//!
//! Aborting takes effect at the next suspension point of a worker. Since all file I/O goes
//! through `tokio::fs`, every read, write and open is such a point. An abort drops the worker's
//! future and its file handles, but it cannot cancel a system call that is already running on the
//! blocking pool; such a call completes on its own, after the pool reports `Terminated`. The
//! binary therefore shuts its runtime down with a timeout instead of waiting for those threads.

use std::collections::BTreeSet;
use std::time::Duration;

use tokio::task::{JoinError, JoinSet};
use tokio::time::Instant;

use crate::error::{Error, Result};
use crate::stop::StopReason;
use crate::worker::{Worker, WorkerContext, WorkerId};

/// Lifecycle state of a [`WorkerPool`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PoolState {
    /// No workers were spawned yet.
    Idle,
    /// Workers are running.
    Running,
    /// The stop signal is set and workers are given time to exit.
    Draining,
    /// All workers have been reaped.
    Terminated,
}

/// Which workers left voluntarily during the grace period and which had to be aborted.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ShutdownOutcome {
    /// Workers that returned from their run loop on their own.
    pub voluntary: Vec<WorkerId>,
    /// Workers that were aborted or panicked.
    pub forced: Vec<WorkerId>,
}

/// Spawns workers and drives their shutdown.
#[derive(Debug)]
pub struct WorkerPool {
    state: PoolState,
    context: WorkerContext,
    tasks: JoinSet<WorkerId>,
    outstanding: BTreeSet<WorkerId>,
}

impl WorkerPool {
    /// Creates an idle pool whose workers will share the given context.
    pub fn new(context: WorkerContext) -> Self {
        Self {
            state: PoolState::Idle,
            context,
            tasks: JoinSet::new(),
            outstanding: BTreeSet::new(),
        }
    }

    /// The current lifecycle state.
    pub fn state(&self) -> PoolState {
        self.state
    }

    /// Number of worker tasks that have not been reaped yet.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Returns `true` if no worker task is left.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Spawns all given workers and moves the pool to [`PoolState::Running`].
    pub fn start<I>(&mut self, workers: I) -> Result<()>
    where
        I: IntoIterator<Item = Box<dyn Worker>>,
    {
        self.expect_state(PoolState::Idle)?;

        for mut worker in workers {
            let id = worker.id();
            let ctx = self.context.clone();
            self.outstanding.insert(id);
            self.tasks.spawn(async move {
                tracing::debug!(worker = %id, "worker started");
                worker.run(ctx).await;
                tracing::debug!(worker = %id, "worker stopped");
                id
            });
        }

        self.state = PoolState::Running;
        tracing::info!(workers = self.tasks.len(), "worker pool running");
        Ok(())
    }

    /// Stops all workers, first cooperatively and then by force.
    ///
    /// The stop signal is set if nobody did so yet. Workers have `grace` to return on their own;
    /// after that every remaining task is aborted and all tasks are awaited. Aborting a task that
    /// already finished is a no-op.
    pub async fn shutdown(&mut self, grace: Duration) -> Result<ShutdownOutcome> {
        self.expect_state(PoolState::Running)?;

        self.context.stop.trigger(StopReason::Requested);
        self.state = PoolState::Draining;
        tracing::info!(?grace, "draining workers");

        let mut outcome = ShutdownOutcome::default();
        let deadline = Instant::now() + grace;
        loop {
            let joined = match tokio::time::timeout_at(deadline, self.tasks.join_next()).await {
                Ok(Some(joined)) => joined,
                Ok(None) | Err(_) => break,
            };
            record(&mut self.outstanding, joined, &mut outcome);
        }

        self.tasks.abort_all();
        while let Some(joined) = self.tasks.join_next().await {
            record(&mut self.outstanding, joined, &mut outcome);
        }

        // Whatever did not report back was aborted or panicked.
        outcome.forced = std::mem::take(&mut self.outstanding).into_iter().collect();
        for id in &outcome.forced {
            tracing::warn!(worker = %id, "worker did not exit within the grace period");
        }
        outcome.voluntary.sort();

        self.state = PoolState::Terminated;
        tracing::info!(
            voluntary = outcome.voluntary.len(),
            forced = outcome.forced.len(),
            "worker pool terminated"
        );
        Ok(outcome)
    }

    fn expect_state(&self, expected: PoolState) -> Result<()> {
        if self.state != expected {
            return Err(Error::PoolState {
                expected,
                actual: self.state,
            });
        }
        Ok(())
    }
}

fn record(
    outstanding: &mut BTreeSet<WorkerId>,
    joined: Result<WorkerId, JoinError>,
    outcome: &mut ShutdownOutcome,
) {
    match joined {
        Ok(id) => {
            outstanding.remove(&id);
            outcome.voluntary.push(id);
        }
        Err(error) if error.is_panic() => {
            tracing::error!(error = &error as &dyn std::error::Error, "worker panicked");
        }
        Err(_) => {}
    }
}
