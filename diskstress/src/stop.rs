//! The process-wide stop signal observed by every worker.

use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Why a run was asked to stop.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StopReason {
    /// The configured run duration elapsed.
    Deadline,
    /// An interactive interrupt (`SIGINT`) was received.
    Interrupt,
    /// A programmatic termination request (`SIGTERM`) was received.
    Terminate,
    /// The stop was requested through the API, e.g. by an embedding program.
    Requested,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StopReason::Deadline => "deadline",
            StopReason::Interrupt => "interrupt",
            StopReason::Terminate => "terminate",
            StopReason::Requested => "requested",
        })
    }
}

/// A write-once cancellation flag shared by the supervisor and all workers.
///
/// The flag transitions from unset to set exactly once and never reverts. Only the first call to
/// [`trigger`](Self::trigger) wins and records its [`StopReason`]. Checking the flag is a single
/// atomic load, cheap enough for every loop iteration of every worker.
#[derive(Clone, Debug, Default)]
pub struct StopSignal {
    reason: Arc<OnceLock<StopReason>>,
    token: CancellationToken,
}

impl StopSignal {
    /// Creates an unset stop signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the signal.
    ///
    /// Returns `true` if this call set the signal and `false` if it had already been set, in
    /// which case the first reason is kept.
    pub fn trigger(&self, reason: StopReason) -> bool {
        if self.reason.set(reason).is_err() {
            return false;
        }
        self.token.cancel();
        true
    }

    /// Returns `true` once the signal has been set.
    pub fn is_set(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Returns the reason recorded by the first [`trigger`](Self::trigger), if any.
    pub fn reason(&self) -> Option<StopReason> {
        self.reason.get().copied()
    }

    /// Completes once the signal has been set.
    pub async fn stopped(&self) {
        self.token.cancelled().await
    }

    /// Sleeps for `duration`, returning early if the signal gets set in the meantime.
    pub async fn pause(&self, duration: Duration) {
        tokio::select! {
            _ = self.token.cancelled() => {}
            _ = tokio::time::sleep(duration) => {}
        }
    }
}
