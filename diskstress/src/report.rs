//! Final statistics of a stress run.

use std::fmt;
use std::time::Duration;

use yansi::Paint;

use crate::counters::CounterSnapshot;
use crate::pool::ShutdownOutcome;
use crate::stop::StopReason;

const MIB: f64 = 1024.0 * 1024.0;

/// Aggregate results of a completed run.
///
/// Throughput is computed over [`total_time`](Self::total_time), the full wall time from spawning
/// the first worker until the last one was reaped, since the counters include everything moved
/// during the drain as well.
#[derive(Clone, Debug)]
pub struct Report {
    /// Final counter values, read after all workers were reaped.
    pub counters: CounterSnapshot,
    /// Time from starting the workers until the stop signal was set.
    pub run_time: Duration,
    /// Time from starting the workers until all of them were reaped.
    pub total_time: Duration,
    /// What ended the run.
    pub stop_reason: StopReason,
    /// How the workers left.
    pub shutdown: ShutdownOutcome,
}

impl Report {
    /// Total data written in MiB.
    pub fn mib_written(&self) -> f64 {
        self.counters.bytes_written as f64 / MIB
    }

    /// Total data read in MiB.
    pub fn mib_read(&self) -> f64 {
        self.counters.bytes_read as f64 / MIB
    }

    /// Write throughput in MiB/s over the total wall time.
    pub fn write_throughput(&self) -> f64 {
        per_second(self.mib_written(), self.total_time)
    }

    /// Read throughput in MiB/s over the total wall time.
    pub fn read_throughput(&self) -> f64 {
        per_second(self.mib_read(), self.total_time)
    }
}

fn per_second(amount: f64, duration: Duration) -> f64 {
    let secs = duration.as_secs_f64();
    if secs > 0.0 { amount / secs } else { 0.0 }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", "## FINAL STATISTICS".bold())?;
        writeln!(f, "Stopped by: {}", self.stop_reason.blue())?;
        writeln!(
            f,
            "Run time: {}",
            format!("{:.2} s", self.run_time.as_secs_f64()).bold()
        )?;
        writeln!(
            f,
            "Elapsed time: {}",
            format!("{:.2} s", self.total_time.as_secs_f64()).bold()
        )?;
        writeln!(
            f,
            "Data written: {}",
            format!("{:.2} MiB", self.mib_written()).bold()
        )?;
        writeln!(
            f,
            "Data read: {}",
            format!("{:.2} MiB", self.mib_read()).bold()
        )?;
        writeln!(
            f,
            "Write throughput: {}",
            format!("{:.2} MiB/s", self.write_throughput()).bold().green()
        )?;
        writeln!(
            f,
            "Read throughput: {}",
            format!("{:.2} MiB/s", self.read_throughput()).bold().green()
        )?;
        writeln!(f, "Files created: {}", self.counters.files_created.bold())?;
        writeln!(f, "Files deleted: {}", self.counters.files_deleted.bold())?;

        let voluntary = self.shutdown.voluntary.len();
        let forced = self.shutdown.forced.len();
        write!(f, "Workers: {} exited", voluntary.bold())?;
        if forced > 0 {
            write!(f, ", {}", format!("{forced} ABORTED").bold().red())?;
        }
        Ok(())
    }
}
