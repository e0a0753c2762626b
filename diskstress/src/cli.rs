//! Command line entry point: argument parsing, runtime bootstrap and report output.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use argh::FromArgs;
use tokio::runtime::Runtime;

use crate::config::Config;
use crate::{observability, stresstest};

/// Saturates a filesystem with concurrent writers, readers and random-I/O workers for the given
/// number of seconds, then prints throughput and file statistics.
#[derive(Debug, FromArgs)]
struct Args {
    /// how long to run, in seconds
    #[argh(positional)]
    duration: u64,

    /// path to a YAML configuration file
    #[argh(option, short = 'c')]
    config: Option<PathBuf>,
}

/// Bootstrap the runtime and execute a stress run.
pub fn execute() -> Result<()> {
    let args: Args = argh::from_env();
    if args.duration == 0 {
        if let Err(usage) = Args::from_args(&["diskstress"], &["--help"]) {
            eprintln!("{}", usage.output);
        }
        anyhow::bail!("the duration must be a positive number of seconds");
    }

    let mut config = match args.config {
        Some(path) => Config::from_yaml_file(&path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => Config::default(),
    };
    config.duration = Duration::from_secs(args.duration);

    observability::init_tracing();
    tracing::debug!(?config);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .thread_name("diskstress")
        .enable_all()
        .build()?;

    let grace_period = config.grace_period;
    let report = block_on_bounded(runtime, stresstest::run(config), grace_period)?;

    println!();
    println!("{report}");
    Ok(())
}

/// Drives `future` to completion, then shuts the runtime down within `grace`.
///
/// Aborted workers can leave file system calls running on the blocking pool. Dropping the
/// runtime would wait for them indefinitely, so those threads are abandoned after `grace`.
fn block_on_bounded<F: Future>(runtime: Runtime, future: F, grace: Duration) -> F::Output {
    let output = runtime.block_on(future);
    runtime.shutdown_timeout(grace);
    output
}
