//! Log capture for stress run tests.

use tracing_subscriber::EnvFilter;

/// Directive applied when `RUST_LOG` is not set.
///
/// Workers log every absorbed I/O failure at `trace`, which floods the output of a multi-second
/// run. `debug` keeps worker start and stop, pool transitions and workspace cleanup.
const DEFAULT_DIRECTIVES: &str = "warn,diskstress=debug";

/// Routes `tracing` output of the library under test into the test harness.
///
/// Output goes through the harness' capturing writer, so it only shows up for failing tests or
/// with `--nocapture`. `RUST_LOG` overrides the default directives, e.g. `RUST_LOG=trace` to see
/// every failed write of a worker. Calling this more than once is fine.
///
/// ```
/// diskstress_test::tracing::init();
/// ```
pub fn init() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_test_writer()
        .compact()
        .try_init()
        .ok();
}
