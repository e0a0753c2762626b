//! Synthetic filesystem workload generator.
//!
//! Runs concurrent writer, reader and random-I/O workers against a single working directory for
//! the given number of seconds, then prints aggregate throughput and file churn:
//!
//! ```sh
//! diskstress 30
//! diskstress 30 -c diskstress.yml
//! ```
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

fn main() -> anyhow::Result<()> {
    diskstress::cli::execute()
}
