//! Configuration for a stress run.
//!
//! All fields have defaults, so a run needs nothing but a duration. A YAML file passed via
//! `-c` or `--config` may override any subset of them:
//!
//! ```yaml
//! work_dir: /mnt/scratch/diskstress
//! grace_period: 5s
//! sync_writes: true
//!
//! workers:
//!   writers: 2
//!   readers: 1
//!   random_io: 1
//!
//! writer:
//!   file_size: 64 MiB
//!   block_size: 4 KiB
//!   pause: 10ms
//! ```

use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use bytesize::ByteSize;
use serde::Deserialize;

use crate::error::{Error, Result};

/// Default location of the working directory.
pub const DEFAULT_WORK_DIR: &str = "/tmp/vm_disk_stress";

/// Settings of a complete stress run.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// The working directory. It is created if missing and removed after the run.
    pub work_dir: PathBuf,

    /// How long workers run before the stop signal is set.
    ///
    /// The command line overrides this value.
    #[serde(with = "humantime_serde")]
    pub duration: Duration,

    /// How long workers get to exit on their own before they are aborted.
    #[serde(with = "humantime_serde")]
    pub grace_period: Duration,

    /// Open written files with `O_SYNC`, so each write waits for stable storage.
    pub sync_writes: bool,

    /// Number of workers per kind.
    pub workers: WorkerCounts,

    /// Settings for writer workers.
    pub writer: WriterConfig,

    /// Settings for reader workers.
    pub reader: ReaderConfig,

    /// Settings for random-I/O workers.
    pub random_io: RandomIoConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from(DEFAULT_WORK_DIR),
            duration: Duration::from_secs(60),
            grace_period: Duration::from_secs(2),
            sync_writes: true,
            workers: WorkerCounts::default(),
            writer: WriterConfig::default(),
            reader: ReaderConfig::default(),
            random_io: RandomIoConfig::default(),
        }
    }
}

impl Config {
    /// Loads the configuration from a YAML file, using defaults for missing fields.
    pub fn from_yaml_file(path: &Path) -> anyhow::Result<Self> {
        let file = File::open(path).context("failed to open config file")?;
        let config = serde_yaml::from_reader(file).context("failed to parse config YAML")?;
        Ok(config)
    }

    /// Checks that workers can run with these settings.
    pub fn validate(&self) -> Result<()> {
        if self.duration.is_zero() {
            return Err(invalid("duration must be positive"));
        }
        if self.workers.total() == 0 {
            return Err(invalid("at least one worker is required"));
        }
        if self.writer.file_size.as_u64() == 0 {
            return Err(invalid("writer.file_size must be positive"));
        }
        if self.writer.block_size.as_u64() == 0 {
            return Err(invalid("writer.block_size must be positive"));
        }
        if self.reader.block_size.as_u64() == 0 {
            return Err(invalid("reader.block_size must be positive"));
        }
        if self.random_io.block_size.as_u64() == 0 {
            return Err(invalid("random_io.block_size must be positive"));
        }
        if self.random_io.min_pause > self.random_io.max_pause {
            return Err(invalid("random_io.min_pause must not exceed random_io.max_pause"));
        }
        Ok(())
    }
}

fn invalid(message: &str) -> Error {
    Error::InvalidConfig(message.to_owned())
}

/// Number of workers spawned per kind.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct WorkerCounts {
    /// Writer workers.
    pub writers: usize,
    /// Reader workers.
    pub readers: usize,
    /// Random-I/O workers.
    pub random_io: usize,
}

impl WorkerCounts {
    /// Total number of workers over all kinds.
    pub fn total(&self) -> usize {
        self.writers + self.readers + self.random_io
    }
}

impl Default for WorkerCounts {
    fn default() -> Self {
        Self {
            writers: 6,
            readers: 4,
            random_io: 4,
        }
    }
}

/// Settings for [`WriterWorker`](crate::WriterWorker)s.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct WriterConfig {
    /// Size at which a file is considered complete.
    pub file_size: ByteSize,
    /// Size of a single write call.
    pub block_size: ByteSize,
    /// Pause between two files.
    #[serde(with = "humantime_serde")]
    pub pause: Duration,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            file_size: ByteSize::mib(500),
            block_size: ByteSize::kib(4),
            pause: Duration::from_millis(10),
        }
    }
}

/// Settings for [`ReaderWorker`](crate::ReaderWorker)s.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Size of a single read call.
    pub block_size: ByteSize,
    /// Pause between two directory passes.
    #[serde(with = "humantime_serde")]
    pub pause: Duration,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            block_size: ByteSize::kib(4),
            pause: Duration::from_millis(50),
        }
    }
}

/// Settings for [`RandomIoWorker`](crate::RandomIoWorker)s.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct RandomIoConfig {
    /// Size of a single read or write call.
    pub block_size: ByteSize,
    /// Number of blocks written per file.
    pub blocks: usize,
    /// Lower bound of the randomized pause between cycles.
    #[serde(with = "humantime_serde")]
    pub min_pause: Duration,
    /// Upper bound of the randomized pause between cycles.
    #[serde(with = "humantime_serde")]
    pub max_pause: Duration,
}

impl Default for RandomIoConfig {
    fn default() -> Self {
        Self {
            block_size: ByteSize::b(512),
            blocks: 50,
            min_pause: Duration::from_millis(1),
            max_pause: Duration::from_millis(2),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn defaults_match_the_classic_run() {
        let config = Config::default();

        assert_eq!(config.work_dir, Path::new(DEFAULT_WORK_DIR));
        assert_eq!(config.grace_period, Duration::from_secs(2));
        assert_eq!(
            config.workers,
            WorkerCounts {
                writers: 6,
                readers: 4,
                random_io: 4
            }
        );
        assert_eq!(config.writer.file_size.as_u64(), 500 * 1024 * 1024);
        assert_eq!(config.writer.block_size.as_u64(), 4096);
        assert_eq!(config.random_io.block_size.as_u64(), 512);
        assert_eq!(config.random_io.blocks, 50);
        config.validate().unwrap();
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
work_dir: /scratch/stress
grace_period: 500ms
workers:
  writers: 2
  readers: 1
writer:
  file_size: 64 MiB
"#
        )
        .unwrap();

        let config = Config::from_yaml_file(file.path()).unwrap();

        assert_eq!(config.work_dir, Path::new("/scratch/stress"));
        assert_eq!(config.grace_period, Duration::from_millis(500));
        assert_eq!(config.workers.writers, 2);
        assert_eq!(config.workers.readers, 1);
        assert_eq!(config.workers.random_io, 4);
        assert_eq!(config.writer.file_size, ByteSize::mib(64));
        assert_eq!(config.writer.block_size, ByteSize::kib(4));
        assert!(config.sync_writes);
    }

    #[test]
    fn missing_file_is_reported() {
        let err = Config::from_yaml_file(Path::new("/nonexistent/diskstress.yml")).unwrap_err();
        assert_eq!(err.to_string(), "failed to open config file");
    }

    #[test]
    fn rejects_zero_workers() {
        let config = Config {
            workers: WorkerCounts {
                writers: 0,
                readers: 0,
                random_io: 0,
            },
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn rejects_zero_block_size() {
        let mut config = Config::default();
        config.reader.block_size = ByteSize::b(0);
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn rejects_inverted_pause_bounds() {
        let mut config = Config::default();
        config.random_io.min_pause = Duration::from_millis(5);
        config.random_io.max_pause = Duration::from_millis(1);
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn rejects_zero_duration() {
        let config = Config {
            duration: Duration::ZERO,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }
}
