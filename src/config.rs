//! Configuration types for urfs
//!
//! This module defines:
//! - CLI argument parsing using clap derive macros
//! - Runtime walk configuration with validation
//! - Path filter configuration

use crate::error::ConfigError;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

/// Maximum reasonable worker count
pub const MAX_WORKERS: usize = 16_384;

/// Bounds for the default worker count
const MIN_DEFAULT_WORKERS: usize = 256;
const MAX_DEFAULT_WORKERS: usize = 4_096;

/// Default workers per CPU; transforms are dominated by file I/O
const WORKERS_PER_CPU: usize = 256;

/// Default capacity of the path and result queues
pub const DEFAULT_QUEUE_SIZE: usize = 1_000;

/// Minimum queue size
pub const MIN_QUEUE_SIZE: usize = 1;

/// Default glob pattern (matches every name)
pub const DEFAULT_PATTERN: &str = "*";

/// Default fraction of files copied by `sample`
pub const DEFAULT_SAMPLE_FRACTION: f64 = 0.1;

/// Perform computations on files in a large directory
#[derive(Parser, Debug, Clone)]
#[command(
    name = "urfs",
    version,
    about = "Perform computations on files in a large directory",
    long_about = "Walks a directory tree with a bounded pool of workers and applies an\n\
                  operation to every matching regular file.\n\n\
                  Hidden files (names starting with '.' or '~') and symlinks are skipped.",
    after_help = "EXAMPLES:\n    \
        urfs sample /data/corpus /tmp/sample -s 0.05\n    \
        urfs -w 64 -m '*.json' sample /data/corpus /tmp/json-sample\n    \
        urfs -t 1m30s count /data/a /data/b"
)]
pub struct CliArgs {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,

    /// Limit the whole run, e.g. `30s`, `1m30s`, `500ms` (bare numbers are seconds)
    #[arg(short = 't', long, value_name = "DURATION", value_parser = parse_timeout)]
    pub timeout: Option<Duration>,

    /// Size of the worker pool
    #[arg(
        short = 'w',
        long,
        default_value_t = default_workers(),
        value_name = "NUM"
    )]
    pub workers: usize,

    /// Capacity of the path and result queues (controls memory usage)
    #[arg(long, default_value_t = DEFAULT_QUEUE_SIZE, value_name = "NUM")]
    pub queue_size: usize,

    /// Do not skip directories
    #[arg(short = 'D', long)]
    pub no_skip_dirs: bool,

    /// Do not skip hidden files
    #[arg(short = 'H', long)]
    pub no_skip_hidden: bool,

    /// Only process files whose name matches this glob pattern
    #[arg(short = 'm', long = "match", default_value = DEFAULT_PATTERN, value_name = "PATTERN")]
    pub pattern: String,

    /// Quiet mode - suppress progress output
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Verbose output (debug logging)
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

/// Subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Uniform random sample of files in a directory
    Sample {
        /// Directory to sample from
        #[arg(value_name = "SRC")]
        src: PathBuf,

        /// Directory to copy the sample into
        #[arg(value_name = "DST")]
        dst: PathBuf,

        /// Approximate fractional size of the sample
        #[arg(short = 's', long = "sample", default_value_t = DEFAULT_SAMPLE_FRACTION, value_name = "FRACTION")]
        fraction: f64,
    },

    /// Compute number of files and bytes per directory
    Count {
        /// Directories to count
        #[arg(value_name = "DIR", required = true)]
        dirs: Vec<PathBuf>,
    },
}

/// Default worker count: large, so that I/O-bound transforms keep the disk
/// busy, but well below typical thread and file descriptor limits
pub fn default_workers() -> usize {
    (num_cpus::get() * WORKERS_PER_CPU).clamp(MIN_DEFAULT_WORKERS, MAX_DEFAULT_WORKERS)
}

/// Parse a timeout given as a duration (`1m30s`) or as seconds (`2.5`)
pub fn parse_timeout(value: &str) -> Result<Duration, String> {
    if let Ok(secs) = value.parse::<f64>() {
        if !secs.is_finite() || secs < 0.0 {
            return Err(format!("invalid timeout '{}'", value));
        }
        return Ok(Duration::from_secs_f64(secs));
    }
    humantime::parse_duration(value).map_err(|e| format!("invalid timeout '{}': {}", value, e))
}

/// Which discovered entries are handed to the transform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterConfig {
    /// Skip names starting with `.` or `~`
    pub skip_hidden: bool,

    /// Never emit directory entries
    pub skip_dirs: bool,

    /// Glob pattern the base name must match
    pub pattern: String,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            skip_hidden: true,
            skip_dirs: true,
            pattern: DEFAULT_PATTERN.to_string(),
        }
    }
}

/// Validated runtime configuration
#[derive(Debug, Clone, PartialEq)]
pub struct WalkConfig {
    /// Number of worker threads
    pub workers: usize,

    /// Path queue capacity
    pub path_queue_size: usize,

    /// Result queue capacity
    pub result_queue_size: usize,

    /// Path filter
    pub filter: FilterConfig,

    /// Deadline for every walk run under one token, measured from when the
    /// token is installed (`init`, or `reset` with a new token)
    pub timeout: Option<Duration>,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            path_queue_size: DEFAULT_QUEUE_SIZE,
            result_queue_size: DEFAULT_QUEUE_SIZE,
            filter: FilterConfig::default(),
            timeout: None,
        }
    }
}

impl WalkConfig {
    /// Create and validate configuration from CLI arguments
    pub fn from_args(args: &CliArgs) -> Result<Self, ConfigError> {
        let timeout = match args.timeout {
            Some(timeout) if timeout.is_zero() => {
                return Err(ConfigError::InvalidTimeout {
                    secs: timeout.as_secs_f64(),
                })
            }
            timeout => timeout,
        };

        let config = Self {
            workers: args.workers,
            path_queue_size: args.queue_size,
            result_queue_size: args.queue_size,
            filter: FilterConfig {
                skip_hidden: !args.no_skip_hidden,
                skip_dirs: !args.no_skip_dirs,
                pattern: args.pattern.clone(),
            },
            timeout,
        };

        config.validate()?;
        Ok(config)
    }

    /// Builder-style worker count override
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Builder-style timeout override
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builder-style filter override
    pub fn with_filter(mut self, filter: FilterConfig) -> Self {
        self.filter = filter;
        self
    }

    /// Check the configuration for values the engine cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 || self.workers > MAX_WORKERS {
            return Err(ConfigError::InvalidWorkerCount {
                count: self.workers,
                max: MAX_WORKERS,
            });
        }

        for size in [self.path_queue_size, self.result_queue_size] {
            if size < MIN_QUEUE_SIZE {
                return Err(ConfigError::InvalidQueueSize {
                    size,
                    min: MIN_QUEUE_SIZE,
                });
            }
        }

        Ok(())
    }
}
