//! Error types for urfs
//!
//! This module defines the error hierarchy for the walk engine:
//! - Traversal errors from the directory listing
//! - Glob pattern errors from the path filter
//! - Transform errors from the caller-supplied per-path function
//! - Cancellation (explicit or deadline)
//! - Configuration and worker thread errors
//!
//! Any of these aborts the whole walk. The coordinator reports exactly one
//! of them: the first one observed.

use std::path::PathBuf;
use thiserror::Error;

/// Boxed error returned by a transform
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level error type for the urfs walk engine
#[derive(Error, Debug)]
pub enum WalkerError {
    /// The directory listing failed (permissions, I/O, missing root)
    #[error("Failed to traverse '{}': {source}", path.display())]
    Traversal {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// The configured glob pattern is malformed
    #[error("Invalid match pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    /// The caller-supplied transform failed for a path
    #[error("Transform failed for '{}': {source}", path.display())]
    Transform {
        path: PathBuf,
        #[source]
        source: BoxError,
    },

    /// The walk was cancelled before it completed
    #[error("Walk cancelled")]
    Cancelled,

    /// The configured deadline elapsed before the walk completed
    #[error("Walk deadline exceeded")]
    DeadlineExceeded,

    /// The walker was used outside of its lifecycle
    #[error("Walker is {actual}, expected {expected}: call reset() before walking again")]
    InvalidState {
        expected: &'static str,
        actual: &'static str,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Worker/concurrency errors
    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    /// I/O errors (file operations, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl WalkerError {
    /// Wrap a transform failure for the given path
    pub fn transform(path: impl Into<PathBuf>, source: impl Into<BoxError>) -> Self {
        WalkerError::Transform {
            path: path.into(),
            source: source.into(),
        }
    }

    /// Check if this error only reports that the walk was interrupted.
    ///
    /// Cancellation errors are superseded by any concrete error that
    /// caused the cancellation in the first place.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, WalkerError::Cancelled | WalkerError::DeadlineExceeded)
    }
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid worker count
    #[error("Invalid worker count {count}: must be between 1 and {max}")]
    InvalidWorkerCount { count: usize, max: usize },

    /// Invalid queue size
    #[error("Invalid queue size {size}: must be at least {min}")]
    InvalidQueueSize { size: usize, min: usize },

    /// Invalid timeout
    #[error("Invalid timeout {secs}s: must be a positive duration")]
    InvalidTimeout { secs: f64 },

    /// Invalid sample fraction
    #[error("Invalid sample size {fraction}: must be between 0.0 and 1.0")]
    InvalidSampleFraction { fraction: f64 },
}

/// Worker thread errors
#[derive(Error, Debug)]
pub enum WorkerError {
    /// Worker panicked
    #[error("{role} panicked: {message}")]
    Panicked { role: String, message: String },

    /// Worker thread could not be spawned
    #[error("Failed to spawn {role}: {reason}")]
    SpawnFailed { role: String, reason: String },
}

/// Result type alias for WalkerError
pub type Result<T> = std::result::Result<T, WalkerError>;
