//! Walk coordinator - owns the engine lifecycle
//!
//! The coordinator is responsible for:
//! - Allocating the path and result queues and the shared counters
//! - Starting the producer and the worker pool under one error group
//! - Collecting results on the calling thread
//! - Joining every participant before returning
//! - Recording elapsed time and the final walk state
//!
//! A walker is single-use per walk: `walk` is only valid from
//! [`WalkState::Idle`], and `reset` must be called before walking again.

use crate::config::WalkConfig;
use crate::error::{BoxError, Result, WalkerError, WorkerError};
use crate::walker::cancel::CancelToken;
use crate::walker::collector::collect;
use crate::walker::group::ErrorGroup;
use crate::walker::producer::produce;
use crate::walker::queue::{PathQueue, ResultQueue};
use crate::walker::stats::{ProgressHandle, WalkCounters, WalkStats};
use crate::walker::worker::{consume, panic_message, worker_name};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, ScopedJoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Name of the producer thread
const PRODUCER_NAME: &str = "walk-producer";

/// Lifecycle state of a walker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkState {
    /// Fresh queues and counters; ready to walk
    Idle,
    /// A walk is in flight
    Running,
    /// The last walk finished without error
    Completed,
    /// The last walk returned an error
    Failed,
}

impl WalkState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WalkState::Idle => "idle",
            WalkState::Running => "running",
            WalkState::Completed => "completed",
            WalkState::Failed => "failed",
        }
    }

    /// Check whether a walk has finished (successfully or not)
    pub fn is_terminal(&self) -> bool {
        matches!(self, WalkState::Completed | WalkState::Failed)
    }
}

impl fmt::Display for WalkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Concurrent filesystem walker
pub struct FsWalker {
    /// Configuration
    config: WalkConfig,

    /// Token every walk derives its own token from; carries the deadline
    cancel: CancelToken,

    /// Queue of discovered paths
    paths: PathQueue,

    /// Queue of transform results
    results: ResultQueue,

    /// Shared counters
    counters: Arc<WalkCounters>,

    /// Lifecycle state
    state: WalkState,
}

impl FsWalker {
    /// Create a walker with the default configuration
    pub fn init(cancel: CancelToken) -> Self {
        let config = WalkConfig::default();
        let cancel = install_token(&config, cancel);
        Self {
            paths: PathQueue::new(config.path_queue_size),
            results: ResultQueue::new(config.result_queue_size),
            counters: Arc::new(WalkCounters::default()),
            state: WalkState::Idle,
            config,
            cancel,
        }
    }

    /// Create a walker with a validated configuration
    pub fn with_config(config: WalkConfig, cancel: CancelToken) -> Result<Self> {
        config.validate()?;
        let cancel = install_token(&config, cancel);
        Ok(Self {
            paths: PathQueue::new(config.path_queue_size),
            results: ResultQueue::new(config.result_queue_size),
            counters: Arc::new(WalkCounters::default()),
            state: WalkState::Idle,
            config,
            cancel,
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &WalkConfig {
        &self.config
    }

    /// Change the configuration between walks.
    ///
    /// Queue sizes take effect at the next `reset`; the timeout takes effect
    /// the next time a token is installed.
    pub fn config_mut(&mut self) -> &mut WalkConfig {
        &mut self.config
    }

    /// Token the walks of this walker derive from
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Current lifecycle state
    pub fn state(&self) -> WalkState {
        self.state
    }

    /// Eligible paths discovered by the current or last walk
    pub fn paths(&self) -> u64 {
        self.counters.paths()
    }

    /// Results produced by the current or last walk
    pub fn results(&self) -> u64 {
        self.counters.results()
    }

    /// Wall-clock duration of the last walk
    pub fn duration(&self) -> Duration {
        self.counters.elapsed()
    }

    /// Statistics of the last walk
    pub fn stats(&self) -> WalkStats {
        WalkStats {
            paths: self.paths(),
            results: self.results(),
            duration: self.duration(),
            completed: self.state == WalkState::Completed,
        }
    }

    /// Handle for reading live progress from another thread.
    ///
    /// The handle stays valid across resets.
    pub fn progress_handle(&self) -> ProgressHandle {
        ProgressHandle {
            counters: Arc::clone(&self.counters),
            path_stats: self.paths.stats(),
            result_stats: self.results.stats(),
            total_workers: self.config.workers,
        }
    }

    /// Apply `transform` to every eligible file under `root`.
    ///
    /// The transform returns `Ok(Some(result))` to emit a countable result,
    /// `Ok(None)` when the path was processed but produced nothing to count,
    /// or an error, which aborts the whole walk. It may be called from many
    /// threads at once.
    ///
    /// Returns the first error raised by any participant after every
    /// participant has stopped. Counters are a lower bound when an error is
    /// returned.
    pub fn walk<F, E>(&mut self, root: impl AsRef<Path>, transform: F) -> Result<()>
    where
        F: Fn(&Path) -> std::result::Result<Option<PathBuf>, E> + Sync,
        E: Into<BoxError>,
    {
        self.ensure_idle()?;
        self.config.validate()?;

        let (path_tx, path_rx) = self.paths.split().ok_or(WalkerError::InvalidState {
            expected: WalkState::Idle.as_str(),
            actual: "drained",
        })?;
        let (result_tx, result_rx) = self.results.split().ok_or(WalkerError::InvalidState {
            expected: WalkState::Idle.as_str(),
            actual: "drained",
        })?;

        let root = root.as_ref();
        let started = Instant::now();
        self.state = WalkState::Running;
        self.counters.start(started);

        info!(
            root = %root.display(),
            workers = self.config.workers,
            pattern = %self.config.filter.pattern,
            "Starting walk"
        );

        let group = ErrorGroup::new(self.cancel.child());
        let counters: &WalkCounters = &self.counters;
        let filter = &self.config.filter;
        let transform = &transform;
        let workers = self.config.workers;

        thread::scope(|scope| {
            let group = &group;
            let mut handles: Vec<(String, ScopedJoinHandle<'_, ()>)> =
                Vec::with_capacity(workers + 1);

            let producer = thread::Builder::new()
                .name(PRODUCER_NAME.to_string())
                .spawn_scoped(scope, move || {
                    group.settle(produce(root, filter, path_tx, counters, group.token()))
                });
            match producer {
                Ok(handle) => handles.push((PRODUCER_NAME.to_string(), handle)),
                Err(e) => group.record(spawn_failed(PRODUCER_NAME.to_string(), e)),
            }

            for id in 0..workers {
                if group.has_failed() {
                    break;
                }

                let name = worker_name(id);
                let paths = path_rx.clone();
                let results = result_tx.clone();
                let spawned = thread::Builder::new()
                    .name(name.clone())
                    .spawn_scoped(scope, move || {
                        let outcome =
                            consume(id, paths, results, transform, counters, group.token());
                        group.settle(outcome.map(|_| ()))
                    });

                match spawned {
                    Ok(handle) => handles.push((name, handle)),
                    Err(e) => group.record(spawn_failed(name, e)),
                }
            }

            debug!(threads = handles.len(), "Walk participants spawned");

            // Only the workers may hold these now, so the result queue closes
            // once the last worker is done
            drop(path_rx);
            drop(result_tx);

            let collected = collect(result_rx, counters, group);
            debug!(collected, "Results collected");

            for (name, handle) in handles {
                if let Err(payload) = handle.join() {
                    group.record(
                        WorkerError::Panicked {
                            role: name,
                            message: panic_message(payload.as_ref()),
                        }
                        .into(),
                    );
                }
            }
        });

        let duration = started.elapsed();
        self.counters.finish(duration);

        let outcome = group.into_result();
        match &outcome {
            Ok(()) => {
                self.state = WalkState::Completed;
                info!(
                    paths = self.counters.paths(),
                    results = self.counters.results(),
                    duration_ms = duration.as_millis() as u64,
                    "Walk completed"
                );
            }
            Err(e) => {
                self.state = WalkState::Failed;
                warn!(
                    error = %e,
                    paths = self.counters.paths(),
                    results = self.counters.results(),
                    duration_ms = duration.as_millis() as u64,
                    "Walk failed"
                );
            }
        }

        outcome
    }

    /// Fail with `InvalidState` unless a walk may start now
    pub(crate) fn ensure_idle(&self) -> Result<()> {
        if self.state != WalkState::Idle {
            return Err(WalkerError::InvalidState {
                expected: WalkState::Idle.as_str(),
                actual: self.state.as_str(),
            });
        }
        Ok(())
    }

    /// Prepare the walker for another walk.
    ///
    /// Allocates fresh queues and zeroes the counters, keeping the
    /// configuration. Without a new token the original token (and its
    /// deadline) is kept.
    pub fn reset(&mut self, cancel: Option<CancelToken>) {
        if let Some(cancel) = cancel {
            self.cancel = install_token(&self.config, cancel);
        }

        self.paths.reset(self.config.path_queue_size);
        self.results.reset(self.config.result_queue_size);
        self.counters.reset();
        self.state = WalkState::Idle;

        debug!("Walker reset");
    }
}

impl Default for FsWalker {
    fn default() -> Self {
        Self::init(CancelToken::new())
    }
}

/// Apply the configured timeout to a caller-supplied token
fn install_token(config: &WalkConfig, cancel: CancelToken) -> CancelToken {
    match config.timeout {
        Some(timeout) => cancel.with_timeout(timeout),
        None => cancel,
    }
}

fn spawn_failed(role: String, e: std::io::Error) -> WalkerError {
    WorkerError::SpawnFailed {
        role,
        reason: e.to_string(),
    }
    .into()
}
