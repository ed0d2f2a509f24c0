//! Walk counters, final statistics and live progress snapshots

use crate::walker::queue::QueueStats;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Counters shared by every participant of a walk
#[derive(Debug, Default)]
pub struct WalkCounters {
    /// Eligible paths discovered by the producer
    paths: AtomicU64,

    /// Non-empty results counted by the collector
    results: AtomicU64,

    /// Workers currently running a transform
    active_workers: AtomicUsize,

    /// Start of the walk in flight, if any
    started: Mutex<Option<Instant>>,

    /// Duration of the last finished walk
    duration: Mutex<Duration>,
}

impl WalkCounters {
    pub fn record_path(&self) {
        self.paths.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_result(&self) {
        self.results.fetch_add(1, Ordering::Relaxed);
    }

    pub fn paths(&self) -> u64 {
        self.paths.load(Ordering::Relaxed)
    }

    pub fn results(&self) -> u64 {
        self.results.load(Ordering::Relaxed)
    }

    pub fn active_workers(&self) -> usize {
        self.active_workers.load(Ordering::Relaxed)
    }

    pub(crate) fn begin_work(&self) {
        self.active_workers.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn end_work(&self) {
        self.active_workers.fetch_sub(1, Ordering::SeqCst);
    }

    pub(crate) fn start(&self, at: Instant) {
        *self.started.lock() = Some(at);
        *self.duration.lock() = Duration::ZERO;
    }

    pub(crate) fn finish(&self, duration: Duration) {
        *self.started.lock() = None;
        *self.duration.lock() = duration;
    }

    /// Time spent so far by the walk in flight, or by the last finished walk
    pub fn elapsed(&self) -> Duration {
        match *self.started.lock() {
            Some(started) => started.elapsed(),
            None => *self.duration.lock(),
        }
    }

    pub(crate) fn reset(&self) {
        self.paths.store(0, Ordering::Relaxed);
        self.results.store(0, Ordering::Relaxed);
        self.active_workers.store(0, Ordering::SeqCst);
        *self.started.lock() = None;
        *self.duration.lock() = Duration::ZERO;
    }
}

/// RAII guard marking a worker as busy with a transform
pub struct WorkGuard<'a> {
    counters: &'a WalkCounters,
}

impl<'a> WorkGuard<'a> {
    /// Create a new work guard (marks worker as active)
    pub fn new(counters: &'a WalkCounters) -> Self {
        counters.begin_work();
        Self { counters }
    }
}

impl<'a> Drop for WorkGuard<'a> {
    fn drop(&mut self) {
        self.counters.end_work();
    }
}

/// Result of a finished walk
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WalkStats {
    /// Eligible paths discovered
    pub paths: u64,

    /// Non-empty results produced
    pub results: u64,

    /// Wall-clock time of the walk
    pub duration: Duration,

    /// Whether the walk completed (vs failed or was cancelled)
    pub completed: bool,
}

impl WalkStats {
    /// Share of discovered paths that produced a result, in percent
    pub fn percent(&self) -> f64 {
        if self.paths == 0 {
            0.0
        } else {
            self.results as f64 / self.paths as f64 * 100.0
        }
    }

    /// Calculate paths per second rate
    pub fn paths_per_second(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.paths as f64 / secs
        } else {
            0.0
        }
    }
}

/// Progress information for display
#[derive(Debug, Clone, Default)]
pub struct WalkProgress {
    pub paths: u64,
    pub results: u64,
    pub queued_paths: u64,
    pub queued_results: u64,
    pub active_workers: usize,
    pub total_workers: usize,
    pub elapsed: Duration,
}

impl WalkProgress {
    /// Calculate paths per second rate
    pub fn paths_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.paths as f64 / secs
        } else {
            0.0
        }
    }
}

/// Cloneable view of a walker's counters, readable from any thread
#[derive(Clone)]
pub struct ProgressHandle {
    pub(crate) counters: Arc<WalkCounters>,
    pub(crate) path_stats: Arc<QueueStats>,
    pub(crate) result_stats: Arc<QueueStats>,
    pub(crate) total_workers: usize,
}

impl ProgressHandle {
    /// Take a snapshot of the walk in flight
    pub fn snapshot(&self) -> WalkProgress {
        WalkProgress {
            paths: self.counters.paths(),
            results: self.counters.results(),
            queued_paths: self.path_stats.depth(),
            queued_results: self.result_stats.depth(),
            active_workers: self.counters.active_workers(),
            total_workers: self.total_workers,
            elapsed: self.counters.elapsed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walk_stats_default() {
        let stats = WalkStats::default();
        assert_eq!(stats.paths, 0);
        assert_eq!(stats.results, 0);
        assert_eq!(stats.percent(), 0.0);
        assert!(!stats.completed);
    }

    #[test]
    fn test_walk_stats_rates() {
        let stats = WalkStats {
            paths: 1000,
            results: 250,
            duration: Duration::from_secs(10),
            completed: true,
        };
        assert!((stats.percent() - 25.0).abs() < 1e-9);
        assert!((stats.paths_per_second() - 100.0).abs() < 0.1);
    }

    #[test]
    fn test_walk_progress_rate() {
        let progress = WalkProgress {
            paths: 500,
            elapsed: Duration::from_secs(5),
            ..Default::default()
        };
        assert!((progress.paths_per_second() - 100.0).abs() < 0.1);
    }

    #[test]
    fn test_counters_and_guard() {
        let counters = WalkCounters::default();
        counters.record_path();
        counters.record_path();
        counters.record_result();

        {
            let _guard = WorkGuard::new(&counters);
            assert_eq!(counters.active_workers(), 1);
        }
        assert_eq!(counters.active_workers(), 0);

        assert_eq!(counters.paths(), 2);
        assert_eq!(counters.results(), 1);

        counters.finish(Duration::from_millis(5));
        assert_eq!(counters.elapsed(), Duration::from_millis(5));

        counters.reset();
        assert_eq!(counters.paths(), 0);
        assert_eq!(counters.results(), 0);
        assert_eq!(counters.elapsed(), Duration::ZERO);
    }
}
