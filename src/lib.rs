//! urfs - Concurrent Directory Walk Engine
//!
//! Applies an arbitrary function to every eligible regular file under a
//! directory tree, with bounded concurrency, deadline-based cancellation and
//! aggregate progress accounting.
//!
//! # Features
//!
//! - **Bounded Concurrency**: a fixed pool of worker threads pulls paths from
//!   a bounded queue, so memory stays flat on very large trees.
//!
//! - **Cancellation**: every blocking operation watches one token that can
//!   be cancelled explicitly or expire at a deadline.
//!
//! - **Fail Fast**: the first traversal or transform error aborts the whole
//!   walk and is the error reported to the caller.
//!
//! - **Consumers**: random sampling of a tree into another directory, and
//!   per-directory file and byte counts.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     FsWalker::walk(root, f)                     │
//! └─────────────────────────────┬───────────────────────────────────┘
//!                               │ thread::scope
//!                               ▼
//! ┌──────────────┐   PathQueue   ┌──────────────┐  ResultQueue  ┌───────────┐
//! │   Producer   │──────────────▶│ Worker 1..N  │──────────────▶│ Collector │
//! │  (walkdir)   │   (bounded)   │   f(path)    │   (bounded)   │ (caller)  │
//! └──────────────┘               └──────────────┘               └───────────┘
//!         ▲                              ▲                             │
//!         └──────── CancelToken ─────────┴──── ErrorGroup ◀────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::path::{Path, PathBuf};
//! use urfs::{CancelToken, FsWalker};
//!
//! let mut walker = FsWalker::init(CancelToken::new());
//! walker.walk("/data", |path: &Path| -> std::io::Result<Option<PathBuf>> {
//!     Ok(Some(path.to_path_buf()))
//! })?;
//! println!("{} of {} files", walker.results(), walker.paths());
//! # Ok::<(), urfs::WalkerError>(())
//! ```

pub mod config;
pub mod count;
pub mod error;
pub mod fsutil;
pub mod progress;
pub mod sample;
pub mod walker;

pub use config::{CliArgs, Command, FilterConfig, WalkConfig};
pub use count::DirSize;
pub use error::{BoxError, Result, WalkerError};
pub use sample::SampleReport;
pub use walker::{CancelToken, FsWalker, ProgressHandle, WalkProgress, WalkState, WalkStats};
