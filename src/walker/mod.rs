//! Concurrent walk engine
//!
//! One producer discovers eligible paths, a fixed pool of workers applies
//! the caller's transform, and a collector counts the results. Two bounded
//! queues connect them, and one cancellation token reaches every blocking
//! operation.
//!
//! # Architecture
//!
//! ```text
//!                     ┌─────────────────────────┐
//!                     │        Producer         │
//!                     │  walkdir + PathFilter   │
//!                     └───────────┬─────────────┘
//!                                 │ PathQueue (bounded)
//!       ┌─────────────────────────┼─────────────────────────┐
//!       │                         │                         │
//! ┌─────▼─────┐             ┌─────▼─────┐             ┌─────▼─────┐
//! │  Worker 1 │             │  Worker 2 │             │  Worker N │
//! │ transform │             │ transform │             │ transform │
//! └─────┬─────┘             └─────┬─────┘             └─────┬─────┘
//!       └─────────────────────────┼─────────────────────────┘
//!                                 │ ResultQueue (bounded)
//!                     ┌───────────▼─────────────┐
//!                     │        Collector        │
//!                     │   (calling thread)      │
//!                     └─────────────────────────┘
//! ```

pub mod cancel;
pub mod collector;
pub mod coordinator;
pub mod filter;
pub mod group;
pub mod producer;
pub mod queue;
pub mod stats;
pub mod worker;

pub use cancel::CancelToken;
pub use coordinator::{FsWalker, WalkState};
pub use filter::{is_hidden, PathFilter};
pub use stats::{ProgressHandle, WalkProgress, WalkStats};
