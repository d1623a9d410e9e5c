//! Document Viewer Scheduler Library
//!
//! Viewport snapshots and best-first decode scheduling.
//!
//! Decode candidates are ordered by proximity to the viewport center; the
//! closest one is submitted first and the rest follow. Requests are stamped
//! with the current bitmap generation so outdated results can be dropped when
//! they arrive.
//!
//! # Example
//!
//! ```
//! use docview_cache::{BitmapContext, BitmapPool};
//! use docview_scheduler::{
//!     DecodeCandidate, DecodeRequest, DecodeScheduler, DecodeWorkerPool, PageRange, TileId,
//!     ViewRect, ViewState, WorkerPoolConfig,
//! };
//! use std::sync::Arc;
//!
//! let context = BitmapContext::with_ram_pool(8);
//! let decode = Arc::new(|request: &DecodeRequest, context: &BitmapContext| {
//!     Some(context.pool().acquire(request.width, request.height))
//! });
//! let (workers, outcomes) =
//!     DecodeWorkerPool::new(decode, context.clone(), WorkerPoolConfig::new(1)).unwrap();
//! let workers = Arc::new(workers);
//! let mut scheduler = DecodeScheduler::new(workers.clone());
//!
//! let view = ViewState::probe(1.0, ViewRect::new(0.0, 0.0, 800.0, 600.0), context.generation())
//!     .with_visible(PageRange::new(0, 0), 1, 1);
//! let tile = DecodeCandidate::new(TileId::root(0), ViewRect::new(0.0, 0.0, 64.0, 64.0));
//! scheduler.schedule(&view, vec![tile]).unwrap();
//!
//! let outcome = outcomes.recv().unwrap();
//! assert!(scheduler.complete(outcome.request.tile, outcome.request.generation));
//! ```

mod error;
mod priority;
mod scheduler;
mod viewport;
mod worker;

// Re-export public API
pub use error::ScheduleError;
pub use priority::{best_candidate, compare_candidates, DecodeCandidate, TileId};
pub use scheduler::{
    DecodeBackend, DecodeOutcome, DecodeRequest, DecodeScheduler, ScheduleReport, SchedulerStats,
};
pub use viewport::{union_of, PageRange, ViewRect, ViewState};
pub use worker::{DecodeFn, DecodeWorkerPool, WorkerPoolConfig};
