use std::io;

use thiserror::Error;

/// Errors raised by the decode scheduler and worker pool
#[derive(Debug, Error)]
pub enum ScheduleError {
    /// `schedule` was called with nothing to decode; callers skip the call instead
    #[error("decode scheduling requires at least one candidate tile")]
    EmptyCandidates,

    /// A worker thread could not be started
    #[error("failed to spawn decode worker: {0}")]
    Spawn(#[from] io::Error),
}
