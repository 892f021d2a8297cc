//! Error type for reductions.
//!
//! Cell operations cannot fail; everything that can go wrong happens while
//! validating a reduction or running its tasks.

use thiserror::Error;

/// Errors returned by [`RangeReducer`](super::RangeReducer).
#[derive(Debug, Error)]
pub enum ReduceError {
    /// The worker count is zero or does not fit in the value type.
    ///
    /// Reported before any task is spawned; the accumulator is untouched.
    #[error("invalid worker count: {worker_count}")]
    InvalidWorkerCount {
        /// The rejected worker count.
        worker_count: usize,
    },

    /// `hi - lo` overflows the value type (e.g. `[-128, 127]` in `i8`).
    #[error("range [{lo}, {hi}) is too wide for its integer type")]
    RangeTooWide {
        /// Lower bound, formatted.
        lo: String,
        /// Upper bound, formatted.
        hi: String,
    },

    /// The OS refused to start a task thread.
    #[error("failed to spawn task for slice {slice}: {source}")]
    Spawn {
        /// Index of the slice whose task could not be started.
        slice: usize,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A task panicked. Reported once every task has been joined.
    #[error("task for slice {slice} panicked: {message}")]
    TaskPanicked {
        /// Index of the first slice whose task panicked.
        slice: usize,
        /// The panic payload, if it was a string.
        message: String,
    },
}

/// Result type for reductions.
pub type Result<T> = std::result::Result<T, ReduceError>;
