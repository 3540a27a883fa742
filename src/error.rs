//! Engine error taxonomy.
//!
//! Only argument and lifecycle failures are caller-visible. Algorithmic
//! anomalies (zero seeding weight, empty clusters) are corrected inline by
//! the engine and never surface here.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type EngineResult<T> = Result<T, EngineError>;

#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The start payload carried no samples at all.
    #[error("sample buffer is empty")]
    EmptySamples,

    /// The flat sample buffer cannot be split into whole RGB triples.
    #[error("sample buffer length {0} is not a multiple of 3")]
    RaggedSamples(usize),

    /// `k` is outside `1..=count` for the bounded working set.
    #[error("k must be between 1 and {max}, got {k}")]
    InvalidK { k: usize, max: usize },

    /// The iteration budget must allow at least one pass.
    #[error("max iterations must be at least 1, got {0}")]
    InvalidIterationBudget(usize),

    /// Every submission slot is taken: a run is already active or queued.
    #[error("a clustering run is already active")]
    Busy,

    /// The worker task has shut down; the handle is stale.
    #[error("engine worker is no longer running")]
    WorkerGone,
}
