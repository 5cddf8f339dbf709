use thiserror::Error;

use crate::task::TaskStatus;

pub type Result<T> = std::result::Result<T, Error>;

/// Failure classes for one counting run.
///
/// `Detection` is recoverable: the runner absorbs it for a bounded number of
/// consecutive frames before escalating to `Input`. Everything else aborts
/// the run (or, for `Config`, prevents it from starting).
#[derive(Debug, Error)]
pub enum Error {
    #[error("input error: {0}")]
    Input(String),

    #[error("output error: {0}")]
    Output(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("detection failed: {0}")]
    Detection(String),

    #[error("task store error: {0}")]
    Storage(String),

    #[error("invalid task transition: {from:?} -> {to:?}")]
    InvalidTransition { from: TaskStatus, to: TaskStatus },
}
