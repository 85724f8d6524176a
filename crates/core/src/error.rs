//! Crate-local error types shared by the rest of the workspace.

use thiserror::Error;

/// Errors raised while constructing or parsing core domain values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("unrecognized job status: {0:?}")]
    UnknownStatus(String),

    #[error("unrecognized stage status: {0:?}")]
    UnknownStageStatus(String),

    #[error("unrecognized stage mode: {0:?}")]
    UnknownStageMode(String),
}
