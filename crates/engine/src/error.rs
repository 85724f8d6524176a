//! Errors surfaced by the DAG Engine and its supporting registries
//! (spec §7 "Error Handling Design").

use thiserror::Error;

/// Validation and configuration failures (spec §7 "Validation"/"Configuration").
///
/// Both kinds are terminal and never retried — they indicate a malformed
/// stage list or a misconfigured handler, not a transient stage failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("duplicate stage name: {0:?}")]
    DuplicateStageName(String),

    #[error("stage {stage:?} depends on unknown stage {dep:?}")]
    UnknownDependency { stage: String, dep: String },

    #[error("cycle detected among stages: {0:?}")]
    CycleDetected(Vec<String>),

    #[error("stage {0:?} is in waiting_child but declared inline")]
    InlineStageWaitingOnChild(String),

    #[error("stage {0:?} observed in an unknown status")]
    UnknownStageStatus(String),

    #[error("no child enqueuer configured for child stage {0:?}")]
    MissingChildEnqueuer(String),

    #[error("child stage {stage:?} has no job_type")]
    MissingChildJobType { stage: String },

    #[error("child stage {stage:?} has no owner and the parent has none either")]
    MissingChildOwner { stage: String },

    #[error("no handler registered for job_type {0:?}")]
    HandlerMissing(String),

    #[error("handler type {0:?} is already registered")]
    DuplicateHandler(String),

    #[error("handler job_type must not be empty")]
    EmptyHandlerType,
}
