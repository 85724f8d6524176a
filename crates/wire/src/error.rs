//! Errors surfaced when a job run's `result` does not parse as an expected
//! wire shape.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WireError {
    #[error("result is not a well-formed waitpoint envelope")]
    MalformedWaitpointEnvelope,

    #[error("result is not a well-formed orchestrator state")]
    MalformedOrchestratorState,
}
