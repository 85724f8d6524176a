#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! wf-wire: the external, bit-exact JSON shapes the orchestrator reads and
//! writes through a job run's `result` field (spec §6 "External Interfaces").
//!
//! This crate owns both halves of that contract: the Waitpoint Envelope
//! (spec §3, §6) and the Orchestrator State (spec §3, §4.4.8) together with
//! its stage sub-state. `wf-engine` operates on these types directly rather
//! than maintaining a parallel domain model — they already are the
//! persisted shape.

pub mod error;
pub mod job_run_wire;
pub mod orchestrator_state;
pub mod stage_state;
pub mod waitpoint;

pub use error::WireError;
pub use job_run_wire::JobRunWire;
pub use orchestrator_state::{OrchestratorState, StageSubState, StateEncoding};
pub use stage_state::{StageMode, StageStatus};
pub use waitpoint::{WaitpointAction, WaitpointEnvelope, WaitpointSpec, WaitpointState};
