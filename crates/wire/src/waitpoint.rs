//! Waitpoint Envelope — the bit-exact JSON shape a `waiting_user` row carries
//! in `result` (spec §3 "Waitpoint Envelope", §6 "Waitpoint Envelope JSON shape").

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An advertised UI affordance. Informational only — the orchestrator never
/// interprets `token`, it is opaque to the stage that emitted the pause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitpointAction {
    pub id: String,
    pub label: String,
    pub token: String,
    pub variant: String,
}

/// The producer-authored half of the envelope: what is being waited on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaitpointSpec {
    pub version: u32,
    /// Opaque tag naming a registered interpreter config. The orchestrator
    /// never branches on this value — it only ever round-trips it.
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<String>,
    pub blocking: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_seq: Option<i64>,
    #[serde(default)]
    pub actions: Vec<WaitpointAction>,
}

impl WaitpointSpec {
    /// A blocking waitpoint of the given kind with no actions yet attached.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            version: 1,
            kind: kind.into(),
            step: None,
            blocking: true,
            thread_id: None,
            min_seq: None,
            actions: Vec::new(),
        }
    }

    pub fn with_step(mut self, step: impl Into<String>) -> Self {
        self.step = Some(step.into());
        self
    }

    pub fn with_actions(mut self, actions: Vec<WaitpointAction>) -> Self {
        self.actions = actions;
        self
    }
}

/// The consumer-mutated half of the envelope. A stage that emits the pause
/// MUST NOT touch this after creation — only the waitpoint interpreter
/// pipeline (external to this crate, spec §1 "Out of scope") may mutate it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct WaitpointState {
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_user_message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_user_seq_handled: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_guess: Option<String>,
    #[serde(default)]
    pub attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_case: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_confidence: Option<f64>,
}

impl WaitpointState {
    pub fn initial() -> Self {
        Self { version: 1, ..Self::default() }
    }
}

/// A serialized value in `result` encoding "paused awaiting external input"
/// plus the resume contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaitpointEnvelope {
    pub waitpoint: WaitpointSpec,
    pub state: WaitpointState,
    #[serde(default)]
    pub data: Value,
}

impl WaitpointEnvelope {
    pub fn new(spec: WaitpointSpec, state: WaitpointState, data: Value) -> Self {
        Self { waitpoint: spec, state, data }
    }

    /// Parse a job run's `result` value as a Waitpoint Envelope, if it is one.
    pub fn from_result(result: &Value) -> Option<Self> {
        serde_json::from_value(result.clone()).ok()
    }

    /// Same as [`Self::from_result`], but surfaces the failure instead of
    /// discarding it.
    pub fn try_from_result(result: &Value) -> Result<Self, crate::error::WireError> {
        Self::from_result(result).ok_or(crate::error::WireError::MalformedWaitpointEnvelope)
    }

    pub fn to_result(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
#[path = "waitpoint_tests.rs"]
mod tests;
