//! Orchestrator State — the per-workflow snapshot persisted inside a job
//! run's `result` (spec §3 "Orchestrator State", §4.4.8 "Result encoding").

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::stage_state::{StageMode, StageStatus};

/// Linkage and progress of one stage (spec §3 "Stage Sub-State").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageSubState {
    pub name: String,
    pub mode: StageMode,
    pub status: StageStatus,
    #[serde(default)]
    pub attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    #[serde(default)]
    pub outputs: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_job_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_job_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_job_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_progress: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_run_at: Option<DateTime<Utc>>,
}

impl StageSubState {
    /// A freshly created, never-run sub-state (spec §4.4.2 step 5 "ensure
    /// its sub-state exists").
    pub fn pending(name: impl Into<String>, mode: StageMode) -> Self {
        Self {
            name: name.into(),
            mode,
            status: StageStatus::Pending,
            attempts: 0,
            started_at: None,
            finished_at: None,
            last_error: None,
            outputs: Value::Object(Map::new()),
            child_job_id: None,
            child_job_type: None,
            child_job_status: None,
            child_progress: None,
            child_message: None,
            child_result: None,
            next_run_at: None,
        }
    }

    /// Drop all linkage to a child row (spec §4.4.3 "canceled" case — "reset
    /// the stage to pending, clear child_job_id").
    pub fn clear_child_linkage(&mut self) {
        self.child_job_id = None;
        self.child_job_type = None;
        self.child_job_status = None;
        self.child_progress = None;
        self.child_message = None;
        self.child_result = None;
    }

    /// Merge freshly produced outputs into the accumulated map rather than
    /// replacing it (spec §3 "outputs ... merged, not replaced").
    pub fn merge_outputs(&mut self, produced: Value) {
        let Value::Object(produced) = produced else { return };
        if !self.outputs.is_object() {
            self.outputs = Value::Object(Map::new());
        }
        if let Value::Object(existing) = &mut self.outputs {
            for (k, v) in produced {
                existing.insert(k, v);
            }
        }
    }
}

/// Which encoder produced (or should parse) an encoded Orchestrator State.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateEncoding {
    /// `{version, stages, wait_until, last_progress, meta}`.
    Default,
    /// Same keys, but `meta`'s entries are hoisted to the top level instead
    /// of nested under a `meta` key.
    Flat,
}

const KNOWN_KEYS: [&str; 4] = ["version", "stages", "wait_until", "last_progress"];

/// Persisted per-workflow snapshot (spec §3 "Orchestrator State").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorState {
    pub version: u32,
    #[serde(default)]
    pub stages: BTreeMap<String, StageSubState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait_until: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_progress: u8,
    #[serde(default)]
    pub meta: Value,
}

impl Default for OrchestratorState {
    fn default() -> Self {
        Self {
            version: 1,
            stages: BTreeMap::new(),
            wait_until: None,
            last_progress: 0,
            meta: Value::Object(Map::new()),
        }
    }
}

impl OrchestratorState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch or lazily create a stage's sub-state (spec §4.4.2 step 5).
    pub fn ensure_stage(&mut self, name: &str, mode: StageMode) -> &mut StageSubState {
        self.stages
            .entry(name.to_string())
            .or_insert_with(|| StageSubState::pending(name, mode))
    }

    /// Monotonic progress clamp (spec invariant 1, §9 "Monotonic progress").
    pub fn advance_progress(&mut self, candidate: u8) {
        if candidate > self.last_progress {
            self.last_progress = candidate;
        }
    }

    /// Encode this state as a JSON value, per the chosen encoder (spec §4.4.8).
    pub fn encode(&self, encoding: StateEncoding) -> Value {
        let mut map = Map::new();
        map.insert("version".to_string(), Value::from(self.version));
        map.insert(
            "stages".to_string(),
            serde_json::to_value(&self.stages).unwrap_or_else(|_| Value::Object(Map::new())),
        );
        if let Some(wait_until) = self.wait_until {
            map.insert(
                "wait_until".to_string(),
                serde_json::to_value(wait_until).unwrap_or(Value::Null),
            );
        }
        map.insert("last_progress".to_string(), Value::from(self.last_progress));
        match encoding {
            StateEncoding::Default => {
                map.insert("meta".to_string(), self.meta.clone());
            }
            StateEncoding::Flat => {
                if let Value::Object(meta) = &self.meta {
                    for (key, value) in meta {
                        map.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        Value::Object(map)
    }

    /// Decode a previously-encoded value in either encoding (spec §9 Open
    /// Question: both flat and wrapped encodings MUST be accepted on load).
    pub fn decode(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let version = obj.get("version")?.as_u64()? as u32;
        let stages = match obj.get("stages") {
            Some(v) => serde_json::from_value(v.clone()).ok()?,
            None => BTreeMap::new(),
        };
        let wait_until = obj
            .get("wait_until")
            .and_then(|v| serde_json::from_value::<DateTime<Utc>>(v.clone()).ok());
        let last_progress = obj.get("last_progress").and_then(Value::as_u64).unwrap_or(0) as u8;
        let meta = match obj.get("meta") {
            Some(meta) => meta.clone(),
            None => {
                let hoisted: Map<String, Value> = obj
                    .iter()
                    .filter(|(key, _)| !KNOWN_KEYS.contains(&key.as_str()))
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect();
                Value::Object(hoisted)
            }
        };
        Some(Self { version, stages, wait_until, last_progress, meta })
    }

    /// Load state from a job run's `result` (spec §4.4.2 step 2: "accept
    /// either a raw Orchestrator State or a wrapped object with key
    /// 'orchestrator'").
    pub fn from_result(result: &Value) -> Option<Self> {
        match result.get("orchestrator") {
            Some(wrapped) => Self::decode(wrapped),
            None => Self::decode(result),
        }
    }

    /// Same as [`Self::from_result`], but surfaces the failure instead of
    /// discarding it.
    pub fn try_from_result(result: &Value) -> Result<Self, crate::error::WireError> {
        Self::from_result(result).ok_or(crate::error::WireError::MalformedOrchestratorState)
    }

    /// Canonical persisted shape: wrapped, default-encoded (spec §9 Open
    /// Question resolution — see DESIGN.md).
    pub fn to_result(&self) -> Value {
        let mut wrapper = Map::new();
        wrapper.insert("orchestrator".to_string(), self.encode(StateEncoding::Default));
        Value::Object(wrapper)
    }
}

#[cfg(test)]
#[path = "orchestrator_state_tests.rs"]
mod tests;
