//! Job run identifier and record (spec §3 "Job Run").

use crate::clock::Clock;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::status::JobStatus;

crate::define_id! {
    /// Unique identifier for a job run.
    pub struct JobId("job-");
}

crate::define_id! {
    /// Unique identifier for a worker process/task claiming job rows.
    pub struct WorkerId("wrk-");
}

/// One entry in a job run's stage history (ambient addition, spec §3
/// supplemental note — purely observational, never read back by the engine).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageHistoryEntry {
    pub stage: String,
    pub entered_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
}

/// Configuration for creating a new job run.
#[derive(Debug, Clone)]
pub struct JobRunConfig {
    pub id: JobId,
    pub owner: String,
    pub job_type: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<String>,
    pub payload: Value,
    pub metadata: Value,
}

impl JobRunConfig {
    pub fn builder(owner: impl Into<String>, job_type: impl Into<String>) -> JobRunConfigBuilder {
        JobRunConfigBuilder {
            id: JobId::new(),
            owner: owner.into(),
            job_type: job_type.into(),
            entity_type: None,
            entity_id: None,
            payload: Value::Null,
            metadata: Value::Null,
        }
    }
}

pub struct JobRunConfigBuilder {
    id: JobId,
    owner: String,
    job_type: String,
    entity_type: Option<String>,
    entity_id: Option<String>,
    payload: Value,
    metadata: Value,
}

impl JobRunConfigBuilder {
    pub fn id(mut self, id: JobId) -> Self {
        self.id = id;
        self
    }

    crate::setters! {
        set {
            payload: Value,
            metadata: Value,
        }
        option {
            entity_type: String,
            entity_id: String,
        }
    }

    pub fn build(self) -> JobRunConfig {
        JobRunConfig {
            id: self.id,
            owner: self.owner,
            job_type: self.job_type,
            entity_type: self.entity_type,
            entity_id: self.entity_id,
            payload: self.payload,
            metadata: self.metadata,
        }
    }
}

/// A single durable execution of a named `job_type` (spec §3 "Job Run").
///
/// This is the row the store persists. `result` holds either an opaque
/// handler-defined output, or — for DAG-orchestrated workflows — the
/// Orchestrator State or a Waitpoint Envelope (both defined in `wf-wire`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRun {
    pub id: JobId,
    pub owner: String,
    pub job_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    pub payload: Value,
    pub status: JobStatus,
    #[serde(default)]
    pub stage: String,
    #[serde(default)]
    pub progress: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub result: Value,
    #[serde(default)]
    pub metadata: Value,
    #[serde(default)]
    pub stage_history: Vec<StageHistoryEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heartbeat_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobRun {
    /// Create a new job run, queued and unlocked, as an external enqueuer would.
    pub fn new(config: JobRunConfig, clock: &impl Clock) -> Self {
        let now = clock.now();
        Self {
            id: config.id,
            owner: config.owner,
            job_type: config.job_type,
            entity_type: config.entity_type,
            entity_id: config.entity_id,
            payload: config.payload,
            status: JobStatus::Queued,
            stage: String::new(),
            progress: 0,
            message: None,
            error: None,
            result: Value::Null,
            metadata: config.metadata,
            stage_history: Vec::new(),
            locked_at: None,
            heartbeat_at: None,
            last_error_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Invariant 3: terminal statuses never transition out.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Invariant 1: a row is claimable only if `queued` and the lock is
    /// either absent or older than `stale_lock_after`.
    pub fn is_claimable(&self, now: DateTime<Utc>, stale_lock_after: chrono::Duration) -> bool {
        if !self.status.is_claimable() {
            return false;
        }
        match self.locked_at {
            None => true,
            Some(locked_at) => now - locked_at >= stale_lock_after,
        }
    }

    /// Push a new stage history entry, closing out the previous one if still open.
    pub fn push_stage_history(&mut self, stage: &str, now: DateTime<Utc>) {
        if let Some(last) = self.stage_history.last_mut() {
            if last.left_at.is_none() {
                last.left_at = Some(now);
            }
        }
        self.stage_history.push(StageHistoryEntry {
            stage: stage.to_string(),
            entered_at: now,
            left_at: None,
            outcome: None,
        });
    }

    /// Close the current stage history entry with an outcome label.
    pub fn finish_stage_history(&mut self, outcome: &str, now: DateTime<Utc>) {
        if let Some(last) = self.stage_history.last_mut() {
            if last.left_at.is_none() {
                last.left_at = Some(now);
                last.outcome = Some(outcome.to_string());
            }
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
crate::builder! {
    pub struct JobRunBuilder => JobRun {
        into {
            owner: String = "test-owner",
            job_type: String = "test.job",
            stage: String = "",
        }
        set {
            payload: Value = Value::Null,
            status: JobStatus = JobStatus::Queued,
            progress: u8 = 0,
            result: Value = Value::Null,
            metadata: Value = Value::Null,
            stage_history: Vec<StageHistoryEntry> = Vec::new(),
        }
        option {
            entity_type: String = None,
            entity_id: String = None,
            message: String = None,
            error: String = None,
            locked_at: DateTime<Utc> = None,
            heartbeat_at: DateTime<Utc> = None,
            last_error_at: DateTime<Utc> = None,
        }
        computed {
            id: JobId = JobId::new(),
            created_at: DateTime<Utc> = Utc::now(),
            updated_at: DateTime<Utc> = Utc::now(),
        }
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
