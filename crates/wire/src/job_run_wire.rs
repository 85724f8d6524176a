//! External status DTO for inspecting a job run from outside the process
//! (spec §6 "External Interfaces", ambient addition per SPEC_FULL.md §6).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use wf_core::{JobId, JobRun, JobStatus};

/// A flattened, serializable view of one [`JobRun`], the analogue of the
/// teacher's `JobStatusEntry`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRunWire {
    pub id: JobId,
    pub owner: String,
    pub job_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    pub status: JobStatus,
    pub stage: String,
    pub progress: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Elapsed time since the row was created, in milliseconds.
    pub elapsed_ms: i64,
    /// Time since the row's most recent heartbeat, in milliseconds; `None`
    /// if it has never been locked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub since_heartbeat_ms: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobRunWire {
    /// Project a [`JobRun`] as observed at `now`, the same way the teacher's
    /// `JobStatusEntry::from_job` derives elapsed/activity fields rather
    /// than storing them.
    pub fn from_job_run(row: &JobRun, now: DateTime<Utc>) -> Self {
        Self {
            id: row.id,
            owner: row.owner.clone(),
            job_type: row.job_type.clone(),
            entity_type: row.entity_type.clone(),
            entity_id: row.entity_id.clone(),
            status: row.status,
            stage: row.stage.clone(),
            progress: row.progress,
            message: row.message.clone(),
            error: row.error.clone(),
            elapsed_ms: (now - row.created_at).num_milliseconds().max(0),
            since_heartbeat_ms: row.heartbeat_at.map(|h| (now - h).num_milliseconds().max(0)),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[cfg(test)]
#[path = "job_run_wire_tests.rs"]
mod tests;
