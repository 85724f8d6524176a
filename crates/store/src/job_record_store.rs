//! The Job Record Store abstraction (spec §4.1).

use async_trait::async_trait;
use chrono::Duration;
use wf_core::{JobId, JobRun, JobStatus, WorkerId};

use crate::field_update::FieldUpdate;

/// Repository abstraction over persisted job run rows.
///
/// `claim_next` and `update_fields_unless_status` MUST be linearizable per
/// row — at most one caller observes a successful claim or guarded update
/// for a given row at a time (spec §4.1, invariant 5).
#[async_trait]
pub trait JobRecordStore: Send + Sync + 'static {
    /// Persist a brand new row, as an external enqueuer or the Child
    /// Enqueuer would (spec §6 "Child Enqueuer contract": `Enqueue(...) ->
    /// row`). Not one of §4.1's four orchestrator-facing operations — those
    /// assume the row already exists — but required to realize the data
    /// model's "created queued by an external enqueuer" lifecycle step.
    async fn create(&self, job: JobRun) -> JobRun;

    /// Select one runnable row (`status=queued` and either unlocked or
    /// locked past `stale_lock_after`), mark it `running` and locked by
    /// `worker_id`, and return it. `None` if nothing is runnable.
    async fn claim_next(&self, worker_id: &WorkerId, stale_lock_after: Duration) -> Option<JobRun>;

    async fn get_by_id(&self, id: &JobId) -> Option<JobRun>;

    async fn get_by_ids(&self, ids: &[JobId]) -> Vec<JobRun>;

    /// Unconditional update.
    async fn update_fields(&self, id: &JobId, updates: FieldUpdate);

    /// Apply `updates` unless the row's current status is in `disallowed`.
    /// Returns whether the update applied. Used everywhere cancellation
    /// must be honored without a race (spec §4.1).
    async fn update_fields_unless_status(
        &self,
        id: &JobId,
        disallowed: &[JobStatus],
        updates: FieldUpdate,
    ) -> bool;

    /// Whether a non-terminal row already exists for this owner/job_type,
    /// optionally scoped to an entity. Used to avoid duplicate enqueues.
    async fn exists_runnable(
        &self,
        owner: &str,
        job_type: &str,
        entity_type: Option<&str>,
        entity_id: Option<&str>,
    ) -> bool;

    /// Whether any non-terminal row exists for the given entity, regardless
    /// of owner or job_type.
    async fn has_runnable_for_entity(&self, entity_type: &str, entity_id: &str) -> bool;
}

pub(crate) fn is_runnable(status: JobStatus) -> bool {
    !status.is_terminal()
}
