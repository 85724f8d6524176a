//! Per-execution capability object (spec §4.2 "Runtime Context").
//!
//! The only sanctioned path by which a handler mutates a job run's
//! terminal/progress state. All methods are guarded with
//! `update_fields_unless_status(.., [canceled], ..)` and therefore silently
//! no-op on a canceled row, per spec §4.2 and §5 "Cancellation semantics".

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use wf_core::{Clock, JobId, JobRun, JobStatus};
use wf_store::{FieldUpdate, JobRecordStore};
use wf_wire::WaitpointEnvelope;

use crate::clock::EngineClock;
use crate::notifier::Notifier;

pub struct RuntimeContext {
    store: Arc<dyn JobRecordStore>,
    notifier: Arc<dyn Notifier>,
    clock: EngineClock,
    job: Mutex<JobRun>,
    payload: Value,
}

impl RuntimeContext {
    pub fn new(
        store: Arc<dyn JobRecordStore>,
        notifier: Arc<dyn Notifier>,
        clock: EngineClock,
        job: JobRun,
    ) -> Self {
        let payload = job.payload.clone();
        Self { store, notifier, clock, job: Mutex::new(job), payload }
    }

    /// Typed payload access, never absent (spec §4.2 "Payload()").
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// `PayloadUUID(key)` — reads a string-valued key from the payload.
    pub fn payload_uuid(&self, key: &str) -> Option<String> {
        self.payload.get(key).and_then(Value::as_str).map(str::to_string)
    }

    pub fn job_id(&self) -> JobId {
        self.job.lock().id
    }

    pub fn owner(&self) -> String {
        self.job.lock().owner.clone()
    }

    /// Current wall-clock time as seen by this context's clock.
    pub fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.now()
    }

    /// Handle to the underlying store. Engine-internal: the DAG Engine needs
    /// this to look up child rows during polling (spec §4.4.3) — a
    /// capability beyond the fixed Runtime Context method set in §4.2, but
    /// required to realize child polling without duplicating the store
    /// handle across every call site.
    pub fn store(&self) -> &Arc<dyn JobRecordStore> {
        &self.store
    }

    /// A clone of the in-memory row as last observed by this context.
    pub fn snapshot(&self) -> JobRun {
        self.job.lock().clone()
    }

    async fn refresh(&self) {
        if let Some(row) = self.store.get_by_id(&self.job_id()).await {
            *self.job.lock() = row;
        }
    }

    /// `IsCanceled` probe (spec §4.4.2 step 3).
    pub async fn is_canceled(&self) -> bool {
        match self.store.get_by_id(&self.job_id()).await {
            Some(row) => row.status == JobStatus::Canceled,
            None => false,
        }
    }

    /// `Progress(stage, pct, msg)`. `pct` is NOT clamped here — clamping is
    /// the orchestrator's job before calling (spec §4.2).
    pub async fn progress(&self, stage: &str, pct: u8, msg: &str) {
        let id = self.job_id();
        let now = self.clock.now();
        let updates = FieldUpdate::new().stage(stage).progress(pct).message(msg).heartbeat_at(now);
        if !self.store.update_fields_unless_status(&id, &[JobStatus::Canceled], updates).await {
            return;
        }
        self.refresh().await;
        let owner = self.owner();
        self.notifier.job_progress(&owner, &self.snapshot(), stage, pct, msg).await;
    }

    /// `Fail(stage, err)` — terminal.
    pub async fn fail(&self, stage: &str, err: &str) {
        let id = self.job_id();
        let now = self.clock.now();
        let updates = FieldUpdate::new()
            .status(JobStatus::Failed)
            .stage(stage)
            .error(err)
            .last_error_at(now)
            .clear_locked_at();
        if !self.store.update_fields_unless_status(&id, &[JobStatus::Canceled], updates).await {
            return;
        }
        self.refresh().await;
        let owner = self.owner();
        self.notifier.job_failed(&owner, &self.snapshot(), stage, err).await;
    }

    /// `Succeed(finalStage, result)` — terminal.
    pub async fn succeed(&self, final_stage: &str, result: Value) {
        let id = self.job_id();
        let updates = FieldUpdate::new()
            .status(JobStatus::Succeeded)
            .stage(final_stage)
            .progress(100)
            .result(result)
            .clear_locked_at();
        if !self.store.update_fields_unless_status(&id, &[JobStatus::Canceled], updates).await {
            return;
        }
        self.refresh().await;
        let owner = self.owner();
        self.notifier.job_done(&owner, &self.snapshot()).await;
    }

    /// `WaitForUser(...)` — writes a Waitpoint Envelope, pauses the row.
    /// `pct` is clamped to <= 99 here (spec §4.2).
    pub async fn wait_for_user(&self, stage: &str, pct: u8, msg: &str, envelope: &WaitpointEnvelope) {
        let id = self.job_id();
        let clamped = pct.min(99);
        let updates = FieldUpdate::new()
            .status(JobStatus::WaitingUser)
            .stage(stage)
            .progress(clamped)
            .message(msg)
            .result(envelope.to_result())
            .clear_locked_at();
        if !self.store.update_fields_unless_status(&id, &[JobStatus::Canceled], updates).await {
            return;
        }
        self.refresh().await;
        let owner = self.owner();
        self.notifier.job_progress(&owner, &self.snapshot(), stage, clamped, msg).await;
    }

    /// `Update(updates)` — low-level persistence for non-terminal writes
    /// (spec §4.2). Guarded the same way `progress`/`fail`/`succeed` are: a
    /// canceled row silently refuses the write (spec §3 invariant 2, §5 "a
    /// canceled row becomes inert"). Returns whether the write applied.
    pub async fn update(&self, updates: FieldUpdate) -> bool {
        let id = self.job_id();
        if !self.store.update_fields_unless_status(&id, &[JobStatus::Canceled], updates).await {
            return false;
        }
        self.refresh().await;
        true
    }
}

#[cfg(test)]
#[path = "runtime_context_tests.rs"]
mod tests;
