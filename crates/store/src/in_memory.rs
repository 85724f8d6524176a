//! A process-local [`JobRecordStore`] backed by a locked hash map. Suitable
//! for tests and single-process deployments; not durable across restarts.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Duration;
use parking_lot::Mutex;
use wf_core::{Clock, JobId, JobRun, JobStatus, SystemClock, WorkerId};

use crate::field_update::FieldUpdate;
use crate::job_record_store::{is_runnable, JobRecordStore};

struct Rows {
    by_id: HashMap<JobId, JobRun>,
    insertion_order: Vec<JobId>,
}

impl Rows {
    fn new() -> Self {
        Self { by_id: HashMap::new(), insertion_order: Vec::new() }
    }
}

/// In-memory [`JobRecordStore`], generic over the clock so tests can drive
/// time deterministically (see `wf-core`'s `FakeClock`).
pub struct InMemoryJobStore<C: Clock = SystemClock> {
    rows: Mutex<Rows>,
    clock: C,
}

impl InMemoryJobStore<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for InMemoryJobStore<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> InMemoryJobStore<C> {
    pub fn with_clock(clock: C) -> Self {
        Self { rows: Mutex::new(Rows::new()), clock }
    }

    /// Seed the store with a job run, as an external enqueuer would.
    pub fn insert(&self, job: JobRun) {
        let mut rows = self.rows.lock();
        if !rows.by_id.contains_key(&job.id) {
            rows.insertion_order.push(job.id);
        }
        rows.by_id.insert(job.id, job);
    }

    /// Direct read without going through the trait, for test assertions.
    pub fn snapshot(&self, id: &JobId) -> Option<JobRun> {
        self.rows.lock().by_id.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn apply(job: &mut JobRun, updates: FieldUpdate, now: chrono::DateTime<chrono::Utc>) {
        if let Some(v) = updates.status {
            job.status = v;
        }
        if let Some(v) = updates.stage {
            job.stage = v;
        }
        if let Some(v) = updates.progress {
            job.progress = v;
        }
        if let Some(v) = updates.message {
            job.message = v;
        }
        if let Some(v) = updates.error {
            job.error = v;
        }
        if let Some(v) = updates.result {
            job.result = v;
        }
        if let Some(v) = updates.metadata {
            job.metadata = v;
        }
        if let Some(v) = updates.stage_history {
            job.stage_history = v;
        }
        if let Some(v) = updates.locked_at {
            job.locked_at = v;
        }
        if let Some(v) = updates.heartbeat_at {
            job.heartbeat_at = v;
        }
        if let Some(v) = updates.last_error_at {
            job.last_error_at = v;
        }
        job.updated_at = now;
    }
}

#[async_trait]
impl<C: Clock> JobRecordStore for InMemoryJobStore<C> {
    async fn create(&self, job: JobRun) -> JobRun {
        self.insert(job.clone());
        job
    }

    async fn claim_next(&self, worker_id: &WorkerId, stale_lock_after: Duration) -> Option<JobRun> {
        let now = self.clock.now();
        let mut rows = self.rows.lock();
        let claim_id = rows
            .insertion_order
            .iter()
            .find(|id| {
                rows.by_id.get(*id).is_some_and(|job| job.is_claimable(now, stale_lock_after))
            })
            .copied()?;
        let job = rows.by_id.get_mut(&claim_id)?;
        job.status = JobStatus::Running;
        job.locked_at = Some(now);
        job.heartbeat_at = Some(now);
        job.updated_at = now;
        tracing::debug!(job_id = %claim_id, %worker_id, "claimed job run");
        Some(job.clone())
    }

    async fn get_by_id(&self, id: &JobId) -> Option<JobRun> {
        self.rows.lock().by_id.get(id).cloned()
    }

    async fn get_by_ids(&self, ids: &[JobId]) -> Vec<JobRun> {
        let rows = self.rows.lock();
        ids.iter().filter_map(|id| rows.by_id.get(id).cloned()).collect()
    }

    async fn update_fields(&self, id: &JobId, updates: FieldUpdate) {
        let now = self.clock.now();
        let mut rows = self.rows.lock();
        if let Some(job) = rows.by_id.get_mut(id) {
            Self::apply(job, updates, now);
        }
    }

    async fn update_fields_unless_status(
        &self,
        id: &JobId,
        disallowed: &[JobStatus],
        updates: FieldUpdate,
    ) -> bool {
        let now = self.clock.now();
        let mut rows = self.rows.lock();
        match rows.by_id.get_mut(id) {
            Some(job) if disallowed.contains(&job.status) => {
                tracing::debug!(job_id = %id, status = %job.status, "guarded update refused");
                false
            }
            Some(job) => {
                Self::apply(job, updates, now);
                true
            }
            None => false,
        }
    }

    async fn exists_runnable(
        &self,
        owner: &str,
        job_type: &str,
        entity_type: Option<&str>,
        entity_id: Option<&str>,
    ) -> bool {
        let rows = self.rows.lock();
        rows.by_id.values().any(|job| {
            job.owner == owner
                && job.job_type == job_type
                && is_runnable(job.status)
                && job.entity_type.as_deref() == entity_type
                && job.entity_id.as_deref() == entity_id
        })
    }

    async fn has_runnable_for_entity(&self, entity_type: &str, entity_id: &str) -> bool {
        let rows = self.rows.lock();
        rows.by_id.values().any(|job| {
            is_runnable(job.status)
                && job.entity_type.as_deref() == Some(entity_type)
                && job.entity_id.as_deref() == Some(entity_id)
        })
    }
}

#[cfg(test)]
#[path = "in_memory_tests.rs"]
mod tests;
