//! Child Enqueuer — abstract sink that spawns a child job row under the
//! same store (spec §4.1 "Child Enqueuer", §6 "Child Enqueuer contract").

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use wf_core::{Clock, JobRun, JobRunConfig};
use wf_store::JobRecordStore;

/// `Enqueue(owner, job_type, entity_type?, entity_id?, payload) -> row`.
#[async_trait]
pub trait ChildEnqueuer: Send + Sync + 'static {
    async fn enqueue(
        &self,
        owner: &str,
        job_type: &str,
        entity_type: Option<&str>,
        entity_id: Option<&str>,
        payload: Value,
    ) -> JobRun;
}

/// The only production implementation: creates the child row directly in
/// the same [`JobRecordStore`] the parent is running under (spec §3
/// "Ownership" — "Child rows are referenced (by id) but not owned by the
/// parent").
pub struct StoreChildEnqueuer<C: Clock> {
    store: Arc<dyn JobRecordStore>,
    clock: C,
}

impl<C: Clock> StoreChildEnqueuer<C> {
    pub fn new(store: Arc<dyn JobRecordStore>, clock: C) -> Self {
        Self { store, clock }
    }
}

#[async_trait]
impl<C: Clock> ChildEnqueuer for StoreChildEnqueuer<C> {
    async fn enqueue(
        &self,
        owner: &str,
        job_type: &str,
        entity_type: Option<&str>,
        entity_id: Option<&str>,
        payload: Value,
    ) -> JobRun {
        let mut builder = JobRunConfig::builder(owner, job_type).payload(payload);
        if let Some(entity_type) = entity_type {
            builder = builder.entity_type(entity_type);
        }
        if let Some(entity_id) = entity_id {
            builder = builder.entity_id(entity_id);
        }
        let config = builder.build();
        let row = JobRun::new(config, &self.clock);
        tracing::debug!(child_id = %row.id, %job_type, %owner, "enqueuing child job");
        self.store.create(row).await
    }
}

#[cfg(test)]
#[path = "child_enqueuer_tests.rs"]
mod tests;
