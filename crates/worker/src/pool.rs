//! The Worker Loop — a pool of long-lived routines that claim, dispatch,
//! and heartbeat job runs (spec §4.5 "Worker Loop").

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use wf_core::{Clock, JobId, JobRun, JobStatus, WorkerId};
use wf_engine::{EngineClock, HandlerRegistry, Notifier, RuntimeContext};
use wf_store::{FieldUpdate, JobRecordStore};

use crate::config::WorkerConfig;

/// Handle to a running pool (spec §4.5 "A pool of long-lived worker
/// routines"). Dropping this without calling [`Self::shutdown`] leaves the
/// routines running in the background; `shutdown` is the cooperative,
/// awaitable way to stop them once their current turn finishes.
pub struct WorkerPoolHandle {
    shutdown_tx: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl WorkerPoolHandle {
    /// Signal every routine to stop after its current turn and wait for
    /// them to exit. A turn already in flight always runs to its natural
    /// yield point first — no row is left mid-turn by this call (spec §5
    /// "at most one worker holds a given row's lock at any time").
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        for task in self.tasks {
            let _ = task.await;
        }
    }
}

/// Drives the claim/dispatch/heartbeat cycle described in spec §4.5.
///
/// A `WorkerPool` never forces a terminal state on a row (spec §4.5 step 6
/// "The worker does not force a terminal state") — the handler, via
/// [`RuntimeContext`], is solely responsible for eventually calling
/// progress/fail/succeed/wait-for-user, or yielding the row back to
/// `queued`. The pool's own responsibility stops at dispatch, heartbeat,
/// and converting a handler panic into a terminal failure (spec §4.5 step 5
/// "On panic, fail the row with a generic error; never propagate").
pub struct WorkerPool {
    store: Arc<dyn JobRecordStore>,
    registry: Arc<HandlerRegistry>,
    notifier: Arc<dyn Notifier>,
    clock: EngineClock,
    config: WorkerConfig,
}

impl WorkerPool {
    pub fn new(
        store: Arc<dyn JobRecordStore>,
        registry: Arc<HandlerRegistry>,
        notifier: Arc<dyn Notifier>,
        clock: EngineClock,
        config: WorkerConfig,
    ) -> Self {
        Self { store, registry, notifier, clock, config }
    }

    /// Start `config.worker_count` long-lived worker routines (spec §4.5).
    pub fn spawn(self: Arc<Self>) -> WorkerPoolHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let worker_count = self.config.worker_count.max(1);
        tracing::info!(worker_count, "worker pool starting");
        let tasks = (0..worker_count)
            .map(|_| {
                let pool = Arc::clone(&self);
                let mut shutdown_rx = shutdown_rx.clone();
                tokio::spawn(async move { pool.run_worker(&mut shutdown_rx).await })
            })
            .collect();
        WorkerPoolHandle { shutdown_tx, tasks }
    }

    async fn run_worker(&self, shutdown_rx: &mut watch::Receiver<bool>) {
        let worker_id = WorkerId::new();
        tracing::info!(%worker_id, "worker routine started");
        loop {
            if *shutdown_rx.borrow() {
                break;
            }
            match self.store.claim_next(&worker_id, self.config.stale_lock_after).await {
                Some(job) => self.run_turn(&worker_id, job).await,
                None => {
                    let Ok(idle) = self.config.idle_poll.to_std() else { break };
                    tokio::select! {
                        _ = tokio::time::sleep(idle) => {}
                        _ = shutdown_rx.changed() => {}
                    }
                }
            }
        }
        tracing::info!(%worker_id, "worker routine stopped");
    }

    /// Claim → context → handler dispatch → heartbeat (spec §4.5 steps 2-6).
    async fn run_turn(&self, worker_id: &WorkerId, job: JobRun) {
        let job_id = job.id;
        let job_type = job.job_type.clone();
        tracing::debug!(%worker_id, %job_id, %job_type, "claimed job run");

        let ctx = RuntimeContext::new(
            Arc::clone(&self.store),
            Arc::clone(&self.notifier),
            self.clock.clone(),
            job,
        );

        let Some(handler) = self.registry.get(&job_type) else {
            tracing::warn!(%job_id, %job_type, "handler_missing");
            ctx.fail("handler_missing", &format!("no handler registered for job_type {job_type:?}"))
                .await;
            return;
        };

        let heartbeat = self.spawn_heartbeat(job_id);

        match AssertUnwindSafe(handler.run(&ctx)).catch_unwind().await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                // Informational only (spec §4.3 "Handler contract") — the
                // handler owns its own terminal transition, or none at all.
                tracing::debug!(%job_id, %job_type, error = %e, "handler turn returned an error");
            }
            Err(_panic) => {
                tracing::error!(%job_id, %job_type, "handler panicked");
                ctx.fail("panic", "handler panicked").await;
            }
        }

        heartbeat.abort();
    }

    /// Periodically renews `heartbeat_at` until aborted (spec §4.5 step 4).
    /// Guarded the same way [`RuntimeContext`] guards terminal writes: a
    /// canceled/succeeded/failed row stops accepting heartbeats.
    fn spawn_heartbeat(&self, job_id: JobId) -> JoinHandle<()> {
        let Ok(interval) = self.config.heartbeat_interval.to_std() else {
            return tokio::spawn(async {});
        };
        let store = Arc::clone(&self.store);
        let clock = self.clock.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await; // first tick fires immediately; claim_next already stamped heartbeat_at
            loop {
                ticker.tick().await;
                let now = clock.now();
                store
                    .update_fields_unless_status(
                        &job_id,
                        &[JobStatus::Canceled, JobStatus::Succeeded, JobStatus::Failed],
                        FieldUpdate::new().heartbeat_at(now),
                    )
                    .await;
            }
        })
    }
}

#[cfg(test)]
#[path = "pool_tests.rs"]
mod tests;
