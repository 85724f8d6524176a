use super::*;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use serde_json::json;
use wf_core::test_support::queued_job_run;
use wf_engine::{Handler, RecordingNotifier};
use wf_store::InMemoryJobStore;

struct Succeeds;

#[async_trait]
impl Handler for Succeeds {
    fn job_type(&self) -> &str {
        "demo.succeed"
    }

    async fn run(&self, ctx: &RuntimeContext) -> Result<(), String> {
        ctx.succeed("done", json!({"ok": true})).await;
        Ok(())
    }
}

struct Panics;

#[async_trait]
impl Handler for Panics {
    fn job_type(&self) -> &str {
        "demo.panic"
    }

    async fn run(&self, _ctx: &RuntimeContext) -> Result<(), String> {
        panic!("boom");
    }
}

struct Slow;

#[async_trait]
impl Handler for Slow {
    fn job_type(&self) -> &str {
        "demo.slow"
    }

    async fn run(&self, ctx: &RuntimeContext) -> Result<(), String> {
        tokio::time::sleep(StdDuration::from_millis(200)).await;
        ctx.succeed("done", json!({})).await;
        Ok(())
    }
}

fn test_config() -> WorkerConfig {
    WorkerConfig::builder().worker_count(1).idle_poll(chrono::Duration::milliseconds(5)).build()
}

fn test_pool(store: Arc<dyn JobRecordStore>, registry: Arc<HandlerRegistry>, config: WorkerConfig) -> Arc<WorkerPool> {
    Arc::new(WorkerPool::new(
        store,
        registry,
        Arc::new(RecordingNotifier::new()),
        EngineClock::system(),
        config,
    ))
}

async fn wait_for_terminal(store: &Arc<dyn JobRecordStore>, id: JobId) -> JobRun {
    for _ in 0..200 {
        if let Some(row) = store.get_by_id(&id).await {
            if row.status.is_terminal() {
                return row;
            }
        }
        tokio::time::sleep(StdDuration::from_millis(5)).await;
    }
    panic!("job {id} did not reach a terminal status in time");
}

#[tokio::test]
async fn claims_and_runs_a_registered_handler_to_success() {
    let store: Arc<dyn JobRecordStore> = Arc::new(InMemoryJobStore::new());
    let (row, _clock) = queued_job_run("demo.succeed");
    let row = store.create(row).await;
    let registry = Arc::new(HandlerRegistry::new());
    registry.register(Arc::new(Succeeds)).expect("register");

    let pool = test_pool(store.clone(), registry, test_config());
    let handle = pool.spawn();

    let updated = wait_for_terminal(&store, row.id).await;
    assert_eq!(updated.status, JobStatus::Succeeded);
    assert_eq!(updated.progress, 100);

    handle.shutdown().await;
}

#[tokio::test]
async fn missing_handler_fails_with_handler_missing_stage() {
    let store: Arc<dyn JobRecordStore> = Arc::new(InMemoryJobStore::new());
    let (row, _clock) = queued_job_run("demo.unregistered");
    let row = store.create(row).await;
    let registry = Arc::new(HandlerRegistry::new());

    let pool = test_pool(store.clone(), registry, test_config());
    let handle = pool.spawn();

    let updated = wait_for_terminal(&store, row.id).await;
    assert_eq!(updated.status, JobStatus::Failed);
    assert_eq!(updated.stage, "handler_missing");

    handle.shutdown().await;
}

#[tokio::test]
async fn a_panicking_handler_fails_the_row_instead_of_crashing_the_worker() {
    let store: Arc<dyn JobRecordStore> = Arc::new(InMemoryJobStore::new());
    let (row, _clock) = queued_job_run("demo.panic");
    let row = store.create(row).await;
    let registry = Arc::new(HandlerRegistry::new());
    registry.register(Arc::new(Panics)).expect("register");

    let pool = test_pool(store.clone(), registry, test_config());
    let handle = pool.spawn();

    let updated = wait_for_terminal(&store, row.id).await;
    assert_eq!(updated.status, JobStatus::Failed);
    assert_eq!(updated.stage, "panic");

    handle.shutdown().await;
}

#[tokio::test]
async fn heartbeat_advances_while_a_turn_is_in_flight() {
    let store: Arc<dyn JobRecordStore> = Arc::new(InMemoryJobStore::new());
    let (row, _clock) = queued_job_run("demo.slow");
    let row = store.create(row).await;
    let registry = Arc::new(HandlerRegistry::new());
    registry.register(Arc::new(Slow)).expect("register");

    let config = WorkerConfig::builder()
        .worker_count(1)
        .idle_poll(chrono::Duration::milliseconds(5))
        .heartbeat_interval(chrono::Duration::milliseconds(20))
        .build();
    let pool = test_pool(store.clone(), registry, config);
    let handle = pool.spawn();

    tokio::time::sleep(StdDuration::from_millis(30)).await;
    let first = store.get_by_id(&row.id).await.expect("row exists").heartbeat_at;

    tokio::time::sleep(StdDuration::from_millis(100)).await;
    let second = store.get_by_id(&row.id).await.expect("row exists").heartbeat_at;

    assert!(second > first, "heartbeat should advance while the turn is still in flight");

    wait_for_terminal(&store, row.id).await;
    handle.shutdown().await;
}

#[tokio::test]
async fn shutdown_stops_idle_routines_promptly() {
    let store: Arc<dyn JobRecordStore> = Arc::new(InMemoryJobStore::new());
    let registry = Arc::new(HandlerRegistry::new());
    let pool = test_pool(store, registry, test_config());
    let handle = pool.spawn();

    tokio::time::timeout(StdDuration::from_secs(2), handle.shutdown())
        .await
        .expect("shutdown should complete promptly when nothing is runnable");
}

#[tokio::test]
async fn only_one_worker_in_a_pool_claims_a_single_row() {
    let store: Arc<dyn JobRecordStore> = Arc::new(InMemoryJobStore::new());
    let (row, _clock) = queued_job_run("demo.succeed");
    let row = store.create(row).await;
    let registry = Arc::new(HandlerRegistry::new());
    registry.register(Arc::new(Succeeds)).expect("register");

    let config = WorkerConfig::builder().worker_count(4).idle_poll(chrono::Duration::milliseconds(5)).build();
    let pool = test_pool(store.clone(), registry, config);
    let handle = pool.spawn();

    let updated = wait_for_terminal(&store, row.id).await;
    assert_eq!(updated.status, JobStatus::Succeeded);

    handle.shutdown().await;
}
