use super::*;
use crate::clock::FakeClock;
use chrono::Duration;

#[test]
fn new_job_run_starts_queued_and_unlocked() {
    let clock = FakeClock::new();
    let config = JobRunConfig::builder("acme", "demo.workflow").build();
    let job = JobRun::new(config, &clock);

    assert_eq!(job.status, JobStatus::Queued);
    assert!(job.locked_at.is_none());
    assert_eq!(job.progress, 0);
    assert_eq!(job.created_at, job.updated_at);
}

#[test]
fn builder_carries_entity_and_payload_through() {
    let config = JobRunConfig::builder("acme", "demo.workflow")
        .entity_type("document")
        .entity_id("doc-1")
        .payload(serde_json::json!({"k": 1}))
        .build();

    assert_eq!(config.entity_type.as_deref(), Some("document"));
    assert_eq!(config.entity_id.as_deref(), Some("doc-1"));
    assert_eq!(config.payload, serde_json::json!({"k": 1}));
}

#[test]
fn is_claimable_when_unlocked() {
    let job = JobRun::builder().status(JobStatus::Queued).build();
    let now = job.created_at;
    assert!(job.is_claimable(now, Duration::seconds(30)));
}

#[test]
fn is_claimable_false_when_not_queued() {
    let job = JobRun::builder().status(JobStatus::Running).build();
    let now = job.created_at;
    assert!(!job.is_claimable(now, Duration::seconds(30)));
}

#[test]
fn is_claimable_false_for_fresh_lock() {
    let now = chrono::Utc::now();
    let job = JobRun::builder().status(JobStatus::Queued).locked_at(now).build();
    assert!(!job.is_claimable(now, Duration::seconds(30)));
}

#[test]
fn is_claimable_true_for_stale_lock() {
    let locked_at = chrono::Utc::now();
    let now = locked_at + Duration::seconds(31);
    let job = JobRun::builder().status(JobStatus::Queued).locked_at(locked_at).build();
    assert!(job.is_claimable(now, Duration::seconds(30)));
}

#[test]
fn is_claimable_exactly_at_horizon_is_claimable() {
    let locked_at = chrono::Utc::now();
    let now = locked_at + Duration::seconds(30);
    let job = JobRun::builder().status(JobStatus::Queued).locked_at(locked_at).build();
    assert!(job.is_claimable(now, Duration::seconds(30)));
}

#[test]
fn is_terminal_matches_status() {
    let job = JobRun::builder().status(JobStatus::Succeeded).build();
    assert!(job.is_terminal());
    let job = JobRun::builder().status(JobStatus::WaitingUser).build();
    assert!(!job.is_terminal());
}

#[test]
fn push_stage_history_closes_previous_entry() {
    let mut job = JobRun::builder().build();
    let t0 = chrono::Utc::now();
    job.push_stage_history("fetch", t0);
    assert_eq!(job.stage_history.len(), 1);
    assert!(job.stage_history[0].left_at.is_none());

    let t1 = t0 + Duration::seconds(5);
    job.push_stage_history("transform", t1);
    assert_eq!(job.stage_history.len(), 2);
    assert_eq!(job.stage_history[0].left_at, Some(t1));
    assert!(job.stage_history[1].left_at.is_none());
}

#[test]
fn finish_stage_history_records_outcome_once() {
    let mut job = JobRun::builder().build();
    let t0 = chrono::Utc::now();
    job.push_stage_history("fetch", t0);

    let t1 = t0 + Duration::seconds(1);
    job.finish_stage_history("succeeded", t1);
    assert_eq!(job.stage_history[0].left_at, Some(t1));
    assert_eq!(job.stage_history[0].outcome.as_deref(), Some("succeeded"));

    // A second finish call on an already-closed entry is a no-op.
    let t2 = t1 + Duration::seconds(1);
    job.finish_stage_history("ignored", t2);
    assert_eq!(job.stage_history[0].left_at, Some(t1));
}

#[test]
fn serde_roundtrip_preserves_all_fields() {
    let job = JobRun::builder()
        .status(JobStatus::WaitingUser)
        .message("waiting on human")
        .result(serde_json::json!({"waitpoint": {"kind": "toy.confirm"}}))
        .build();
    let json = serde_json::to_string(&job).expect("serialize");
    let back: JobRun = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back.status, job.status);
    assert_eq!(back.message, job.message);
    assert_eq!(back.result, job.result);
}
