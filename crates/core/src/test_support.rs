//! Shared test fixtures exposed to other crates via the `test-support` feature.

use crate::clock::FakeClock;
use crate::job::{JobRun, JobRunConfig};

/// Build a fresh queued job run plus the fake clock it was stamped with.
pub fn queued_job_run(job_type: &str) -> (JobRun, FakeClock) {
    let clock = FakeClock::new();
    let config = JobRunConfig::builder("test-owner", job_type).build();
    (JobRun::new(config, &clock), clock)
}
