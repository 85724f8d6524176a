//! Worker Loop tuning knobs (spec §4.5 "Worker Loop"; ambient addition per
//! SPEC_FULL.md §2 "Configuration").

use chrono::Duration;

/// Pool size, idle poll cadence, stale-lock horizon, and heartbeat cadence
/// for a [`crate::pool::WorkerPool`] (spec §4.5, §4.1 invariant 1).
///
/// Built with explicit defaults and `wf_core::setters!`, in the style of
/// the teacher's `JobConfig`/`JobConfigBuilder`.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Number of concurrent worker routines in the pool (spec §4.5 "A pool
    /// of long-lived worker routines").
    pub worker_count: usize,
    /// Bounded sleep between claim attempts when nothing is runnable (spec
    /// §4.5 step 1 "On empty, wait (bounded sleep)").
    pub idle_poll: Duration,
    /// A row's `locked_at` older than this is treated as stale and
    /// reclaimable (spec §4.1 invariant 1).
    pub stale_lock_after: Duration,
    /// Cadence of the heartbeat ticker started for the duration of a turn
    /// (spec §4.5 step 4).
    pub heartbeat_interval: Duration,
}

impl WorkerConfig {
    pub fn builder() -> WorkerConfigBuilder {
        WorkerConfigBuilder {
            worker_count: 4,
            idle_poll: Duration::milliseconds(200),
            stale_lock_after: Duration::minutes(5),
            heartbeat_interval: Duration::seconds(15),
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

pub struct WorkerConfigBuilder {
    worker_count: usize,
    idle_poll: Duration,
    stale_lock_after: Duration,
    heartbeat_interval: Duration,
}

impl WorkerConfigBuilder {
    wf_core::setters! {
        set {
            worker_count: usize,
            idle_poll: Duration,
            stale_lock_after: Duration,
            heartbeat_interval: Duration,
        }
    }

    pub fn build(self) -> WorkerConfig {
        WorkerConfig {
            worker_count: self.worker_count,
            idle_poll: self.idle_poll,
            stale_lock_after: self.stale_lock_after,
            heartbeat_interval: self.heartbeat_interval,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
