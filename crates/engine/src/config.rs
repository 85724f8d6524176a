//! DAG Engine tuning knobs (spec §4.4, §5 "Timeouts", §9 "Design Notes";
//! ambient addition per SPEC_FULL.md §2 "Configuration").

use chrono::Duration;

/// Poll cadence, liveness, and stall thresholds for one [`crate::dag::DagEngine`].
///
/// Built with explicit defaults and `wf_core::setters!`, in the style of the
/// teacher's `JobConfig`/`JobConfigBuilder`.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Floor for the global wait-gate sleep (spec §4.4.2 step 4).
    pub min_poll: Duration,
    /// Ceiling for the global wait-gate sleep.
    pub max_poll: Duration,
    /// A child `running` with a heartbeat (or, absent that, `created_at`)
    /// older than this is considered stalled (spec §4.4.3).
    pub child_stale_running: Duration,
    /// Absolute cap on how long a parent will wait on a child before
    /// treating it as timed out (spec §5 "Timeouts").
    pub child_max_wait: Duration,
}

impl EngineConfig {
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder {
            min_poll: Duration::milliseconds(200),
            max_poll: Duration::seconds(30),
            child_stale_running: Duration::minutes(5),
            child_max_wait: Duration::hours(1),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

pub struct EngineConfigBuilder {
    min_poll: Duration,
    max_poll: Duration,
    child_stale_running: Duration,
    child_max_wait: Duration,
}

impl EngineConfigBuilder {
    wf_core::setters! {
        set {
            min_poll: Duration,
            max_poll: Duration,
            child_stale_running: Duration,
            child_max_wait: Duration,
        }
    }

    pub fn build(self) -> EngineConfig {
        EngineConfig {
            min_poll: self.min_poll,
            max_poll: self.max_poll,
            child_stale_running: self.child_stale_running,
            child_max_wait: self.child_max_wait,
        }
    }
}

/// Clamp `delay` into `[min, max]` (spec §4.4.2 step 4 "sleep at most
/// clamp(wait_until-now, min_poll, max_poll)").
pub fn clamp_poll(delay: Duration, min: Duration, max: Duration) -> Duration {
    if delay < min {
        min
    } else if delay > max {
        max
    } else {
        delay
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
