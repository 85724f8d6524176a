//! Handler contract (spec §4.3 "Handler Registry", §6 "Handler contract").

use async_trait::async_trait;

use crate::runtime_context::RuntimeContext;

/// A `job_type`'s execution body.
///
/// `run`'s `Err` is informational only — terminal transitions (`succeeded`,
/// `failed`, `waiting_user`) go through [`RuntimeContext`], never through the
/// return value. A handler that returns `Err` without having called
/// `ctx.fail(...)` leaves the row exactly where it was (most likely still
/// `running`, which the worker re-queues at the next claim sweep after the
/// stale-lock horizon).
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    /// The `job_type` this handler answers to. MUST be stable and non-empty.
    fn job_type(&self) -> &str;

    async fn run(&self, ctx: &RuntimeContext) -> Result<(), String>;
}
