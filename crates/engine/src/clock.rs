//! A type-erased [`Clock`] so `RuntimeContext`, `Handler`, and the
//! `HandlerRegistry` can stay non-generic and object-safe.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use wf_core::Clock;

#[derive(Clone)]
pub struct EngineClock(Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>);

impl EngineClock {
    pub fn new(f: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn system() -> Self {
        Self::new(Utc::now)
    }

    /// Wrap any concrete `Clock` (e.g. `wf_core::FakeClock`) behind the
    /// erased interface.
    pub fn from_clock(clock: impl Clock) -> Self {
        Self::new(move || clock.now())
    }
}

impl Clock for EngineClock {
    fn now(&self) -> DateTime<Utc> {
        (self.0)()
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
