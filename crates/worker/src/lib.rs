#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! wf-worker: the Worker Loop (spec §4.5) — a pool of long-lived routines
//! that claim runnable job rows, dispatch them to a registered
//! `wf_engine::Handler`, and renew their heartbeat for the duration of a
//! turn.

pub mod config;
pub mod pool;

pub use config::{WorkerConfig, WorkerConfigBuilder};
pub use pool::{WorkerPool, WorkerPoolHandle};
