#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! wf-engine: the DAG Engine, Handler Registry, Runtime Context, and the
//! supporting retry/notification/child-enqueue machinery that drives one
//! turn of a workflow (spec §4).

pub mod child_enqueuer;
pub mod clock;
pub mod config;
pub mod dag;
pub mod error;
pub mod handler;
pub mod notifier;
pub mod pipeline;
pub mod registry;
pub mod retry;
pub mod runtime_context;
pub mod stage_spec;

pub use child_enqueuer::{ChildEnqueuer, StoreChildEnqueuer};
pub use clock::EngineClock;
pub use config::{clamp_poll, EngineConfig, EngineConfigBuilder};
pub use dag::{DagEngine, OnFailHook, OnSuccessHook, Workflow};
pub use error::EngineError;
pub use handler::Handler;
pub use notifier::{Notifier, TracingNotifier};
#[cfg(any(test, feature = "test-support"))]
pub use notifier::{NotifierCall, RecordingNotifier};
pub use pipeline::PipelineHandler;
pub use registry::HandlerRegistry;
pub use retry::RetryPolicy;
pub use runtime_context::RuntimeContext;
pub use stage_spec::{ChildBody, InlineBody, StageBody, StageSpec};
