//! Pipeline Binding — turns a [`Workflow`] plus a [`DagEngine`] into a
//! [`Handler`] a [`crate::registry::HandlerRegistry`] can hold (spec §4.1
//! "Pipeline Binding": "glue that turns a stage list + final-result callback
//! into a handler").

use async_trait::async_trait;

use crate::dag::{DagEngine, Workflow};
use crate::handler::Handler;
use crate::runtime_context::RuntimeContext;

/// Binds one `job_type` to a [`Workflow`], driving it one turn per
/// [`Handler::run`] call.
pub struct PipelineHandler {
    job_type: String,
    engine: DagEngine,
    workflow: Workflow,
}

impl PipelineHandler {
    pub fn new(job_type: impl Into<String>, engine: DagEngine, workflow: Workflow) -> Self {
        Self { job_type: job_type.into(), engine, workflow }
    }
}

#[async_trait]
impl Handler for PipelineHandler {
    fn job_type(&self) -> &str {
        &self.job_type
    }

    async fn run(&self, ctx: &RuntimeContext) -> Result<(), String> {
        self.engine.run_turn(ctx, &self.workflow).await.map_err(|e| e.to_string())
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
