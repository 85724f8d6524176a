//! Stage specification — the input the DAG Engine is handed for one turn
//! (spec §4.4.1).

use async_trait::async_trait;
use chrono::Duration;
use serde_json::Value;

use crate::retry::RetryPolicy;
use crate::runtime_context::RuntimeContext;
use wf_wire::OrchestratorState;

/// An inline stage body, run synchronously inside the handler's turn.
#[async_trait]
pub trait InlineBody: Send + Sync {
    /// Optional fast-path: if this returns `Ok(true)`, the stage is marked
    /// `succeeded` without calling `run`.
    async fn is_done(
        &self,
        _ctx: &RuntimeContext,
        _state: &OrchestratorState,
    ) -> Result<bool, String> {
        Ok(false)
    }

    /// Execute the stage body, producing outputs merged into the stage's
    /// accumulated `outputs` map.
    async fn run(&self, ctx: &RuntimeContext, state: &OrchestratorState) -> Result<Value, String>;
}

/// A child stage's linkage to the job it spawns.
#[async_trait]
pub trait ChildBody: Send + Sync {
    fn child_job_type(&self) -> &str;

    /// Defaults to the parent's owner.
    fn child_job_owner(&self, _ctx: &RuntimeContext) -> Option<String> {
        None
    }

    fn child_entity(&self, _ctx: &RuntimeContext) -> Option<(String, String)> {
        None
    }

    async fn child_payload(
        &self,
        _ctx: &RuntimeContext,
        _state: &OrchestratorState,
    ) -> Result<Value, String> {
        Ok(Value::Null)
    }
}

/// How a stage is executed, carrying the mode-specific callbacks.
pub enum StageBody {
    Inline {
        body: std::sync::Arc<dyn InlineBody>,
        timeout: Option<Duration>,
        start_pct: u8,
        end_pct: u8,
        start_msg: String,
        done_msg: String,
    },
    Child {
        body: std::sync::Arc<dyn ChildBody>,
    },
}

impl StageBody {
    pub fn mode(&self) -> wf_wire::StageMode {
        match self {
            Self::Inline { .. } => wf_wire::StageMode::Inline,
            Self::Child { .. } => wf_wire::StageMode::Child,
        }
    }
}

/// One node in the stage DAG (spec §4.4.1).
pub struct StageSpec {
    pub name: String,
    pub deps: Vec<String>,
    pub body: StageBody,
    pub retry: RetryPolicy,
}

impl StageSpec {
    pub fn inline(name: impl Into<String>, body: impl InlineBody + 'static) -> Self {
        Self {
            name: name.into(),
            deps: Vec::new(),
            body: StageBody::Inline {
                body: std::sync::Arc::new(body),
                timeout: None,
                start_pct: 0,
                end_pct: 100,
                start_msg: String::new(),
                done_msg: String::new(),
            },
            retry: RetryPolicy::default(),
        }
    }

    pub fn child(name: impl Into<String>, body: impl ChildBody + 'static) -> Self {
        Self {
            name: name.into(),
            deps: Vec::new(),
            body: StageBody::Child { body: std::sync::Arc::new(body) },
            retry: RetryPolicy::default(),
        }
    }

    pub fn depends_on(mut self, deps: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.deps = deps.into_iter().map(Into::into).collect();
        self
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        if let StageBody::Inline { timeout: slot, .. } = &mut self.body {
            *slot = Some(timeout);
        }
        self
    }

    pub fn progress_range(mut self, start_pct: u8, end_pct: u8) -> Self {
        if let StageBody::Inline { start_pct: s, end_pct: e, .. } = &mut self.body {
            *s = start_pct;
            *e = end_pct;
        }
        self
    }
}
