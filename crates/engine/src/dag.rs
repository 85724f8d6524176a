//! The DAG Engine — drives one turn of execution (spec §4.4, the system's
//! "heart").
//!
//! [`DagEngine::run_turn`] implements the turn algorithm verbatim from
//! §4.4.2: preflight validation, state load, cancellation check, the global
//! wait gate, one topologically-ordered pass over the stages, completion,
//! and the generic yield. It produces at most one observable advance per
//! call — synchronous inline completions chain within a single turn, but the
//! first stage that needs an external wait (child enqueue/poll, a waitpoint
//! propagation, or a scheduled retry) ends the turn.

use std::collections::{HashMap, VecDeque};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::FutureExt;
use rand::SeedableRng;
use serde_json::{Map, Value};
use wf_core::{JobId, JobStatus};
use wf_store::FieldUpdate;
use wf_wire::{OrchestratorState, StageMode, StageStatus, StateEncoding};

use crate::child_enqueuer::ChildEnqueuer;
use crate::config::{clamp_poll, EngineConfig};
use crate::error::EngineError;
use crate::runtime_context::RuntimeContext;
use crate::stage_spec::{StageBody, StageSpec};

/// Runs once, after the terminal `Succeed` write has been assembled, to let
/// a hosting pipeline fold in its own final result (spec §4.4.2 step 6
/// "OnSuccess(ctx,state) hook").
#[async_trait]
pub trait OnSuccessHook: Send + Sync {
    async fn call(&self, ctx: &RuntimeContext, state: &OrchestratorState) -> Result<Value, String>;
}

/// Runs exactly once per workflow failure, before the terminal `Fail` write
/// (spec §4.4.6, §7 "Saga-style compensation").
#[async_trait]
pub trait OnFailHook: Send + Sync {
    async fn call(
        &self,
        ctx: &RuntimeContext,
        state: &OrchestratorState,
        stage_name: &str,
        job_stage_label: &str,
        err: &str,
    );
}

/// A stage list plus the hooks and final-result shape for one workflow
/// (spec §4.4, the input to "one turn" of the engine).
pub struct Workflow {
    pub stages: Vec<StageSpec>,
    pub final_result: Value,
    pub encoding: StateEncoding,
    pub init: Option<Arc<dyn Fn(&mut OrchestratorState) + Send + Sync>>,
    pub on_success: Option<Arc<dyn OnSuccessHook>>,
    pub on_fail: Option<Arc<dyn OnFailHook>>,
}

impl Workflow {
    pub fn new(stages: Vec<StageSpec>) -> Self {
        Self {
            stages,
            final_result: Value::Null,
            encoding: StateEncoding::Default,
            init: None,
            on_success: None,
            on_fail: None,
        }
    }

    pub fn final_result(mut self, result: Value) -> Self {
        self.final_result = result;
        self
    }

    pub fn encoding(mut self, encoding: StateEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn init(mut self, f: impl Fn(&mut OrchestratorState) + Send + Sync + 'static) -> Self {
        self.init = Some(Arc::new(f));
        self
    }

    pub fn on_success(mut self, hook: impl OnSuccessHook + 'static) -> Self {
        self.on_success = Some(Arc::new(hook));
        self
    }

    pub fn on_fail(mut self, hook: impl OnFailHook + 'static) -> Self {
        self.on_fail = Some(Arc::new(hook));
        self
    }
}

/// Whether the per-stage pass should keep going within this turn or the
/// whole turn should end now.
enum TurnControl {
    Continue,
    Return,
}

/// Drives DAG-orchestrated workflows (spec §4.4 "DAG Engine").
pub struct DagEngine {
    config: EngineConfig,
    child_enqueuer: Option<Arc<dyn ChildEnqueuer>>,
}

impl DagEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config, child_enqueuer: None }
    }

    pub fn with_child_enqueuer(mut self, enqueuer: Arc<dyn ChildEnqueuer>) -> Self {
        self.child_enqueuer = Some(enqueuer);
        self
    }

    /// Run one turn for `workflow` against `ctx`'s job row (spec §4.4.2).
    pub async fn run_turn(&self, ctx: &RuntimeContext, workflow: &Workflow) -> Result<(), EngineError> {
        // 1. Preflight.
        if workflow.stages.is_empty() {
            ctx.succeed("done", workflow.final_result.clone()).await;
            return Ok(());
        }
        let order = match topo_order(&workflow.stages) {
            Ok(order) => order,
            Err(e) => {
                ctx.fail("validate", &e.to_string()).await;
                return Ok(());
            }
        };

        // 2. Load state.
        let snapshot = ctx.snapshot();
        let mut state = OrchestratorState::from_result(&snapshot.result).unwrap_or_default();
        if state.stages.is_empty() {
            if let Some(init) = &workflow.init {
                init(&mut state);
            }
        }

        // 3. Cancellation check.
        if ctx.is_canceled().await {
            return Ok(());
        }

        let now = ctx.now();

        // 4. Global wait gate.
        if let Some(wait_until) = state.wait_until {
            if wait_until > now {
                let delay = clamp_poll(wait_until - now, self.config.min_poll, self.config.max_poll);
                if let Ok(std_delay) = delay.to_std() {
                    tokio::time::sleep(std_delay).await;
                }
                let label = stage_label(&workflow.stages, &state, &order);
                let pct = clamp_and_advance(&mut state, compute_progress(&workflow.stages, &state));
                self.persist_state(ctx, workflow, &state).await;
                ctx.progress(&format!("waiting_{label}"), pct, &format!("waiting on {label}")).await;
                self.requeue(ctx).await;
                return Ok(());
            }
        }

        // 5. Per-stage pass, topological order.
        for &idx in &order {
            let def = &workflow.stages[idx];
            state.ensure_stage(&def.name, def.body.mode());

            let gated =
                state.stages.get(&def.name).and_then(|s| s.next_run_at).is_some_and(|t| t > now);
            if gated {
                continue;
            }

            let status = state.stages.get(&def.name).map(|s| s.status).unwrap_or(StageStatus::Pending);
            if status.satisfies_dependency() {
                continue;
            }

            // A dep sitting at `Failed` with a `next_run_at` still has a retry
            // scheduled — only a dep that has exhausted its retry budget
            // counts as failed for its dependents.
            let dep_failed = def.deps.iter().any(|d| {
                state
                    .stages
                    .get(d)
                    .map(|s| s.status == StageStatus::Failed && s.next_run_at.is_none())
                    .unwrap_or(false)
            });
            if dep_failed {
                match self.fail_stage(ctx, workflow, &mut state, def, None, "dependency failed").await {
                    TurnControl::Return => return Ok(()),
                    TurnControl::Continue => continue,
                }
            }

            let deps_ready = def
                .deps
                .iter()
                .all(|d| state.stages.get(d).map(|s| s.status.satisfies_dependency()).unwrap_or(false));
            if !deps_ready {
                continue;
            }

            let control = match (&def.body, status) {
                (StageBody::Child { .. }, StageStatus::WaitingChild) => {
                    self.poll_child(ctx, workflow, &mut state, def).await
                }
                (StageBody::Child { .. }, StageStatus::Pending | StageStatus::Running | StageStatus::Failed) => {
                    let has_child =
                        state.stages.get(&def.name).and_then(|s| s.child_job_id.as_ref()).is_some();
                    if has_child {
                        self.poll_child(ctx, workflow, &mut state, def).await
                    } else {
                        self.enqueue_child(ctx, workflow, &mut state, def).await
                    }
                }
                (StageBody::Inline { .. }, StageStatus::Pending | StageStatus::Running | StageStatus::Failed) => {
                    self.run_inline(ctx, workflow, &mut state, def).await
                }
                (StageBody::Inline { .. }, StageStatus::WaitingChild) => {
                    // §9: an inline stage cannot own a child — hard failure,
                    // not a silent reset to pending.
                    let err = EngineError::InlineStageWaitingOnChild(def.name.clone()).to_string();
                    self.fail_stage(ctx, workflow, &mut state, def, None, &err).await
                }
                (_, StageStatus::Succeeded | StageStatus::Skipped) => TurnControl::Continue,
            };

            match control {
                TurnControl::Return => return Ok(()),
                TurnControl::Continue => continue,
            }
        }

        // 6. Completion.
        let all_done = workflow
            .stages
            .iter()
            .all(|s| state.stages.get(&s.name).map(|sub| sub.status.satisfies_dependency()).unwrap_or(false));
        if all_done {
            let mut final_value = encode_wrapped(&state, workflow.encoding);
            if let Some(hook) = &workflow.on_success {
                match hook.call(ctx, &state).await {
                    Ok(extra) => merge_json(&mut final_value, extra),
                    Err(e) => {
                        if let Some(on_fail) = &workflow.on_fail {
                            on_fail.call(ctx, &state, "finalize", "finalize", &e).await;
                        }
                        self.persist_state(ctx, workflow, &state).await;
                        ctx.fail("finalize", &e).await;
                        return Ok(());
                    }
                }
            }
            merge_json(&mut final_value, workflow.final_result.clone());
            state.advance_progress(100);
            ctx.succeed("done", final_value).await;
            return Ok(());
        }

        // 7. Otherwise, yield.
        let label = stage_label(&workflow.stages, &state, &order);
        let pct = clamp_and_advance(&mut state, compute_progress(&workflow.stages, &state));
        self.persist_state(ctx, workflow, &state).await;
        ctx.progress(&label, pct, &format!("advancing {label}")).await;
        self.requeue(ctx).await;
        Ok(())
    }

    /// Persists the state snapshot via the canceled-guarded `Update` (spec
    /// §3 invariant 2) — a cancellation observed between the turn's one-shot
    /// `is_canceled()` probe and this write must not be silently undone.
    async fn persist_state(&self, ctx: &RuntimeContext, workflow: &Workflow, state: &OrchestratorState) {
        ctx.update(FieldUpdate::new().result(encode_wrapped(state, workflow.encoding))).await;
    }

    /// Yields the row back to `queued`, guarded the same way — a concurrent
    /// cancel must win over this requeue, not be flipped back to `Queued`.
    async fn requeue(&self, ctx: &RuntimeContext) {
        let now = ctx.now();
        ctx.update(FieldUpdate::new().status(JobStatus::Queued).clear_locked_at().heartbeat_at(now))
            .await;
    }

    /// Fail `def`'s current attempt. `job_stage_label` is the label the
    /// *terminal* `Fail` call uses if retries are exhausted (spec §4.4.6
    /// "Fail(jobStageLabel or name, err)") — `None` defaults to the stage's
    /// own name. Retry progress always uses `retry_<name>`, per spec.
    async fn fail_stage(
        &self,
        ctx: &RuntimeContext,
        workflow: &Workflow,
        state: &mut OrchestratorState,
        def: &StageSpec,
        job_stage_label: Option<&str>,
        err: &str,
    ) -> TurnControl {
        let now = ctx.now();
        let label = job_stage_label.unwrap_or(&def.name);
        let attempts = {
            let sub = state.ensure_stage(&def.name, def.body.mode());
            sub.attempts += 1;
            sub.last_error = Some(err.to_string());
            sub.status = StageStatus::Failed;
            sub.finished_at = Some(now);
            sub.attempts
        };

        if def.retry.admits_retry(attempts, err) {
            let mut rng = rng_for_job(ctx.job_id());
            let delay = def.retry.backoff_for(attempts, &mut rng);
            let next_run_at = now + delay;
            {
                let sub = state.ensure_stage(&def.name, def.body.mode());
                sub.next_run_at = Some(next_run_at);
            }
            state.wait_until = Some(next_run_at);
            let pct = clamp_and_advance(state, compute_progress(&workflow.stages, state));
            self.persist_state(ctx, workflow, state).await;
            let msg = format!("retrying {} after error: {}", def.name, err);
            ctx.progress(&format!("retry_{}", def.name), pct, &msg).await;
            self.requeue(ctx).await;
            return TurnControl::Return;
        }

        if let Some(hook) = &workflow.on_fail {
            hook.call(ctx, state, &def.name, label, err).await;
        }
        self.persist_state(ctx, workflow, state).await;
        ctx.fail(label, err).await;
        TurnControl::Return
    }

    async fn run_inline(
        &self,
        ctx: &RuntimeContext,
        workflow: &Workflow,
        state: &mut OrchestratorState,
        def: &StageSpec,
    ) -> TurnControl {
        let StageBody::Inline { body, timeout, start_pct, end_pct, start_msg, done_msg } = &def.body
        else {
            unreachable!("run_inline called on a non-inline stage");
        };

        match body.is_done(ctx, state).await {
            Ok(true) => {
                let now = ctx.now();
                let sub = state.ensure_stage(&def.name, StageMode::Inline);
                if sub.started_at.is_none() {
                    sub.started_at = Some(now);
                }
                sub.status = StageStatus::Succeeded;
                sub.finished_at = Some(now);
                let pct = clamp_and_advance(state, *end_pct);
                let msg = default_msg(done_msg, &def.name, "done");
                self.persist_state(ctx, workflow, state).await;
                ctx.progress(&def.name, pct, &msg).await;
                return TurnControl::Continue;
            }
            Ok(false) => {}
            Err(e) => return self.fail_stage(ctx, workflow, state, def, None, &e).await,
        }

        let now = ctx.now();
        {
            let sub = state.ensure_stage(&def.name, StageMode::Inline);
            if sub.started_at.is_none() {
                sub.started_at = Some(now);
            }
            sub.status = StageStatus::Running;
        }
        let start_pct = clamp_and_advance(state, *start_pct);
        let smsg = default_msg(start_msg, &def.name, "starting");
        self.persist_state(ctx, workflow, state).await;
        ctx.progress(&def.name, start_pct, &smsg).await;

        let run_fut = AssertUnwindSafe(body.run(ctx, state)).catch_unwind();
        let outcome = match timeout {
            Some(d) => match d.to_std() {
                Ok(std_dur) => match tokio::time::timeout(std_dur, run_fut).await {
                    Ok(Ok(res)) => res,
                    Ok(Err(_panic)) => Err(format!("stage {} panicked", def.name)),
                    Err(_elapsed) => Err(format!("stage {} timed out", def.name)),
                },
                Err(_) => match run_fut.await {
                    Ok(res) => res,
                    Err(_panic) => Err(format!("stage {} panicked", def.name)),
                },
            },
            None => match run_fut.await {
                Ok(res) => res,
                Err(_panic) => Err(format!("stage {} panicked", def.name)),
            },
        };

        match outcome {
            Ok(outputs) => {
                let now = ctx.now();
                let end_pct_val = {
                    let sub = state.ensure_stage(&def.name, StageMode::Inline);
                    sub.merge_outputs(outputs);
                    sub.status = StageStatus::Succeeded;
                    sub.finished_at = Some(now);
                    *end_pct
                };
                let pct = clamp_and_advance(state, end_pct_val);
                let msg = default_msg(done_msg, &def.name, "done");
                self.persist_state(ctx, workflow, state).await;
                ctx.progress(&def.name, pct, &msg).await;
                TurnControl::Continue
            }
            Err(e) => self.fail_stage(ctx, workflow, state, def, None, &e).await,
        }
    }

    async fn enqueue_child(
        &self,
        ctx: &RuntimeContext,
        workflow: &Workflow,
        state: &mut OrchestratorState,
        def: &StageSpec,
    ) -> TurnControl {
        let StageBody::Child { body } = &def.body else {
            unreachable!("enqueue_child called on a non-child stage");
        };

        let Some(enqueuer) = &self.child_enqueuer else {
            let err = EngineError::MissingChildEnqueuer(def.name.clone()).to_string();
            return self.fail_stage(ctx, workflow, state, def, None, &err).await;
        };

        let job_type = body.child_job_type().to_string();
        if job_type.is_empty() {
            let err = EngineError::MissingChildJobType { stage: def.name.clone() }.to_string();
            return self.fail_stage(ctx, workflow, state, def, None, &err).await;
        }

        let owner = body.child_job_owner(ctx).unwrap_or_else(|| ctx.owner());
        if owner.is_empty() {
            let err = EngineError::MissingChildOwner { stage: def.name.clone() }.to_string();
            return self.fail_stage(ctx, workflow, state, def, None, &err).await;
        }

        let entity = body.child_entity(ctx);
        let payload = match body.child_payload(ctx, state).await {
            Ok(p) => p,
            Err(e) => return self.fail_stage(ctx, workflow, state, def, None, &e).await,
        };

        let (entity_type, entity_id) = match &entity {
            Some((t, i)) => (Some(t.as_str()), Some(i.as_str())),
            None => (None, None),
        };
        let child = enqueuer.enqueue(&owner, &job_type, entity_type, entity_id, payload).await;

        let now = ctx.now();
        {
            let sub = state.ensure_stage(&def.name, StageMode::Child);
            if sub.started_at.is_none() {
                sub.started_at = Some(now);
            }
            sub.status = StageStatus::WaitingChild;
            sub.child_job_id = Some(child.id.to_string());
            sub.child_job_type = Some(child.job_type.clone());
            sub.child_job_status = Some(child.status.to_string());
            sub.child_progress = Some(child.progress);
            sub.child_message.clone_from(&child.message);
        }
        state.wait_until = Some(now + self.config.min_poll);

        let pct = clamp_and_advance(state, compute_progress(&workflow.stages, state));
        // The child row is already durable in the store by this point; this
        // state-save is what records the linkage so a crash-replayed turn
        // observes `child_job_id` and polls instead of re-enqueuing (spec
        // §4.4.4 "same transaction" — see DESIGN.md for how the in-memory
        // store approximates that guarantee).
        self.persist_state(ctx, workflow, state).await;
        let msg = format!("waiting on child {}", child.id);
        ctx.progress(&format!("waiting_child_{}", def.name), pct, &msg).await;
        self.requeue(ctx).await;
        TurnControl::Return
    }

    async fn poll_child(
        &self,
        ctx: &RuntimeContext,
        workflow: &Workflow,
        state: &mut OrchestratorState,
        def: &StageSpec,
    ) -> TurnControl {
        let now = ctx.now();
        let Some(child_id_str) =
            state.stages.get(&def.name).and_then(|s| s.child_job_id.clone())
        else {
            return self.fail_stage(ctx, workflow, state, def, None, "waiting_child stage has no child_job_id").await;
        };
        let child_id = JobId::from_string(&child_id_str);
        let Some(child) = ctx.store().get_by_id(&child_id).await else {
            return self.fail_stage(ctx, workflow, state, def, None, "child job not found").await;
        };

        {
            let sub = state.ensure_stage(&def.name, StageMode::Child);
            sub.child_job_status = Some(child.status.to_string());
            sub.child_progress = Some(child.progress);
            sub.child_message.clone_from(&child.message);
        }

        if !child.status.is_terminal() && now - child.created_at > self.config.child_max_wait {
            ctx.store()
                .update_fields_unless_status(
                    &child_id,
                    &[JobStatus::Canceled, JobStatus::Succeeded, JobStatus::Failed],
                    FieldUpdate::new()
                        .status(JobStatus::Failed)
                        .stage("timeout_exceeded")
                        .error("child exceeded child_max_wait")
                        .last_error_at(now)
                        .clear_locked_at(),
                )
                .await;
            let label = format!("timeout_{}", def.name);
            return self
                .fail_stage(ctx, workflow, state, def, Some(&label), "child exceeded child_max_wait")
                .await;
        }

        if child.status == JobStatus::Running {
            let liveness_at = child.heartbeat_at.unwrap_or(child.created_at);
            if now - liveness_at > self.config.child_stale_running {
                ctx.store()
                    .update_fields_unless_status(
                        &child_id,
                        &[JobStatus::Canceled, JobStatus::Succeeded, JobStatus::Failed],
                        FieldUpdate::new()
                            .status(JobStatus::Failed)
                            .stage("stale_heartbeat")
                            .error("stale heartbeat past child_stale_running")
                            .last_error_at(now)
                            .clear_locked_at(),
                    )
                    .await;
                let label = format!("stale_{}", def.name);
                return self
                    .fail_stage(ctx, workflow, state, def, Some(&label), "stale heartbeat past child_stale_running")
                    .await;
            }
        }

        match child.status {
            JobStatus::Succeeded => {
                let sub = state.ensure_stage(&def.name, StageMode::Child);
                sub.child_result = Some(child.result.clone());
                sub.status = StageStatus::Succeeded;
                sub.finished_at = Some(now);
                TurnControl::Continue
            }
            JobStatus::Failed => {
                let err = child.error.clone().unwrap_or_else(|| "child job failed".to_string());
                self.fail_stage(ctx, workflow, state, def, None, &err).await
            }
            JobStatus::Canceled => {
                let sub = state.ensure_stage(&def.name, StageMode::Child);
                sub.status = StageStatus::Pending;
                sub.clear_child_linkage();
                state.wait_until = Some(now + self.config.min_poll);
                self.persist_state(ctx, workflow, state).await;
                self.requeue(ctx).await;
                TurnControl::Return
            }
            JobStatus::WaitingUser => {
                {
                    let sub = state.ensure_stage(&def.name, StageMode::Child);
                    sub.status = StageStatus::WaitingChild;
                }
                let label = format!("waiting_user_{}", def.name);
                let msg = child.message.clone().unwrap_or_default();
                let pct = clamp_and_advance(state, compute_progress(&workflow.stages, state).min(99));
                self.persist_state(ctx, workflow, state).await;
                ctx.update(
                    FieldUpdate::new()
                        .status(JobStatus::WaitingUser)
                        .stage(label.clone())
                        .message(msg.clone())
                        .clear_locked_at(),
                )
                .await;
                ctx.progress(&label, pct, &msg).await;
                TurnControl::Return
            }
            JobStatus::Queued | JobStatus::Running | JobStatus::WaitingChild => {
                {
                    let sub = state.ensure_stage(&def.name, StageMode::Child);
                    sub.status = StageStatus::WaitingChild;
                }
                state.wait_until = Some(now + self.config.min_poll);
                let label = format!("waiting_child_{}", def.name);
                let pct = clamp_and_advance(state, compute_progress(&workflow.stages, state));
                self.persist_state(ctx, workflow, state).await;
                let msg = format!("waiting on child {}", child.id);
                ctx.progress(&label, pct, &msg).await;
                self.requeue(ctx).await;
                TurnControl::Return
            }
        }
    }
}

fn default_msg(configured: &str, stage: &str, suffix: &str) -> String {
    if configured.is_empty() {
        format!("{stage} {suffix}")
    } else {
        configured.to_string()
    }
}

/// Stable Kahn's-algorithm topological sort (spec §4.4.2 step 1 "unique
/// names, known deps, no cycle ... stable input order for determinism").
fn topo_order(stages: &[StageSpec]) -> Result<Vec<usize>, EngineError> {
    let mut name_to_idx = HashMap::new();
    for (i, s) in stages.iter().enumerate() {
        if name_to_idx.insert(s.name.clone(), i).is_some() {
            return Err(EngineError::DuplicateStageName(s.name.clone()));
        }
    }
    for s in stages {
        for dep in &s.deps {
            if !name_to_idx.contains_key(dep) {
                return Err(EngineError::UnknownDependency { stage: s.name.clone(), dep: dep.clone() });
            }
        }
    }

    let mut indegree = vec![0usize; stages.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); stages.len()];
    for (i, s) in stages.iter().enumerate() {
        for dep in &s.deps {
            let dep_idx = name_to_idx[dep];
            dependents[dep_idx].push(i);
            indegree[i] += 1;
        }
    }

    let mut queue: VecDeque<usize> = (0..stages.len()).filter(|&i| indegree[i] == 0).collect();
    let mut order = Vec::with_capacity(stages.len());
    let mut seen = vec![false; stages.len()];
    while let Some(i) = queue.pop_front() {
        order.push(i);
        seen[i] = true;
        for &next in &dependents[i] {
            indegree[next] -= 1;
            if indegree[next] == 0 {
                queue.push_back(next);
            }
        }
    }

    if order.len() != stages.len() {
        let remaining: Vec<String> =
            (0..stages.len()).filter(|&i| !seen[i]).map(|i| stages[i].name.clone()).collect();
        return Err(EngineError::CycleDetected(remaining));
    }
    Ok(order)
}

/// §4.4.7 "Progress composition": per-stage contribution averaged across
/// all stages, floored and capped to `[0, 99]` pre-clamp (the caller applies
/// the monotonic clamp separately via [`clamp_and_advance`]).
fn compute_progress(stages: &[StageSpec], state: &OrchestratorState) -> u8 {
    if stages.is_empty() {
        return 100;
    }
    let sum: f64 = stages
        .iter()
        .map(|s| match state.stages.get(&s.name) {
            Some(sub) => match sub.status {
                StageStatus::Succeeded | StageStatus::Skipped => 1.0,
                StageStatus::WaitingChild => {
                    (sub.child_progress.unwrap_or(0) as f64 / 100.0).clamp(0.0, 1.0)
                }
                _ => 0.0,
            },
            None => 0.0,
        })
        .sum();
    let raw = (sum / stages.len() as f64 * 100.0).floor();
    raw.clamp(0.0, 99.0) as u8
}

/// Apply the monotonic progress clamp (invariant 1) and return the
/// (possibly unchanged) resulting value.
fn clamp_and_advance(state: &mut OrchestratorState, candidate: u8) -> u8 {
    state.advance_progress(candidate);
    state.last_progress
}

/// §4.4.7 "Stage label": `waiting_child_<name>` when a child is in flight,
/// `waiting` when nothing is runnable but the workflow isn't complete,
/// `name` otherwise.
fn stage_label(stages: &[StageSpec], state: &OrchestratorState, order: &[usize]) -> String {
    for &i in order {
        let s = &stages[i];
        if let Some(sub) = state.stages.get(&s.name) {
            if matches!(sub.status, StageStatus::WaitingChild | StageStatus::Running) {
                return if sub.status == StageStatus::WaitingChild {
                    format!("waiting_child_{}", s.name)
                } else {
                    s.name.clone()
                };
            }
        }
    }
    for &i in order {
        let s = &stages[i];
        if let Some(sub) = state.stages.get(&s.name) {
            if matches!(sub.status, StageStatus::Pending | StageStatus::Failed) {
                return s.name.clone();
            }
        }
    }
    "waiting".to_string()
}

/// Canonical persisted shape (spec §9 Open Question resolution): always
/// wrapped under `"orchestrator"`, encoded per the workflow's chosen encoder.
fn encode_wrapped(state: &OrchestratorState, encoding: StateEncoding) -> Value {
    let mut wrapper = Map::new();
    wrapper.insert("orchestrator".to_string(), state.encode(encoding));
    Value::Object(wrapper)
}

/// `encode(state) ∪ finalResult` (spec §4.4.6): final-result keys win ties.
fn merge_json(base: &mut Value, overlay: Value) {
    let Value::Object(overlay) = overlay else { return };
    if !base.is_object() {
        *base = Value::Object(Map::new());
    }
    if let Value::Object(base) = base {
        for (k, v) in overlay {
            base.insert(k, v);
        }
    }
}

/// Per-row deterministic RNG seed (spec §9 "randomness MUST be per-row") —
/// derived from the job id so two concurrent rows never share a jitter
/// sequence, without needing to thread a shared RNG through the engine.
fn rng_for_job(job_id: JobId) -> rand::rngs::StdRng {
    use std::hash::{Hash, Hasher};
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    job_id.as_str().hash(&mut hasher);
    rand::rngs::StdRng::seed_from_u64(hasher.finish())
}

#[cfg(test)]
#[path = "dag_tests.rs"]
mod tests;
