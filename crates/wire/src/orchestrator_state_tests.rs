use super::*;
use proptest::prelude::*;
use serde_json::json;

#[test]
fn default_state_has_version_one_and_empty_stages() {
    let state = OrchestratorState::new();
    assert_eq!(state.version, 1);
    assert!(state.stages.is_empty());
    assert_eq!(state.last_progress, 0);
    assert!(state.wait_until.is_none());
}

#[test]
fn ensure_stage_creates_pending_once() {
    let mut state = OrchestratorState::new();
    state.ensure_stage("fetch", StageMode::Inline);
    assert_eq!(state.stages.len(), 1);
    state.stages.get_mut("fetch").expect("present").attempts = 2;
    state.ensure_stage("fetch", StageMode::Inline);
    assert_eq!(state.stages["fetch"].attempts, 2, "must not overwrite an existing sub-state");
}

#[test]
fn advance_progress_never_regresses() {
    let mut state = OrchestratorState::new();
    state.advance_progress(40);
    state.advance_progress(10);
    assert_eq!(state.last_progress, 40);
    state.advance_progress(75);
    assert_eq!(state.last_progress, 75);
}

#[test]
fn default_encoding_nests_meta() {
    let mut state = OrchestratorState::new();
    state.meta = json!({"workflow_id": "wf-1"});
    let encoded = state.encode(StateEncoding::Default);
    assert_eq!(encoded["meta"]["workflow_id"], "wf-1");
    assert!(encoded.get("workflow_id").is_none());
}

#[test]
fn flat_encoding_hoists_meta_keys() {
    let mut state = OrchestratorState::new();
    state.meta = json!({"workflow_id": "wf-1"});
    let encoded = state.encode(StateEncoding::Flat);
    assert_eq!(encoded["workflow_id"], "wf-1");
    assert!(encoded.get("meta").is_none());
}

#[test]
fn decode_accepts_default_encoding() {
    let mut state = OrchestratorState::new();
    state.ensure_stage("only", StageMode::Inline);
    state.meta = json!({"k": 1});
    let encoded = state.encode(StateEncoding::Default);
    let decoded = OrchestratorState::decode(&encoded).expect("decodes");
    assert_eq!(decoded, state);
}

#[test]
fn decode_accepts_flat_encoding() {
    let mut state = OrchestratorState::new();
    state.ensure_stage("only", StageMode::Inline);
    state.meta = json!({"k": 1});
    let encoded = state.encode(StateEncoding::Flat);
    let decoded = OrchestratorState::decode(&encoded).expect("decodes");
    assert_eq!(decoded.meta, json!({"k": 1}));
    assert_eq!(decoded.stages, state.stages);
}

#[test]
fn from_result_accepts_wrapped_object() {
    let mut state = OrchestratorState::new();
    state.ensure_stage("only", StageMode::Inline);
    let result = state.to_result();
    assert!(result.get("orchestrator").is_some());
    let decoded = OrchestratorState::from_result(&result).expect("decodes");
    assert_eq!(decoded, state);
}

#[test]
fn from_result_accepts_raw_object_for_legacy_rows() {
    let mut state = OrchestratorState::new();
    state.ensure_stage("only", StageMode::Inline);
    let raw = state.encode(StateEncoding::Default);
    let decoded = OrchestratorState::from_result(&raw).expect("decodes");
    assert_eq!(decoded, state);
}

#[test]
fn encode_decode_encode_round_trip_is_idempotent() {
    let mut state = OrchestratorState::new();
    state.ensure_stage("a", StageMode::Inline);
    state.ensure_stage("b", StageMode::Child);
    state.meta = json!({"thread": "t-1"});
    state.advance_progress(42);

    let first = state.encode(StateEncoding::Default);
    let decoded = OrchestratorState::decode(&first).expect("decodes");
    let second = decoded.encode(StateEncoding::Default);
    assert_eq!(first, second);
}

#[test]
fn clear_child_linkage_drops_all_child_fields() {
    let mut stage = StageSubState::pending("b", StageMode::Child);
    stage.child_job_id = Some("job-1".into());
    stage.child_job_type = Some("demo.child".into());
    stage.child_progress = Some(50);
    stage.clear_child_linkage();
    assert!(stage.child_job_id.is_none());
    assert!(stage.child_job_type.is_none());
    assert!(stage.child_progress.is_none());
}

#[test]
fn merge_outputs_accumulates_rather_than_replaces() {
    let mut stage = StageSubState::pending("a", StageMode::Inline);
    stage.merge_outputs(json!({"x": 1}));
    stage.merge_outputs(json!({"y": 2}));
    assert_eq!(stage.outputs, json!({"x": 1, "y": 2}));
}

fn arb_stage_mode() -> impl Strategy<Value = StageMode> {
    prop_oneof![Just(StageMode::Inline), Just(StageMode::Child)]
}

fn arb_state() -> impl Strategy<Value = OrchestratorState> {
    (
        prop::collection::vec(("[a-z]{1,8}", arb_stage_mode()), 0..5),
        0u8..=100,
        prop::collection::btree_map("[a-z]{1,6}", any::<i32>(), 0..3),
    )
        .prop_map(|(stages, progress, meta)| {
            let mut state = OrchestratorState::new();
            for (name, mode) in stages {
                state.ensure_stage(&name, mode);
            }
            state.advance_progress(progress);
            state.meta = json!(meta);
            state
        })
}

proptest! {
    #[test]
    fn encode_decode_is_idempotent_for_arbitrary_states(state in arb_state()) {
        let first = state.encode(StateEncoding::Default);
        let decoded = OrchestratorState::decode(&first).unwrap();
        let second = decoded.encode(StateEncoding::Default);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn wrapped_result_round_trips_for_arbitrary_states(state in arb_state()) {
        let result = state.to_result();
        let decoded = OrchestratorState::from_result(&result).unwrap();
        prop_assert_eq!(decoded, state);
    }
}
