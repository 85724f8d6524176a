use super::*;
use serde_json::json;

#[test]
fn spec_defaults_are_blocking_version_one() {
    let spec = WaitpointSpec::new("toy.confirm");
    assert_eq!(spec.version, 1);
    assert!(spec.blocking);
    assert!(spec.step.is_none());
    assert!(spec.actions.is_empty());
}

#[test]
fn spec_builder_methods_chain() {
    let spec = WaitpointSpec::new("toy.confirm")
        .with_step("review")
        .with_actions(vec![WaitpointAction {
            id: "a1".into(),
            label: "Approve".into(),
            token: "approve".into(),
            variant: "primary".into(),
        }]);
    assert_eq!(spec.step.as_deref(), Some("review"));
    assert_eq!(spec.actions.len(), 1);
}

#[test]
fn envelope_round_trips_through_json() {
    let envelope = WaitpointEnvelope::new(
        WaitpointSpec::new("toy.confirm").with_step("review"),
        WaitpointState::initial(),
        json!({"draft": "hello"}),
    );

    let value = envelope.to_result();
    let back = WaitpointEnvelope::from_result(&value).expect("parses back");
    assert_eq!(back, envelope);
}

#[test]
fn envelope_matches_bit_exact_shape() {
    let envelope = WaitpointEnvelope::new(
        WaitpointSpec::new("toy.confirm").with_step("review"),
        WaitpointState::initial(),
        json!({"draft": "hello"}),
    );

    let value = envelope.to_result();
    assert_eq!(
        value,
        json!({
            "waitpoint": {
                "version": 1,
                "kind": "toy.confirm",
                "step": "review",
                "blocking": true,
                "actions": [],
            },
            "state": {
                "version": 1,
                "attempts": 0,
            },
            "data": {"draft": "hello"},
        })
    );
}

#[test]
fn from_result_rejects_unrelated_json() {
    let not_a_waitpoint = json!({"foo": "bar"});
    assert!(WaitpointEnvelope::from_result(&not_a_waitpoint).is_none());
}

#[test]
fn state_tracks_resume_progress() {
    let mut state = WaitpointState::initial();
    state.last_user_message_id = Some("msg-1".into());
    state.last_user_seq_handled = Some(7);
    state.attempts += 1;

    let json = serde_json::to_value(&state).expect("serialize");
    assert_eq!(json["last_user_message_id"], "msg-1");
    assert_eq!(json["attempts"], 1);
}
