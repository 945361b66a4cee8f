use jiff::{Timestamp, ToSpan};
use serde_json::json;

use super::*;
use crate::error::GuideError;

fn problem(steps: serde_json::Value) -> Problem {
    serde_json::from_value(json!({
        "id": "no-sound",
        "device_id": "soundbar-2",
        "title": "No sound",
        "steps": steps
    }))
    .unwrap()
}

fn two_steps() -> serde_json::Value {
    json!([
        {"id": "volume", "step_number": 1, "instruction": "Turn the volume up"},
        {"id": "cable", "step_number": 3, "instruction": "Check the optical cable"}
    ])
}

fn invalid_field(err: GuideError) -> String {
    match err {
        GuideError::InvalidInput { field, .. } => field,
        other => panic!("expected InvalidInput, got {other:?}"),
    }
}

#[test]
fn test_step_defaults_from_minimal_json() {
    let p = problem(two_steps());
    let step = &p.steps[0];
    assert_eq!(step.action_type, ActionType::Confirmation);
    assert!(step.validation_rules.is_empty());
    assert!(step.failure_actions.is_empty());
    assert_eq!(step.estimated_time, 0);
    assert!(p.validate().is_ok());
}

#[test]
fn test_validation_rule_tagging() {
    let rules: Vec<ValidationRule> = serde_json::from_value(json!([
        {"type": "required", "message": "Enter a value"},
        {"type": "pattern", "value": "^\\d+$", "message": "Digits only"},
        {"type": "custom", "value": "affirmative", "message": "Answer yes"}
    ]))
    .unwrap();
    assert_eq!(rules[0].kind(), "required");
    assert_eq!(rules[1].message(), "Digits only");
    assert!(matches!(&rules[2], ValidationRule::Custom { value, .. } if value == "affirmative"));

    let out = serde_json::to_value(&rules[1]).unwrap();
    assert_eq!(out["type"], "pattern");
}

#[test]
fn test_action_type_parsing() {
    assert_eq!("button_press".parse::<ActionType>().unwrap(), ActionType::ButtonPress);
    assert_eq!("INPUT".parse::<ActionType>().unwrap(), ActionType::Input);
    assert!("wiggle".parse::<ActionType>().is_err());
}

#[test]
fn test_normalize_stamps_and_sorts() {
    let mut p = problem(json!([
        {"id": "b", "step_number": 2, "instruction": "Second"},
        {"id": "a", "step_number": 1, "instruction": "First"}
    ]));
    p.normalize();
    assert_eq!(p.steps[0].id, "a");
    assert!(p
        .steps
        .iter()
        .all(|s| s.problem_id == "no-sound" && s.device_id == "soundbar-2"));
}

#[test]
fn test_validate_rejects_structural_problems() {
    let empty = problem(json!([]));
    assert_eq!(invalid_field(empty.validate().unwrap_err()), "steps");

    let duplicate = problem(json!([
        {"id": "a", "step_number": 1, "instruction": "One"},
        {"id": "a", "step_number": 2, "instruction": "Two"}
    ]));
    assert_eq!(invalid_field(duplicate.validate().unwrap_err()), "steps[a].id");

    let unordered = problem(json!([
        {"id": "a", "step_number": 2, "instruction": "One"},
        {"id": "b", "step_number": 2, "instruction": "Two"}
    ]));
    assert_eq!(
        invalid_field(unordered.validate().unwrap_err()),
        "steps[b].step_number"
    );

    let blank = problem(json!([{"id": "a", "step_number": 1, "instruction": "  "}]));
    assert_eq!(invalid_field(blank.validate().unwrap_err()), "steps[a].instruction");
}

#[test]
fn test_validate_checks_rules_and_routing() {
    let mut p = problem(two_steps());
    p.steps[0].validation_rules.push(ValidationRule::Pattern {
        value: "([0-9]".to_string(),
        message: "Digits".to_string(),
    });
    assert_eq!(
        invalid_field(p.validate().unwrap_err()),
        "steps[volume].validation_rules"
    );

    let mut p = problem(two_steps());
    p.steps[0].next_step_conditions.push(NextStepCondition {
        condition: "always".to_string(),
        next_step_id: "missing".to_string(),
        probability: None,
    });
    assert_eq!(
        invalid_field(p.validate().unwrap_err()),
        "steps[volume].next_step_conditions"
    );

    let mut p = problem(two_steps());
    p.steps[0].next_step_conditions.push(NextStepCondition {
        condition: "always".to_string(),
        next_step_id: "cable".to_string(),
        probability: Some(1.5),
    });
    assert!(p.validate().is_err());

    let mut p = problem(two_steps());
    p.steps[0].success_condition = Some("value ==".to_string());
    assert!(matches!(
        p.validate().unwrap_err(),
        GuideError::InvalidCondition { .. }
    ));

    let mut p = problem(two_steps());
    p.steps[0].failure_actions.push(FailureAction {
        condition: format!("{}always", "!".repeat(200_000)),
        action: FailureKind::Retry,
        target: None,
        message: None,
    });
    assert!(matches!(
        p.validate().unwrap_err(),
        GuideError::InvalidCondition { .. }
    ));
}

#[test]
fn test_validate_branch_targets() {
    let branch = |target: Option<&str>, kind: FailureKind| {
        let mut p = problem(two_steps());
        p.steps[0].failure_actions.push(FailureAction {
            condition: "always".to_string(),
            action: kind,
            target: target.map(String::from),
            message: None,
        });
        p.validate()
    };

    assert!(branch(Some("cable"), FailureKind::Branch).is_ok());
    assert!(matches!(
        branch(Some("nowhere"), FailureKind::Branch).unwrap_err(),
        GuideError::InvalidBranchTarget { ref target, .. } if target == "nowhere"
    ));
    assert!(branch(None, FailureKind::Branch).is_err());
    assert!(branch(Some("cable"), FailureKind::Retry).is_err());
    assert!(branch(None, FailureKind::Abort).is_ok());
}

#[test]
fn test_problem_estimated_time() {
    let mut p = problem(two_steps());
    p.steps[0].estimated_time = 30;
    p.steps[1].estimated_time = 45;
    assert_eq!(p.estimated_time(), 75);
}

#[test]
fn test_session_lifecycle() {
    let mut session = DiagnosticSession::new("t1", "soundbar-2", "no-sound", None, "volume", 2);
    assert_eq!(session.status(), SessionStatus::Active);
    assert!(!session.is_terminal());
    assert_eq!(session.current_step_id.as_deref(), Some("volume"));

    session.error_steps = vec!["volume".to_string(), "cable".to_string(), "volume".to_string()];
    assert_eq!(session.failures_of("volume"), 2);
    assert_eq!(session.failures_of("other"), 0);

    let later = session.start_time.checked_add(90.seconds()).unwrap();
    session.terminate(true, later);
    assert_eq!(session.status(), SessionStatus::Completed);
    assert!(session.current_step_id.is_none());
    assert_eq!(session.duration, Some(90));
}

#[test]
fn test_terminate_never_ends_before_start() {
    let mut session = DiagnosticSession::new("t1", "d", "p", None, "s", 1);
    let earlier: Timestamp = session.start_time.checked_sub(1.hour()).unwrap();
    session.terminate(false, earlier);
    assert_eq!(session.end_time, Some(session.start_time));
    assert_eq!(session.duration, Some(0));
    assert_eq!(session.status(), SessionStatus::Failed);
}

#[test]
fn test_session_json_round_trip_keeps_history() {
    let mut session = DiagnosticSession::new("t1", "d", "p", Some("kim".to_string()), "s", 1);
    session.history.push(StepAttempt {
        step_id: "s".to_string(),
        action: "pressed".to_string(),
        value: None,
        passed: false,
        control: Some(FailureKind::Retry),
        reason: "Enter a value".to_string(),
        at: session.start_time,
    });
    let json = serde_json::to_string(&session).unwrap();
    assert!(!json.contains("failure_reason"));
    let back: DiagnosticSession = serde_json::from_str(&json).unwrap();
    assert_eq!(back, session);
}
