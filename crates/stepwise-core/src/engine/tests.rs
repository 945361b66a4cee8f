//! Scenario tests for the session engine.

use rand::{rngs::StdRng, SeedableRng};

use super::*;
use crate::{
    catalog::MemoryCatalog,
    config::EngineConfig,
    error::GuideError,
    models::{
        ActionType, DiagnosticSession, FailureAction, FailureKind, NextStepCondition, Problem,
        SessionStatus, Step, ValidationRule,
    },
};

fn step(id: &str, number: u32) -> Step {
    Step {
        id: id.to_string(),
        problem_id: String::new(),
        device_id: String::new(),
        step_number: number,
        instruction: format!("Carry out {id}"),
        action_type: ActionType::ButtonPress,
        required_action: None,
        validation_rules: vec![],
        success_condition: None,
        failure_actions: vec![],
        next_step_conditions: vec![],
        estimated_time: 10,
    }
}

fn requiring_value(mut s: Step) -> Step {
    s.validation_rules = vec![ValidationRule::Required {
        message: "Enter the reading".to_string(),
    }];
    s
}

fn on_failure(mut s: Step, condition: &str, kind: FailureKind, target: Option<&str>) -> Step {
    s.failure_actions.push(FailureAction {
        condition: condition.to_string(),
        action: kind,
        target: target.map(String::from),
        message: None,
    });
    s
}

fn catalog(steps: Vec<Step>) -> MemoryCatalog {
    MemoryCatalog::new().with_problem(Problem {
        id: "no-signal".to_string(),
        device_id: "tv".to_string(),
        title: "No signal".to_string(),
        description: None,
        category: None,
        steps,
    })
}

struct Harness {
    catalog: MemoryCatalog,
    predicates: PredicateRegistry,
    config: EngineConfig,
    rng: StdRng,
}

impl Harness {
    fn new(steps: Vec<Step>) -> Self {
        Self {
            catalog: catalog(steps),
            predicates: PredicateRegistry::with_builtins(),
            config: EngineConfig::default(),
            rng: StdRng::seed_from_u64(11),
        }
    }

    fn start(&self) -> DiagnosticSession {
        SessionEngine::new(&self.catalog, &self.predicates, &self.config)
            .start("token", "tv", "no-signal", Some("user-1".to_string()))
            .expect("start session")
    }

    fn submit(
        &mut self,
        session: &DiagnosticSession,
        action: &str,
        value: Option<&str>,
    ) -> crate::error::Result<Submission> {
        SessionEngine::new(&self.catalog, &self.predicates, &self.config).submit_action(
            session,
            action,
            value,
            &mut self.rng,
        )
    }
}

#[test]
fn test_start_positions_on_first_step() {
    let h = Harness::new(vec![step("s2", 20), step("s1", 10)]);
    let session = h.start();
    assert_eq!(session.current_step_id.as_deref(), Some("s1"));
    assert_eq!(session.total_steps, 2);
    assert_eq!(session.completed_steps, 0);
    assert_eq!(session.status(), SessionStatus::Active);
    assert_eq!(session.user_id.as_deref(), Some("user-1"));
}

#[test]
fn test_start_unknown_problem() {
    let h = Harness::new(vec![step("s1", 1)]);
    let engine = SessionEngine::new(&h.catalog, &h.predicates, &h.config);
    let err = engine.start("t", "tv", "missing", None).unwrap_err();
    assert!(matches!(err, GuideError::ProblemNotFound { .. }));
}

#[test]
fn test_passing_action_advances_to_next_step_number() {
    let mut h = Harness::new(vec![step("s1", 1), step("s2", 2)]);
    let session = h.start();

    let out = h.submit(&session, "pressed", None).unwrap();
    assert!(out.verdict.passed);
    assert_eq!(out.session.current_step_id.as_deref(), Some("s2"));
    assert_eq!(out.session.completed_steps, 1);
    assert_eq!(
        out.event,
        SessionEvent::Advanced {
            from: "s1".to_string(),
            to: "s2".to_string()
        }
    );
    assert_eq!(out.session.history.len(), 1);
    assert!(out.session.history[0].passed);
}

#[test]
fn test_last_step_completes_session() {
    let mut h = Harness::new(vec![step("s1", 1)]);
    let session = h.start();

    let out = h.submit(&session, "pressed", None).unwrap();
    let done = &out.session;
    assert_eq!(done.status(), SessionStatus::Completed);
    assert_eq!(done.success, Some(true));
    assert_eq!(done.current_step_id, None);
    assert_eq!(done.completed_steps, 1);
    let end = done.end_time.expect("end time set");
    assert!(end >= done.start_time);
    assert!(done.duration.is_some());
    assert_eq!(out.event, SessionEvent::Completed { step_id: "s1".to_string() });
}

#[test]
fn test_terminal_sessions_reject_submissions() {
    let mut h = Harness::new(vec![step("s1", 1)]);
    let session = h.start();
    let done = h.submit(&session, "pressed", None).unwrap().session;

    for _ in 0..2 {
        let err = h.submit(&done, "pressed", None).unwrap_err();
        assert!(matches!(err, GuideError::SessionTerminated { .. }));
    }
}

#[test]
fn test_retry_until_budget_then_fail() {
    let s1 = on_failure(requiring_value(step("s1", 1)), "always", FailureKind::Retry, None);
    let mut h = Harness::new(vec![s1, step("s2", 2)]);
    let mut session = h.start();

    for _ in 0..3 {
        let out = h.submit(&session, "read", None).unwrap();
        assert!(matches!(out.event, SessionEvent::Retrying { .. }));
        session = out.session;
        assert_eq!(session.current_step_id.as_deref(), Some("s1"));
    }
    assert_eq!(session.error_steps, ["s1", "s1", "s1"]);
    assert_eq!(session.status(), SessionStatus::Active);

    let out = h.submit(&session, "read", None).unwrap();
    assert_eq!(out.session.status(), SessionStatus::Failed);
    assert_eq!(out.session.success, Some(false));
    assert_eq!(out.session.current_step_id, None);
    assert!(out.session.end_time.is_some());
    assert!(out
        .session
        .failure_reason
        .as_deref()
        .is_some_and(|r| r.contains("retry limit")));
}

#[test]
fn test_max_retries_comes_from_config() {
    let mut h = Harness::new(vec![requiring_value(step("s1", 1))]);
    h.config.max_retries = 1;
    let session = h.start();

    let first = h.submit(&session, "read", None).unwrap().session;
    assert_eq!(first.status(), SessionStatus::Active);
    let second = h.submit(&first, "read", None).unwrap().session;
    assert_eq!(second.status(), SessionStatus::Failed);
    assert_eq!(second.error_steps, ["s1", "s1"]);
}

#[test]
fn test_skip_advances_without_counting_completion() {
    let s1 = on_failure(requiring_value(step("s1", 1)), "always", FailureKind::Skip, None);
    let mut h = Harness::new(vec![s1, step("s2", 2)]);
    let session = h.start();

    let out = h.submit(&session, "read", None).unwrap();
    assert_eq!(out.session.current_step_id.as_deref(), Some("s2"));
    assert_eq!(out.session.completed_steps, 0);
    assert_eq!(out.session.error_steps, ["s1"]);
    assert_eq!(
        out.event,
        SessionEvent::Skipped {
            from: "s1".to_string(),
            to: Some("s2".to_string())
        }
    );
}

#[test]
fn test_restart_keeps_error_history() {
    let s2 = on_failure(requiring_value(step("s2", 2)), "always", FailureKind::Restart, None);
    let mut h = Harness::new(vec![step("s1", 1), s2, step("s3", 3)]);
    let session = h.start();

    let on_s2 = h.submit(&session, "ok", None).unwrap().session;
    assert_eq!(on_s2.completed_steps, 1);

    let out = h.submit(&on_s2, "read", None).unwrap();
    assert_eq!(out.session.current_step_id.as_deref(), Some("s1"));
    assert_eq!(out.session.completed_steps, 0);
    assert_eq!(out.session.error_steps, ["s2"]);
    assert!(matches!(out.event, SessionEvent::Restarted { .. }));
}

#[test]
fn test_branch_moves_to_target() {
    let s1 = on_failure(
        requiring_value(step("s1", 1)),
        "reason contains reading",
        FailureKind::Branch,
        Some("s3"),
    );
    let mut h = Harness::new(vec![s1, step("s2", 2), step("s3", 3)]);
    let session = h.start();

    let out = h.submit(&session, "read", None).unwrap();
    assert_eq!(out.session.current_step_id.as_deref(), Some("s3"));
    assert_eq!(
        out.event,
        SessionEvent::Branched {
            from: "s1".to_string(),
            to: "s3".to_string()
        }
    );
}

#[test]
fn test_invalid_branch_target_aborts() {
    let s1 = on_failure(requiring_value(step("s1", 1)), "always", FailureKind::Branch, Some("ghost"));
    let mut h = Harness::new(vec![s1, step("s2", 2)]);
    let session = h.start();

    let out = h.submit(&session, "read", None).unwrap();
    assert_eq!(out.session.status(), SessionStatus::Failed);
    match out.event {
        SessionEvent::Aborted { reason, .. } => assert!(reason.contains("ghost")),
        other => panic!("expected abort, got {other:?}"),
    }
}

#[test]
fn test_abort_ends_session() {
    let s1 = on_failure(requiring_value(step("s1", 1)), "always", FailureKind::Abort, None);
    let mut h = Harness::new(vec![s1]);
    let session = h.start();

    let out = h.submit(&session, "read", None).unwrap();
    assert_eq!(out.session.status(), SessionStatus::Failed);
    assert_eq!(out.session.failure_reason.as_deref(), Some("Enter the reading"));
}

#[test]
fn test_missing_current_step_leaves_session_untouched() {
    let mut h = Harness::new(vec![step("s1", 1)]);
    let mut session = h.start();
    session.current_step_id = Some("deleted".to_string());
    let before = session.clone();

    let err = h.submit(&session, "pressed", None).unwrap_err();
    assert!(matches!(err, GuideError::StepNotFound { .. }));
    assert_eq!(session, before);
}

#[test]
fn test_unknown_routing_target_fails_request() {
    let mut s1 = step("s1", 1);
    s1.next_step_conditions = vec![NextStepCondition {
        condition: "always".to_string(),
        next_step_id: "ghost".to_string(),
        probability: None,
    }];
    let mut h = Harness::new(vec![s1, step("s2", 2)]);
    let session = h.start();

    let err = h.submit(&session, "pressed", None).unwrap_err();
    assert!(matches!(err, GuideError::StepNotFound { .. }));
}

#[test]
fn test_completed_steps_never_exceed_total_when_looping() {
    let mut s2 = step("s2", 2);
    s2.next_step_conditions = vec![NextStepCondition {
        condition: "action == again".to_string(),
        next_step_id: "s1".to_string(),
        probability: None,
    }];
    let mut h = Harness::new(vec![step("s1", 1), s2]);
    let mut session = h.start();

    for _ in 0..5 {
        session = h.submit(&session, "next", None).unwrap().session;
        session = h.submit(&session, "again", None).unwrap().session;
        assert!(session.completed_steps <= session.total_steps);
    }
    assert_eq!(session.current_step_id.as_deref(), Some("s1"));
}

#[test]
fn test_custom_predicate_routing() {
    let mut s1 = step("s1", 1);
    s1.next_step_conditions = vec![NextStepCondition {
        condition: "affirmative".to_string(),
        next_step_id: "s3".to_string(),
        probability: None,
    }];
    let mut h = Harness::new(vec![s1, step("s2", 2), step("s3", 3)]);
    let session = h.start();

    let yes = h.submit(&session, "answer", Some("yes")).unwrap();
    assert_eq!(yes.session.current_step_id.as_deref(), Some("s3"));
    let no = h.submit(&session, "answer", Some("no")).unwrap();
    assert_eq!(no.session.current_step_id.as_deref(), Some("s2"));
}
