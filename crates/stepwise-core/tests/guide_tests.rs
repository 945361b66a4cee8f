mod common;

use common::{create_test_guide, router_problem};
use stepwise_core::{
    params::{SessionRef, StartSession, SubmitAction},
    Guide, GuideError, SessionEvent, SessionStatus, SessionView,
};

async fn start(guide: &Guide) -> String {
    guide
        .import_problem(router_problem())
        .await
        .expect("Failed to import problem");
    guide
        .start_session(&StartSession {
            device_id: "router-ax3000".to_string(),
            problem_id: "no-internet".to_string(),
            user_id: Some("support-7".to_string()),
        })
        .await
        .expect("Failed to start session")
        .session
        .session_id
}

async fn submit(guide: &Guide, token: &str, action: &str, value: Option<&str>) -> SessionView {
    guide
        .submit_action(&SubmitAction {
            session_id: token.to_string(),
            action: action.to_string(),
            value: value.map(String::from),
        })
        .await
        .expect("Failed to submit action")
}

fn current(view: &SessionView) -> Option<&str> {
    view.session.current_step_id.as_deref()
}

#[tokio::test]
async fn test_green_light_goes_straight_to_browse() {
    let (_temp_dir, guide) = create_test_guide().await;
    let token = start(&guide).await;

    submit(&guide, &token, "done", None).await;
    let view = submit(&guide, &token, "selected", Some("green")).await;
    assert_eq!(current(&view), Some("browse"));
    assert_eq!(view.current_step.as_ref().map(|s| s.step_number), Some(5));

    let view = submit(&guide, &token, "answered", Some("Yes")).await;
    assert_eq!(view.session.status(), SessionStatus::Completed);
    assert_eq!(view.session.completed_steps, 3);
    assert!(view.session.error_steps.is_empty());
}

#[tokio::test]
async fn test_unrouted_value_falls_back_to_next_step() {
    let (_temp_dir, guide) = create_test_guide().await;
    let token = start(&guide).await;

    submit(&guide, &token, "done", None).await;
    let view = submit(&guide, &token, "selected", Some("off")).await;
    assert_eq!(current(&view), Some("reseat-cable"));
}

#[tokio::test]
async fn test_repeated_bad_answers_branch_to_provider() {
    let (_temp_dir, guide) = create_test_guide().await;
    let token = start(&guide).await;
    submit(&guide, &token, "done", None).await;

    for _ in 0..2 {
        let view = submit(&guide, &token, "selected", Some("blue")).await;
        assert!(matches!(view.outcome, Some(SessionEvent::Retrying { .. })));
        assert_eq!(current(&view), Some("wan-light"));
    }

    let view = submit(&guide, &token, "selected", Some("purple")).await;
    assert_eq!(
        view.outcome,
        Some(SessionEvent::Branched {
            from: "wan-light".to_string(),
            to: "provider".to_string()
        })
    );
    assert_eq!(view.session.failures_of("wan-light"), 3);
    assert_eq!(view.session.completed_steps, 1);
}

#[tokio::test]
async fn test_cable_answer_no_restarts() {
    let (_temp_dir, guide) = create_test_guide().await;
    let token = start(&guide).await;
    submit(&guide, &token, "done", None).await;
    submit(&guide, &token, "selected", Some("off")).await;

    let view = submit(&guide, &token, "answered", Some("no")).await;
    assert_eq!(current(&view), Some("power-cycle"));
    assert_eq!(view.session.completed_steps, 0);
    assert_eq!(view.session.error_steps, vec!["reseat-cable".to_string()]);
}

#[tokio::test]
async fn test_provider_refusal_aborts() {
    let (_temp_dir, guide) = create_test_guide().await;
    let token = start(&guide).await;
    submit(&guide, &token, "done", None).await;
    submit(&guide, &token, "selected", Some("amber")).await;

    let view = submit(&guide, &token, "skipped", None).await;
    assert_eq!(view.session.status(), SessionStatus::Failed);
    assert_eq!(
        view.session.failure_reason.as_deref(),
        Some("The provider has to resolve this; nothing more to try at home")
    );
    assert!(view.current_step.is_none());

    let err = guide
        .submit_action(&SubmitAction {
            session_id: token.clone(),
            action: "called".to_string(),
            value: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, GuideError::SessionTerminated { .. }));

    let stored = guide.get_session(&SessionRef { session_id: token }).await.unwrap();
    assert_eq!(stored.session.status(), SessionStatus::Failed);
    assert!(stored.session.duration.is_some());
}

#[tokio::test]
async fn test_session_survives_guide_restart() {
    let (temp_dir, guide) = create_test_guide().await;
    let token = start(&guide).await;
    submit(&guide, &token, "done", None).await;
    drop(guide);

    let reopened = stepwise_core::GuideBuilder::new()
        .with_database_path(Some(temp_dir.path().join("test.db")))
        .with_config(stepwise_core::EngineConfig::default())
        .build()
        .await
        .unwrap();
    let view = reopened
        .get_session(&SessionRef {
            session_id: token.clone(),
        })
        .await
        .unwrap();
    assert_eq!(current(&view), Some("wan-light"));
    assert_eq!(view.session.history.len(), 1);
}
