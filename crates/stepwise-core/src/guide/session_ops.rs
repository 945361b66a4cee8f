//! Session operations for the Guide.

use std::sync::Arc;

use rand::Rng;
use tokio::task;

use super::Guide;
use crate::{
    catalog::StepCatalog,
    db::{Database, SessionFilter},
    display::{SessionView, Sessions},
    engine::SessionEngine,
    error::{GuideError, JoinResultExt, Result},
    models::DiagnosticSession,
    params::{ListSessions, SessionRef, StartSession, SubmitAction},
};

/// Random 16-hex-digit session token.
fn new_session_token() -> String {
    format!("{:016x}", rand::thread_rng().gen::<u64>())
}

/// Attaches the step a session is waiting on.
fn view_of<C: StepCatalog + ?Sized>(catalog: &C, session: DiagnosticSession) -> Result<SessionView> {
    let current_step = match &session.current_step_id {
        Some(step_id) => catalog.get_step(&session.device_id, &session.problem_id, step_id)?,
        None => None,
    };
    Ok(SessionView {
        session,
        current_step,
        outcome: None,
    })
}

impl Guide {
    /// Starts a new session positioned on the problem's first step.
    ///
    /// # Errors
    ///
    /// Returns `GuideError::ProblemNotFound` if the problem has no steps
    /// stored
    pub async fn start_session(&self, params: &StartSession) -> Result<SessionView> {
        let db_path = self.db_path.clone();
        let predicates = Arc::clone(&self.predicates);
        let config = self.config.clone();
        let params = params.clone();

        let view = task::spawn_blocking(move || {
            let db = Database::new(&db_path)?;
            let engine = SessionEngine::new(&db, predicates.as_ref(), &config);
            let session = engine.start(
                new_session_token(),
                &params.device_id,
                &params.problem_id,
                params.user_id,
            )?;
            let stored = db.insert_session(&session)?;
            view_of(&db, stored)
        })
        .await
        .join_context()?;

        log::info!(
            "Started session '{}' for {}/{}",
            view.session.session_id,
            view.session.device_id,
            view.session.problem_id
        );
        Ok(view)
    }

    /// Applies an action to the session's current step and persists the
    /// result.
    ///
    /// Load, evaluation and save run in one immediate transaction, so
    /// concurrent submissions for the same session are applied one after
    /// the other and a failed submission leaves the stored session
    /// unchanged.
    ///
    /// # Errors
    ///
    /// Returns `GuideError::SessionNotFound` for an unknown session token
    /// Returns `GuideError::SessionTerminated` if the session already ended
    /// Returns `GuideError::StepNotFound` if stored content references a
    /// missing step
    pub async fn submit_action(&self, params: &SubmitAction) -> Result<SessionView> {
        let db_path = self.db_path.clone();
        let predicates = Arc::clone(&self.predicates);
        let rng = Arc::clone(&self.rng);
        let config = self.config.clone();
        let params = params.clone();

        task::spawn_blocking(move || {
            let db = Database::new(&db_path)?;
            db.write_transaction(|db| {
                let session = db.load_session(&params.session_id)?.ok_or_else(|| {
                    GuideError::SessionNotFound {
                        session_id: params.session_id.clone(),
                    }
                })?;

                let engine = SessionEngine::new(db, predicates.as_ref(), &config);
                let submission = {
                    let mut rng = rng.lock().map_err(|_| GuideError::Configuration {
                        message: "Random source lock poisoned".to_string(),
                    })?;
                    engine.submit_action(
                        &session,
                        &params.action,
                        params.value.as_deref(),
                        &mut *rng,
                    )?
                };

                db.save_session(&submission.session)?;
                let mut view = view_of(db, submission.session)?;
                view.outcome = Some(submission.event);
                Ok(view)
            })
        })
        .await
        .join_context()
    }

    /// Retrieves a session and the step it is waiting on.
    ///
    /// # Errors
    ///
    /// Returns `GuideError::SessionNotFound` for an unknown session token
    pub async fn get_session(&self, params: &SessionRef) -> Result<SessionView> {
        let db_path = self.db_path.clone();
        let session_id = params.session_id.clone();

        task::spawn_blocking(move || {
            let db = Database::new(&db_path)?;
            let session = db
                .load_session(&session_id)?
                .ok_or(GuideError::SessionNotFound { session_id })?;
            view_of(&db, session)
        })
        .await
        .join_context()
    }

    /// Lists sessions, newest first.
    pub async fn list_sessions(&self, params: &ListSessions) -> Result<Sessions> {
        let db_path = self.db_path.clone();
        let params = params.clone();

        let sessions = task::spawn_blocking(move || {
            let db = Database::new(&db_path)?;
            db.list_sessions(&SessionFilter {
                device_id: params.device_id.as_deref(),
                problem_id: params.problem_id.as_deref(),
                user_id: params.user_id.as_deref(),
            })
        })
        .await
        .join_context()?;

        Ok(Sessions(sessions))
    }
}
