//! Session state machine: applies verdicts and control actions to a
//! [`DiagnosticSession`].

use jiff::Timestamp;
use log::{debug, error, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{
    condition::ConditionContext,
    failure::{ControlAction, FailureDecision, FailurePolicy},
    predicates::PredicateRegistry,
    rules::{self, Verdict},
    transition,
};
use crate::{
    catalog::StepCatalog,
    config::EngineConfig,
    error::{GuideError, Result},
    models::{DiagnosticSession, Step, StepAttempt},
};

/// What a submission did to the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    /// The step passed and the session moved on
    Advanced { from: String, to: String },
    /// The final step passed (or was skipped) and the session succeeded
    Completed { step_id: String },
    /// The step failed and must be attempted again
    Retrying {
        step_id: String,
        reason: String,
        message: Option<String>,
    },
    /// The step failed but the session moved on anyway
    Skipped { from: String, to: Option<String> },
    /// The step failed and the session returned to the first step
    Restarted { from: String, to: String },
    /// The step failed and the session jumped to an authored target
    Branched { from: String, to: String },
    /// The session ended as failed
    Aborted { step_id: String, reason: String },
}

/// Result of one [`SessionEngine::submit_action`] call.
#[derive(Debug, Clone)]
pub struct Submission {
    /// The updated session, ready to be persisted
    pub session: DiagnosticSession,
    pub verdict: Verdict,
    pub event: SessionEvent,
}

/// The step being attempted together with its evaluation context.
struct Attempt<'s> {
    step: &'s Step,
    ctx: &'s ConditionContext,
    now: Timestamp,
}

/// Advances sessions step by step.
///
/// The engine holds no state between calls: every submission takes the
/// current session by reference and returns an updated copy, so a failed
/// call leaves the caller's session untouched.
pub struct SessionEngine<'a, C: ?Sized> {
    catalog: &'a C,
    predicates: &'a PredicateRegistry,
    config: &'a EngineConfig,
}

impl<'a, C: StepCatalog + ?Sized> SessionEngine<'a, C> {
    pub fn new(catalog: &'a C, predicates: &'a PredicateRegistry, config: &'a EngineConfig) -> Self {
        Self {
            catalog,
            predicates,
            config,
        }
    }

    /// Creates a new active session positioned on the problem's first step.
    pub fn start(
        &self,
        session_id: impl Into<String>,
        device_id: &str,
        problem_id: &str,
        user_id: Option<String>,
    ) -> Result<DiagnosticSession> {
        let first = self.first_step(device_id, problem_id)?;
        let total = self.catalog.count_steps(device_id, problem_id)?;
        Ok(DiagnosticSession::new(
            session_id, device_id, problem_id, user_id, first.id, total,
        ))
    }

    /// Validates a submission against the session's current step and applies
    /// the outcome.
    ///
    /// # Errors
    ///
    /// - [`GuideError::SessionTerminated`] if the session already ended
    /// - [`GuideError::StepNotFound`] if the current step or a routing target
    ///   is missing from the catalog
    pub fn submit_action<R: Rng>(
        &self,
        session: &DiagnosticSession,
        action: &str,
        value: Option<&str>,
        rng: &mut R,
    ) -> Result<Submission> {
        let (Some(current_id), false) = (&session.current_step_id, session.is_terminal()) else {
            return Err(GuideError::SessionTerminated {
                session_id: session.session_id.clone(),
            });
        };

        let step = self
            .catalog
            .get_step(&session.device_id, &session.problem_id, current_id)?
            .ok_or_else(|| GuideError::StepNotFound {
                step_id: current_id.clone(),
            })?;

        let now = Timestamp::now();
        let mut next = session.clone();
        let ctx = rules::submission_context(&step, action, value)
            .with("completed", session.completed_steps)
            .with("total", session.total_steps);
        let attempt = Attempt {
            step: &step,
            ctx: &ctx,
            now,
        };

        let verdict = rules::evaluate(&step, action, value, self.predicates);
        if let Some(name) = &verdict.unresolved_rule {
            warn!(
                "{}; step '{}' fails closed",
                GuideError::UnresolvedCustomRule { name: name.clone() },
                step.id
            );
        }

        let (event, control) = if verdict.passed {
            next.completed_steps = (next.completed_steps + 1).min(next.total_steps);
            let event = self.advance(&mut next, &attempt, rng)?;
            (event, None)
        } else {
            let policy = FailurePolicy::new(self.predicates, self.config.max_retries);
            let decision = policy.resolve(&step, &verdict, session, &ctx);
            let kind = decision.action.kind();
            next.error_steps.push(step.id.clone());
            let event = self.apply_failure(&mut next, &attempt, &verdict, decision, rng)?;
            (event, Some(kind))
        };

        next.history.push(StepAttempt {
            step_id: step.id.clone(),
            action: action.to_string(),
            value: value.map(String::from),
            passed: verdict.passed,
            control,
            reason: verdict.reason.clone(),
            at: now,
        });

        debug!("Session '{}': {event:?}", next.session_id);
        Ok(Submission {
            session: next,
            verdict,
            event,
        })
    }

    /// Moves past `step` the way a successful submission does.
    fn advance<R: Rng>(
        &self,
        session: &mut DiagnosticSession,
        attempt: &Attempt<'_>,
        rng: &mut R,
    ) -> Result<SessionEvent> {
        let step = attempt.step;
        match transition::select_next(step, attempt.ctx, self.catalog, self.predicates, rng)? {
            Some(to) => {
                session.current_step_id = Some(to.clone());
                Ok(SessionEvent::Advanced {
                    from: step.id.clone(),
                    to,
                })
            }
            None => {
                session.terminate(true, attempt.now);
                Ok(SessionEvent::Completed {
                    step_id: step.id.clone(),
                })
            }
        }
    }

    fn apply_failure<R: Rng>(
        &self,
        session: &mut DiagnosticSession,
        attempt: &Attempt<'_>,
        verdict: &Verdict,
        decision: FailureDecision,
        rng: &mut R,
    ) -> Result<SessionEvent> {
        let from = attempt.step.id.clone();
        let now = attempt.now;
        match decision.action {
            ControlAction::Retry => Ok(SessionEvent::Retrying {
                step_id: from,
                reason: verdict.reason.clone(),
                message: decision.message,
            }),
            ControlAction::Skip => match self.advance(session, attempt, rng)? {
                SessionEvent::Advanced { to, .. } => Ok(SessionEvent::Skipped { from, to: Some(to) }),
                _ => Ok(SessionEvent::Skipped { from, to: None }),
            },
            ControlAction::Restart => {
                let first = self.first_step(&session.device_id, &session.problem_id)?;
                session.current_step_id = Some(first.id.clone());
                session.completed_steps = 0;
                Ok(SessionEvent::Restarted { from, to: first.id })
            }
            ControlAction::Branch { target } => {
                let exists = self
                    .catalog
                    .get_step(&session.device_id, &session.problem_id, &target)?
                    .is_some();
                if exists {
                    session.current_step_id = Some(target.clone());
                    Ok(SessionEvent::Branched { from, to: target })
                } else {
                    let err = GuideError::InvalidBranchTarget {
                        step_id: from.clone(),
                        target,
                    };
                    error!("Session '{}': {err}; aborting", session.session_id);
                    Ok(Self::abort(session, from, err.to_string(), now))
                }
            }
            ControlAction::Abort { reason } => Ok(Self::abort(session, from, reason, now)),
        }
    }

    fn abort(
        session: &mut DiagnosticSession,
        step_id: String,
        reason: String,
        now: Timestamp,
    ) -> SessionEvent {
        session.failure_reason = Some(reason.clone());
        session.terminate(false, now);
        SessionEvent::Aborted { step_id, reason }
    }

    fn first_step(&self, device_id: &str, problem_id: &str) -> Result<Step> {
        self.catalog
            .get_first_step(device_id, problem_id)?
            .ok_or_else(|| GuideError::ProblemNotFound {
                device_id: device_id.to_string(),
                problem_id: problem_id.to_string(),
            })
    }
}
