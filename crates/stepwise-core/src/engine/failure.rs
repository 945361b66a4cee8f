//! Failure policy: decides the control action after a failed verdict.

use log::debug;
use serde::{Deserialize, Serialize};

use super::{
    condition::{matches_lenient, ConditionContext},
    predicates::PredicateRegistry,
    rules::Verdict,
};
use crate::{
    error::GuideError,
    models::{DiagnosticSession, FailureKind, Step},
};

/// What the session does after a failed verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ControlAction {
    /// Stay on the same step
    Retry,
    /// Move on as if the step had passed
    Skip,
    /// Return to the problem's first step
    Restart,
    /// Jump to the named step
    Branch { target: String },
    /// End the session as failed
    Abort { reason: String },
}

impl ControlAction {
    pub fn kind(&self) -> FailureKind {
        match self {
            ControlAction::Retry => FailureKind::Retry,
            ControlAction::Skip => FailureKind::Skip,
            ControlAction::Restart => FailureKind::Restart,
            ControlAction::Branch { .. } => FailureKind::Branch,
            ControlAction::Abort { .. } => FailureKind::Abort,
        }
    }
}

/// A resolved control action plus the authored message to show, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureDecision {
    pub action: ControlAction,
    pub message: Option<String>,
}

/// Adds the failure fields (`reason`, `attempts`, `completed`, `total`) to a
/// submission context. `attempts` counts failures recorded before this one.
pub fn failure_context(
    submission: &ConditionContext,
    step: &Step,
    verdict: &Verdict,
    session: &DiagnosticSession,
) -> ConditionContext {
    submission
        .clone()
        .with("reason", verdict.reason.as_str())
        .with("attempts", session.failures_of(&step.id))
        .with("completed", session.completed_steps)
        .with("total", session.total_steps)
}

/// Resolves failed verdicts against a step's authored failure actions.
#[derive(Debug, Clone, Copy)]
pub struct FailurePolicy<'a> {
    predicates: &'a PredicateRegistry,
    max_retries: u32,
}

impl<'a> FailurePolicy<'a> {
    pub fn new(predicates: &'a PredicateRegistry, max_retries: u32) -> Self {
        Self {
            predicates,
            max_retries,
        }
    }

    /// Picks the control action for a failed submission.
    ///
    /// The first failure action whose condition matches wins; with no match
    /// the default is `retry`. Once the step has already failed
    /// `max_retries` times, every non-abort decision becomes an abort.
    pub fn resolve(
        &self,
        step: &Step,
        verdict: &Verdict,
        session: &DiagnosticSession,
        submission: &ConditionContext,
    ) -> FailureDecision {
        let ctx = failure_context(submission, step, verdict, session);
        let attempts = session.failures_of(&step.id);

        let matched = step
            .failure_actions
            .iter()
            .find(|fa| matches_lenient(&fa.condition, &ctx, self.predicates));

        let (action, message) = match matched {
            Some(fa) => {
                let action = match fa.action {
                    FailureKind::Retry => ControlAction::Retry,
                    FailureKind::Skip => ControlAction::Skip,
                    FailureKind::Restart => ControlAction::Restart,
                    FailureKind::Abort => ControlAction::Abort {
                        reason: fa.message.clone().unwrap_or_else(|| verdict.reason.clone()),
                    },
                    FailureKind::Branch => match &fa.target {
                        Some(target) => ControlAction::Branch {
                            target: target.clone(),
                        },
                        None => ControlAction::Abort {
                            reason: GuideError::InvalidBranchTarget {
                                step_id: step.id.clone(),
                                target: String::new(),
                            }
                            .to_string(),
                        },
                    },
                };
                (action, fa.message.clone())
            }
            None => (ControlAction::Retry, None),
        };

        let action = match action {
            ControlAction::Abort { .. } => action,
            _ if attempts >= self.max_retries => ControlAction::Abort {
                reason: GuideError::MaxRetriesExceeded {
                    step_id: step.id.clone(),
                    attempts: attempts + 1,
                }
                .to_string(),
            },
            _ => action,
        };

        debug!(
            "Step '{}' failed ({}), prior failures {attempts}: {}",
            step.id,
            verdict.reason,
            action.kind().as_str()
        );

        FailureDecision { action, message }
    }
}
