//! Result wrapper types for displaying operation outcomes.

use std::fmt;

use serde::Serialize;

use crate::{
    engine::SessionEvent,
    models::{DiagnosticSession, Problem, Step},
};

/// Outcome of importing a problem.
#[derive(Debug)]
pub struct ImportResult {
    pub problem: Problem,
}

impl ImportResult {
    pub fn new(problem: Problem) -> Self {
        Self { problem }
    }
}

impl fmt::Display for ImportResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Imported problem '{}' for device '{}' with {} steps",
            self.problem.id,
            self.problem.device_id,
            self.problem.steps.len()
        )?;
        writeln!(f)?;
        write!(f, "{}", self.problem)
    }
}

/// Outcome of deleting a problem.
#[derive(Debug)]
pub struct DeleteResult {
    pub device_id: String,
    pub problem_id: String,
}

impl DeleteResult {
    pub fn new(device_id: impl Into<String>, problem_id: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            problem_id: problem_id.into(),
        }
    }
}

impl fmt::Display for DeleteResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Deleted problem '{}' for device '{}'",
            self.problem_id, self.device_id
        )
    }
}

/// A session together with the step it is waiting on.
///
/// Returned by session operations; `outcome` is set when the view is the
/// result of a submission.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub session: DiagnosticSession,
    /// Step awaiting the next action, `None` once the session has ended
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_step: Option<Step>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<SessionEvent>,
}

impl fmt::Display for SessionView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(outcome) = &self.outcome {
            writeln!(f, "{outcome}")?;
            writeln!(f)?;
        }
        write!(f, "{}", self.session)?;
        if let Some(step) = &self.current_step {
            writeln!(f, "\n## Next step")?;
            writeln!(f)?;
            write!(f, "{step}")?;
        }
        Ok(())
    }
}
