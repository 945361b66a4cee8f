//! Display implementations for domain models.
//!
//! All output is markdown so the CLI renderer and MCP clients can present it
//! directly.

use std::fmt;

use super::datetime::{LocalDateTime, Seconds};
use crate::{
    engine::SessionEvent,
    models::{
        ActionType, DiagnosticSession, FailureKind, Problem, ProblemSummary, SessionStatus, Step,
        StepAttempt, ValidationRule,
    },
};

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for ValidationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationRule::Required { message } => write!(f, "required: {message}"),
            ValidationRule::Pattern { value, message } => {
                write!(f, "pattern `{value}`: {message}")
            }
            ValidationRule::Custom { value, message } => write!(f, "custom `{value}`: {message}"),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "### {}. {} ({})", self.step_number, self.instruction, self.id)?;
        writeln!(f)?;
        writeln!(f, "- Action: {}", self.action_type)?;
        if let Some(expected) = &self.required_action {
            writeln!(f, "- Expected: {expected}")?;
        }
        if self.estimated_time > 0 {
            writeln!(f, "- Estimated time: {}", Seconds(u64::from(self.estimated_time)))?;
        }
        writeln!(f)?;

        if !self.validation_rules.is_empty() || self.success_condition.is_some() {
            writeln!(f, "#### Checks")?;
            writeln!(f)?;
            for rule in &self.validation_rules {
                writeln!(f, "- {rule}")?;
            }
            if let Some(condition) = &self.success_condition {
                writeln!(f, "- success when `{condition}`")?;
            }
            writeln!(f)?;
        }

        if !self.failure_actions.is_empty() {
            writeln!(f, "#### On failure")?;
            writeln!(f)?;
            for action in &self.failure_actions {
                write!(f, "- `{}` → {}", action.condition, action.action)?;
                if let Some(target) = &action.target {
                    write!(f, " {target}")?;
                }
                writeln!(f)?;
            }
            writeln!(f)?;
        }

        if !self.next_step_conditions.is_empty() {
            writeln!(f, "#### Next")?;
            writeln!(f)?;
            for next in &self.next_step_conditions {
                write!(f, "- `{}` → {}", next.condition, next.next_step_id)?;
                if let Some(p) = next.probability {
                    write!(f, " (p={p})")?;
                }
                writeln!(f)?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# {} ({}/{})", self.title, self.device_id, self.id)?;
        writeln!(f)?;
        if let Some(category) = &self.category {
            writeln!(f, "- Category: {category}")?;
        }
        writeln!(f, "- Steps: {}", self.steps.len())?;
        writeln!(f, "- Estimated time: {}", Seconds(self.estimated_time()))?;

        if let Some(desc) = &self.description {
            writeln!(f)?;
            writeln!(f, "{desc}")?;
        }

        if self.steps.is_empty() {
            writeln!(f, "\nNo steps in this problem.")?;
        } else {
            writeln!(f, "\n## Steps")?;
            writeln!(f)?;
            for step in &self.steps {
                write!(f, "{step}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for ProblemSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "## {} ({}/{})", self.title, self.device_id, self.id)?;
        writeln!(f)?;
        if let Some(category) = &self.category {
            writeln!(f, "- **Category**: {category}")?;
        }
        writeln!(
            f,
            "- **Steps**: {} (~{})",
            self.total_steps,
            Seconds(self.estimated_time)
        )?;
        writeln!(f, "- **Updated**: {}", LocalDateTime(&self.updated_at))?;
        writeln!(f)
    }
}

impl fmt::Display for StepAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = if self.passed { "✓" } else { "✗" };
        write!(f, "{mark} `{}` {}", self.step_id, self.action)?;
        if let Some(value) = &self.value {
            write!(f, " = {value}")?;
        }
        write!(f, ": {}", self.reason)?;
        if let Some(control) = self.control {
            write!(f, " [{control}]")?;
        }
        Ok(())
    }
}

impl fmt::Display for DiagnosticSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# Session {} ({})", self.session_id, self.status().with_icon())?;
        writeln!(f)?;
        writeln!(f, "- Problem: {}/{}", self.device_id, self.problem_id)?;
        if let Some(user) = &self.user_id {
            writeln!(f, "- User: {user}")?;
        }
        writeln!(
            f,
            "- Progress: {}/{}",
            self.completed_steps, self.total_steps
        )?;
        if let Some(step) = &self.current_step_id {
            writeln!(f, "- Current step: {step}")?;
        }
        if !self.error_steps.is_empty() {
            writeln!(f, "- Failed attempts: {}", self.error_steps.len())?;
        }
        writeln!(f, "- Started: {}", LocalDateTime(&self.start_time))?;
        if let Some(end) = &self.end_time {
            writeln!(f, "- Ended: {}", LocalDateTime(end))?;
        }
        if let Some(duration) = self.duration {
            writeln!(f, "- Duration: {}", Seconds(duration))?;
        }
        if let Some(reason) = &self.failure_reason {
            writeln!(f)?;
            writeln!(f, "**Failure**: {reason}")?;
        }

        if !self.history.is_empty() {
            writeln!(f, "\n## History")?;
            writeln!(f)?;
            for attempt in &self.history {
                writeln!(f, "- {attempt}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for SessionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionEvent::Advanced { from, to } => {
                write!(f, "Step `{from}` passed, moving on to `{to}`")
            }
            SessionEvent::Completed { step_id } => {
                write!(f, "Step `{step_id}` passed, the problem is resolved")
            }
            SessionEvent::Retrying {
                step_id,
                reason,
                message,
            } => {
                write!(f, "Step `{step_id}` failed: {reason}")?;
                if let Some(message) = message {
                    write!(f, ". {message}")?;
                }
                Ok(())
            }
            SessionEvent::Skipped { from, to: Some(to) } => {
                write!(f, "Step `{from}` failed and was skipped, moving on to `{to}`")
            }
            SessionEvent::Skipped { from, to: None } => {
                write!(f, "Step `{from}` failed and was skipped, no steps remain")
            }
            SessionEvent::Restarted { from, to } => {
                write!(f, "Step `{from}` failed, restarting from `{to}`")
            }
            SessionEvent::Branched { from, to } => {
                write!(f, "Step `{from}` failed, continuing with `{to}`")
            }
            SessionEvent::Aborted { step_id, reason } => {
                write!(f, "Session aborted at step `{step_id}`: {reason}")
            }
        }
    }
}
