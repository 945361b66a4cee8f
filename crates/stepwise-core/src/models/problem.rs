//! Problem model definition and authoring validation.

use std::collections::HashSet;

use jiff::Timestamp;
#[cfg(feature = "schema")]
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{FailureKind, Step, ValidationRule};
use crate::{
    engine::condition::Condition,
    error::{GuideError, Result},
};

/// An authored troubleshooting procedure for a device.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct Problem {
    /// Identifier, unique per device
    pub id: String,

    /// Device the procedure applies to
    pub device_id: String,

    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Free-form grouping such as "connectivity" or "picture"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Ordered steps of the procedure
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Problem {
    /// Sum of the authored step estimates, in seconds.
    pub fn estimated_time(&self) -> u64 {
        self.steps.iter().map(|s| u64::from(s.estimated_time)).sum()
    }

    /// Stamps every step with this problem's identity and sorts them by step
    /// number.
    pub fn normalize(&mut self) {
        for step in &mut self.steps {
            step.problem_id = self.id.clone();
            step.device_id = self.device_id.clone();
        }
        self.steps.sort_by_key(|s| s.step_number);
    }

    /// Checks the authored content before it is stored.
    ///
    /// Steps are checked in the order given, so `step_number` must already be
    /// strictly increasing in the input.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(GuideError::invalid_input("id").with_reason("must not be empty"));
        }
        if self.device_id.trim().is_empty() {
            return Err(GuideError::invalid_input("device_id").with_reason("must not be empty"));
        }
        if self.title.trim().is_empty() {
            return Err(GuideError::invalid_input("title").with_reason("must not be empty"));
        }
        if self.steps.is_empty() {
            return Err(GuideError::invalid_input("steps")
                .with_reason("a problem needs at least one step"));
        }

        let mut ids = HashSet::new();
        let mut last_number = 0;
        for step in &self.steps {
            let field = |name: &str| format!("steps[{}].{name}", step.id);

            if step.id.trim().is_empty() {
                return Err(GuideError::invalid_input("steps.id").with_reason("must not be empty"));
            }
            if !ids.insert(step.id.as_str()) {
                return Err(GuideError::invalid_input(field("id"))
                    .with_reason("duplicate step id"));
            }
            if step.step_number == 0 || step.step_number <= last_number {
                return Err(GuideError::invalid_input(field("step_number"))
                    .with_reason("step numbers must be positive and strictly increasing"));
            }
            last_number = step.step_number;
            if step.instruction.trim().is_empty() {
                return Err(GuideError::invalid_input(field("instruction"))
                    .with_reason("must not be empty"));
            }
        }

        for step in &self.steps {
            Self::validate_step_rules(step, &ids)?;
        }
        Ok(())
    }

    fn validate_step_rules(step: &Step, ids: &HashSet<&str>) -> Result<()> {
        let field = |name: &str| format!("steps[{}].{name}", step.id);

        for rule in &step.validation_rules {
            if let ValidationRule::Pattern { value, .. } = rule {
                regex::Regex::new(value).map_err(|e| {
                    GuideError::invalid_input(field("validation_rules")).with_reason(e.to_string())
                })?;
            }
        }

        if let Some(expr) = &step.success_condition {
            Condition::parse(expr)?;
        }

        for action in &step.failure_actions {
            Condition::parse(&action.condition)?;
            match (action.action, &action.target) {
                (FailureKind::Branch, Some(target)) if ids.contains(target.as_str()) => {}
                (FailureKind::Branch, Some(target)) => {
                    return Err(GuideError::InvalidBranchTarget {
                        step_id: step.id.clone(),
                        target: target.clone(),
                    });
                }
                (FailureKind::Branch, None) => {
                    return Err(GuideError::invalid_input(field("failure_actions"))
                        .with_reason("branch requires a target"));
                }
                (_, Some(_)) => {
                    return Err(GuideError::invalid_input(field("failure_actions"))
                        .with_reason("only branch actions may carry a target"));
                }
                (_, None) => {}
            }
        }

        for next in &step.next_step_conditions {
            Condition::parse(&next.condition)?;
            if !ids.contains(next.next_step_id.as_str()) {
                return Err(GuideError::invalid_input(field("next_step_conditions"))
                    .with_reason(format!("unknown next step '{}'", next.next_step_id)));
            }
            if let Some(p) = next.probability {
                if !(0.0..=1.0).contains(&p) {
                    return Err(GuideError::invalid_input(field("next_step_conditions"))
                        .with_reason("probability must be within [0, 1]"));
                }
            }
        }
        Ok(())
    }
}

/// Lightweight listing entry for a stored problem.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProblemSummary {
    pub id: String,
    pub device_id: String,
    pub title: String,
    pub category: Option<String>,
    pub total_steps: u32,
    /// Sum of step estimates, in seconds
    pub estimated_time: u64,
    pub updated_at: Timestamp,
}
