//! Step model definition and the declarative rule lists it carries.

use std::str::FromStr;

#[cfg(feature = "schema")]
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One instruction/action unit within a problem's procedure.
///
/// Steps are authored content. The engine reads them through a
/// [`StepCatalog`](crate::catalog::StepCatalog) and never mutates them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct Step {
    /// Identifier, unique within the problem
    pub id: String,

    /// ID of the owning problem
    #[serde(default)]
    pub problem_id: String,

    /// ID of the device the problem belongs to
    #[serde(default)]
    pub device_id: String,

    /// Position in the default sequential order (strictly increasing, gaps
    /// allowed)
    pub step_number: u32,

    /// What the user is asked to do
    pub instruction: String,

    /// Kind of interaction the step expects
    #[serde(default)]
    pub action_type: ActionType,

    /// Expected action token, shown to the user as a hint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_action: Option<String>,

    /// Rules checked in order against the submitted value
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validation_rules: Vec<ValidationRule>,

    /// Condition evaluated after all rules pass
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_condition: Option<String>,

    /// Failure handling, first matching entry wins
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failure_actions: Vec<FailureAction>,

    /// Routing after a successful submission
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub next_step_conditions: Vec<NextStepCondition>,

    /// Expected time to carry out the step, in seconds
    #[serde(default)]
    pub estimated_time: u32,
}

/// Kind of interaction a step asks for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    ButtonPress,
    Navigation,
    Wait,
    Check,
    Input,
    Selection,
    #[default]
    Confirmation,
    Custom,
}

impl ActionType {
    /// Storage string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::ButtonPress => "button_press",
            ActionType::Navigation => "navigation",
            ActionType::Wait => "wait",
            ActionType::Check => "check",
            ActionType::Input => "input",
            ActionType::Selection => "selection",
            ActionType::Confirmation => "confirmation",
            ActionType::Custom => "custom",
        }
    }
}

impl FromStr for ActionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "button_press" => Ok(ActionType::ButtonPress),
            "navigation" => Ok(ActionType::Navigation),
            "wait" => Ok(ActionType::Wait),
            "check" => Ok(ActionType::Check),
            "input" => Ok(ActionType::Input),
            "selection" => Ok(ActionType::Selection),
            "confirmation" => Ok(ActionType::Confirmation),
            "custom" => Ok(ActionType::Custom),
            _ => Err(format!("Invalid action type: {s}")),
        }
    }
}

/// A single validation rule, tagged by `type`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ValidationRule {
    /// Fails when the submitted value is empty or absent
    Required { message: String },
    /// Fails when the submitted value does not match the regular expression
    Pattern { value: String, message: String },
    /// Delegates to the registered predicate named by `value`
    Custom { value: String, message: String },
}

impl ValidationRule {
    /// Message shown to the user when the rule fails.
    pub fn message(&self) -> &str {
        match self {
            ValidationRule::Required { message }
            | ValidationRule::Pattern { message, .. }
            | ValidationRule::Custom { message, .. } => message,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ValidationRule::Required { .. } => "required",
            ValidationRule::Pattern { .. } => "pattern",
            ValidationRule::Custom { .. } => "custom",
        }
    }
}

/// What to do when a step's verdict is a failure.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    Retry,
    Skip,
    Restart,
    Branch,
    Abort,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Retry => "retry",
            FailureKind::Skip => "skip",
            FailureKind::Restart => "restart",
            FailureKind::Branch => "branch",
            FailureKind::Abort => "abort",
        }
    }
}

/// An authored failure-handling entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct FailureAction {
    /// Condition matched against the failure context
    pub condition: String,

    /// Control action taken when the condition matches
    pub action: FailureKind,

    /// Branch target; required for `branch`, ignored otherwise
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    /// Message surfaced to the user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// An authored routing entry evaluated after a successful verdict.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct NextStepCondition {
    pub condition: String,

    pub next_step_id: String,

    /// Relative weight in [0, 1]; absent means deterministic
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probability: Option<f64>,
}

impl NextStepCondition {
    /// Whether this entry takes part in weighted selection.
    pub fn is_probabilistic(&self) -> bool {
        self.probability.is_some()
    }
}
