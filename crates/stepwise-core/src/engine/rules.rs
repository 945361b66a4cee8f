//! Rule evaluation: checks a submitted action/value against a step's
//! validation rules and success condition.

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{
    condition::{Condition, ConditionContext},
    predicates::PredicateRegistry,
};
use crate::models::{Step, ValidationRule};

/// Reason recorded when a success condition evaluates false.
pub const SUCCESS_CONDITION_NOT_MET: &str = "success condition not met";

/// Pass/fail result of validating a submission against a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub passed: bool,

    /// First rule that failed, if a rule caused the failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_rule: Option<ValidationRule>,

    pub reason: String,

    /// Name of a custom rule whose predicate is not registered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unresolved_rule: Option<String>,
}

impl Verdict {
    fn pass(reason: impl Into<String>) -> Self {
        Self {
            passed: true,
            failed_rule: None,
            reason: reason.into(),
            unresolved_rule: None,
        }
    }

    fn fail(rule: Option<&ValidationRule>, reason: impl Into<String>) -> Self {
        Self {
            passed: false,
            failed_rule: rule.cloned(),
            reason: reason.into(),
            unresolved_rule: None,
        }
    }
}

/// Builds the context conditions see for a submission on `step`.
pub fn submission_context(step: &Step, action: &str, value: Option<&str>) -> ConditionContext {
    ConditionContext::new()
        .with("action", action)
        .with("value", value.unwrap_or_default())
        .with("step", step.id.as_str())
}

/// Validates a submission against `step`.
///
/// Rules run in list order and the first failure is reported. A step with
/// neither rules nor a success condition accepts any non-empty action.
pub fn evaluate(
    step: &Step,
    action: &str,
    value: Option<&str>,
    predicates: &PredicateRegistry,
) -> Verdict {
    if step.validation_rules.is_empty() && step.success_condition.is_none() {
        return if action.trim().is_empty() {
            Verdict::fail(None, "no action submitted")
        } else {
            Verdict::pass("no validation required")
        };
    }

    let ctx = submission_context(step, action, value);
    let submitted = value.unwrap_or_default();

    for rule in &step.validation_rules {
        match rule {
            ValidationRule::Required { message } => {
                if submitted.trim().is_empty() {
                    return Verdict::fail(Some(rule), reason_or(message, "a value is required"));
                }
            }
            ValidationRule::Pattern { value: pattern, message } => match Regex::new(pattern) {
                Ok(re) if re.is_match(submitted) => {}
                Ok(_) => {
                    return Verdict::fail(
                        Some(rule),
                        reason_or(message, "value does not match the expected format"),
                    );
                }
                Err(e) => {
                    return Verdict::fail(Some(rule), format!("invalid pattern '{pattern}': {e}"));
                }
            },
            ValidationRule::Custom { value: name, message } => match predicates.lookup(name) {
                Some(predicate) if predicate(&ctx) => {}
                Some(_) => {
                    return Verdict::fail(Some(rule), reason_or(message, "custom check failed"));
                }
                None => {
                    let mut verdict = Verdict::fail(
                        Some(rule),
                        format!("custom rule '{name}' is not registered"),
                    );
                    verdict.unresolved_rule = Some(name.clone());
                    return verdict;
                }
            },
        }
    }

    if let Some(expression) = &step.success_condition {
        let met = Condition::parse(expression)
            .and_then(|condition| condition.evaluate(&ctx, predicates));
        match met {
            Ok(true) => {}
            Ok(false) => return Verdict::fail(None, SUCCESS_CONDITION_NOT_MET),
            Err(e) => return Verdict::fail(None, format!("{SUCCESS_CONDITION_NOT_MET}: {e}")),
        }
    }

    Verdict::pass("all checks passed")
}

fn reason_or(message: &str, fallback: &str) -> String {
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ActionType;

    fn step(rules: Vec<ValidationRule>, success_condition: Option<&str>) -> Step {
        Step {
            id: "s1".to_string(),
            problem_id: "no-signal".to_string(),
            device_id: "tv".to_string(),
            step_number: 1,
            instruction: "Press the input button".to_string(),
            action_type: ActionType::Input,
            required_action: None,
            validation_rules: rules,
            success_condition: success_condition.map(String::from),
            failure_actions: vec![],
            next_step_conditions: vec![],
            estimated_time: 30,
        }
    }

    fn required() -> ValidationRule {
        ValidationRule::Required {
            message: "Enter the code shown on screen".to_string(),
        }
    }

    #[test]
    fn test_permissive_default() {
        let registry = PredicateRegistry::new();
        let s = step(vec![], None);
        for _ in 0..3 {
            let verdict = evaluate(&s, "pressed", None, &registry);
            assert!(verdict.passed);
            assert!(verdict.failed_rule.is_none());
        }
        assert!(!evaluate(&s, "  ", None, &registry).passed);
    }

    #[test]
    fn test_required_rule_fails_on_empty_value() {
        let registry = PredicateRegistry::new();
        let s = step(vec![required()], None);
        for value in [None, Some(""), Some("   ")] {
            let verdict = evaluate(&s, "submit", value, &registry);
            assert!(!verdict.passed);
            assert_eq!(verdict.failed_rule, Some(required()));
            assert_eq!(verdict.reason, "Enter the code shown on screen");
        }
        assert!(evaluate(&s, "submit", Some("1234"), &registry).passed);
    }

    #[test]
    fn test_fail_fast_reports_first_failing_rule() {
        let registry = PredicateRegistry::new();
        let pattern = ValidationRule::Pattern {
            value: "^[0-9]{4}$".to_string(),
            message: "Four digits".to_string(),
        };
        let custom = ValidationRule::Custom {
            value: "missing".to_string(),
            message: String::new(),
        };
        let s = step(vec![pattern.clone(), custom], None);

        let verdict = evaluate(&s, "submit", Some("12a4"), &registry);
        assert_eq!(verdict.failed_rule, Some(pattern));
        assert_eq!(verdict.reason, "Four digits");
        assert!(verdict.unresolved_rule.is_none());
    }

    #[test]
    fn test_unresolved_custom_rule_fails_closed() {
        let registry = PredicateRegistry::new();
        let s = step(
            vec![ValidationRule::Custom {
                value: "signal_ok".to_string(),
                message: "No signal".to_string(),
            }],
            None,
        );
        let verdict = evaluate(&s, "check", Some("anything"), &registry);
        assert!(!verdict.passed);
        assert_eq!(verdict.unresolved_rule.as_deref(), Some("signal_ok"));
    }

    #[test]
    fn test_custom_rule_uses_registry() {
        let registry = PredicateRegistry::with_builtins();
        let s = step(
            vec![ValidationRule::Custom {
                value: "affirmative".to_string(),
                message: "Answer yes once the light is green".to_string(),
            }],
            None,
        );
        assert!(evaluate(&s, "answer", Some("yes"), &registry).passed);
        let verdict = evaluate(&s, "answer", Some("no"), &registry);
        assert_eq!(verdict.reason, "Answer yes once the light is green");
    }

    #[test]
    fn test_success_condition_checked_after_rules() {
        let registry = PredicateRegistry::new();
        let s = step(vec![required()], Some("value == HDMI1"));

        let verdict = evaluate(&s, "select", Some("HDMI2"), &registry);
        assert!(!verdict.passed);
        assert!(verdict.failed_rule.is_none());
        assert_eq!(verdict.reason, SUCCESS_CONDITION_NOT_MET);

        assert!(evaluate(&s, "select", Some("HDMI1"), &registry).passed);

        // rules short-circuit before the condition is consulted
        let verdict = evaluate(&s, "select", None, &registry);
        assert_eq!(verdict.failed_rule, Some(required()));
    }

    #[test]
    fn test_malformed_success_condition_fails_closed() {
        let registry = PredicateRegistry::new();
        let s = step(vec![], Some("value =="));
        let verdict = evaluate(&s, "select", Some("x"), &registry);
        assert!(!verdict.passed);
        assert!(verdict.reason.starts_with(SUCCESS_CONDITION_NOT_MET));
    }
}
