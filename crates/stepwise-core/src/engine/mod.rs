//! Diagnostic step execution engine.
//!
//! A submission for the session's current step flows through four pieces:
//!
//! ```text
//! ┌─────────────────┐  pass   ┌─────────────────┐
//! │  Rule Evaluator │────────▶│   Transition    │──┐
//! │   (rules)       │         │   (transition)  │  │   ┌─────────────────┐
//! └─────────────────┘         └─────────────────┘  ├──▶│ Session Engine  │
//!          │ fail             ┌─────────────────┐  │   │   (session)     │
//!          └─────────────────▶│ Failure Policy  │──┘   └─────────────────┘
//!                             │   (failure)     │
//!                             └─────────────────┘
//! ```
//!
//! - [`rules`]: checks the submission against validation rules and the
//!   success condition, producing a [`Verdict`]
//! - [`failure`]: turns a failed verdict into a [`ControlAction`]
//! - [`transition`]: picks the next step after a pass (or a skip)
//! - [`session`]: owns the [`DiagnosticSession`](crate::models::DiagnosticSession)
//!   update and terminal-state rules
//!
//! Conditions and custom rules are interpreted by [`condition`] and resolved
//! through a [`PredicateRegistry`]. Randomness for weighted routing is always
//! passed in by the caller.
//!
//! # Example
//!
//! ```rust
//! use rand::{rngs::StdRng, SeedableRng};
//! use stepwise_core::{
//!     catalog::MemoryCatalog,
//!     config::EngineConfig,
//!     engine::{PredicateRegistry, SessionEngine, SessionEvent},
//!     models::{ActionType, Problem, Step},
//! };
//!
//! let step = |id: &str, n: u32| Step {
//!     id: id.to_string(),
//!     problem_id: String::new(),
//!     device_id: String::new(),
//!     step_number: n,
//!     instruction: format!("Do {id}"),
//!     action_type: ActionType::ButtonPress,
//!     required_action: None,
//!     validation_rules: vec![],
//!     success_condition: None,
//!     failure_actions: vec![],
//!     next_step_conditions: vec![],
//!     estimated_time: 0,
//! };
//! let catalog = MemoryCatalog::new().with_problem(Problem {
//!     id: "no-picture".to_string(),
//!     device_id: "tv".to_string(),
//!     title: "No picture".to_string(),
//!     description: None,
//!     category: None,
//!     steps: vec![step("power", 1), step("input", 2)],
//! });
//! let predicates = PredicateRegistry::with_builtins();
//! let config = EngineConfig::default();
//! let engine = SessionEngine::new(&catalog, &predicates, &config);
//! let mut rng = StdRng::seed_from_u64(0);
//!
//! let session = engine.start("token", "tv", "no-picture", None).unwrap();
//! let outcome = engine.submit_action(&session, "pressed", None, &mut rng).unwrap();
//! assert_eq!(outcome.session.current_step_id.as_deref(), Some("input"));
//! assert!(matches!(outcome.event, SessionEvent::Advanced { .. }));
//! ```

pub mod condition;
pub mod failure;
pub mod predicates;
pub mod rules;
pub mod session;
pub mod transition;

#[cfg(test)]
mod tests;

pub use condition::{Condition, ConditionContext, ContextValue};
pub use failure::{ControlAction, FailureDecision, FailurePolicy};
pub use predicates::{Predicate, PredicateRegistry};
pub use rules::{evaluate, Verdict};
pub use session::{SessionEngine, SessionEvent, Submission};
pub use transition::select_next;
