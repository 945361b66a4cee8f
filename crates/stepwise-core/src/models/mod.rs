//! Data models for problems, steps and diagnostic sessions.
//!
//! Display implementations live in [`crate::display`].

pub mod problem;
pub mod session;
pub mod step;

#[cfg(test)]
mod tests;

pub use problem::{Problem, ProblemSummary};
pub use session::{DiagnosticSession, SessionStatus, StepAttempt};
pub use step::{
    ActionType, FailureAction, FailureKind, NextStepCondition, Step, ValidationRule,
};
