//! Diagnostic session aggregate.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use super::FailureKind;

/// A single user's run through a problem.
///
/// Only the session engine mutates a session; persistence stores and loads it
/// whole.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiagnosticSession {
    /// Storage row id, `None` until the session is first persisted
    pub id: Option<u64>,

    /// Client-correlatable token
    pub session_id: String,

    pub device_id: String,

    pub problem_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    /// Step awaiting an action, `None` once terminal
    pub current_step_id: Option<String>,

    pub completed_steps: u32,

    /// Problem step count captured at session start
    pub total_steps: u32,

    /// Step ids of every failed attempt, in order (duplicates kept)
    #[serde(default)]
    pub error_steps: Vec<String>,

    /// `None` while unresolved
    pub success: Option<bool>,

    /// Why the session ended in failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,

    /// Every submission applied to the session
    #[serde(default)]
    pub history: Vec<StepAttempt>,

    pub start_time: Timestamp,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<Timestamp>,

    /// Seconds between start and end, set on termination
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
}

impl DiagnosticSession {
    /// Creates an active, unsaved session positioned on `first_step_id`.
    pub fn new(
        session_id: impl Into<String>,
        device_id: impl Into<String>,
        problem_id: impl Into<String>,
        user_id: Option<String>,
        first_step_id: impl Into<String>,
        total_steps: u32,
    ) -> Self {
        Self {
            id: None,
            session_id: session_id.into(),
            device_id: device_id.into(),
            problem_id: problem_id.into(),
            user_id,
            current_step_id: Some(first_step_id.into()),
            completed_steps: 0,
            total_steps,
            error_steps: Vec::new(),
            success: None,
            failure_reason: None,
            history: Vec::new(),
            start_time: Timestamp::now(),
            end_time: None,
            duration: None,
        }
    }

    /// Derived lifecycle state.
    pub fn status(&self) -> SessionStatus {
        match self.success {
            None => SessionStatus::Active,
            Some(true) => SessionStatus::Completed,
            Some(false) => SessionStatus::Failed,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.success.is_some()
    }

    /// Number of recorded failures for `step_id`.
    pub fn failures_of(&self, step_id: &str) -> u32 {
        self.error_steps.iter().filter(|s| *s == step_id).count() as u32
    }

    /// Ends the session with the given outcome, stamping end time and
    /// duration.
    pub(crate) fn terminate(&mut self, success: bool, now: Timestamp) {
        self.current_step_id = None;
        self.success = Some(success);
        let end = now.max(self.start_time);
        self.end_time = Some(end);
        self.duration = Some((end.as_second() - self.start_time.as_second()).max(0) as u64);
    }
}

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Completed,
    Failed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::Completed => "completed",
            SessionStatus::Failed => "failed",
        }
    }

    /// Status with icon for display.
    pub fn with_icon(&self) -> &'static str {
        match self {
            SessionStatus::Active => "➤ Active",
            SessionStatus::Completed => "✓ Completed",
            SessionStatus::Failed => "✗ Failed",
        }
    }
}

/// One submission recorded in a session's history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StepAttempt {
    pub step_id: String,
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub passed: bool,
    /// Control action applied after a failed verdict
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control: Option<FailureKind>,
    pub reason: String,
    pub at: Timestamp,
}
