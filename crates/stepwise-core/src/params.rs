//! Parameter structures for Stepwise operations
//!
//! These structures are shared by every interface (CLI, MCP) and carry no
//! framework-specific derives beyond serde. Interface layers wrap or convert
//! into them:
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐    ┌─────────────────┐
//! │   CLI Args      │    │   MCP Params    │    │  Core Params    │
//! │  (clap derives) │───▶│ (serde derives) │───▶│ (minimal deps)  │
//! └─────────────────┘    └─────────────────┘    └─────────────────┘
//! ```
//!
//! JSON schema generation is available behind the `schema` feature for the
//! MCP server.

#[cfg(feature = "schema")]
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Identifies a problem of a device.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct ProblemRef {
    /// Device the problem belongs to
    pub device_id: String,
    /// Problem identifier, unique per device
    pub problem_id: String,
}

/// Parameters for listing problems.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct ListProblems {
    /// Only list problems of this device
    #[serde(default)]
    pub device_id: Option<String>,
}

/// Parameters for deleting a problem.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct DeleteProblem {
    pub device_id: String,
    pub problem_id: String,
    /// Must be true for the deletion to go ahead
    #[serde(default)]
    pub confirmed: bool,
}

/// Parameters for starting a diagnostic session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct StartSession {
    pub device_id: String,
    pub problem_id: String,
    /// Optional user the session is attributed to
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Parameters for submitting an action for a session's current step.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct SubmitAction {
    /// Session token returned when the session was started
    pub session_id: String,
    /// Action the user performed, e.g. "pressed" or "confirmed"
    pub action: String,
    /// Value entered or observed, for steps that ask for one
    #[serde(default)]
    pub value: Option<String>,
}

/// Identifies a session by its token.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct SessionRef {
    pub session_id: String,
}

/// Parameters for listing sessions. All filters are optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct ListSessions {
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default)]
    pub problem_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}
