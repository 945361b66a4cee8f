//! MCP tool handlers implementation

use std::sync::Arc;

use log::debug;
use rmcp::{
    handler::server::wrapper::Parameters,
    model::{CallToolResult, Content},
    ErrorData,
};
use schemars::JsonSchema;
use serde::Deserialize;
use stepwise_core::{models::Problem, params as core, Guide};

use super::errors::to_mcp_error;

/// Generic MCP wrapper for core parameter types.
///
/// Adds deserialization and schema generation on top of any core parameter
/// type without adding MCP concerns to `stepwise-core` itself.
#[derive(Debug, Deserialize)]
#[serde(transparent)]
pub struct McpParams<T>(T)
where
    T: JsonSchema;

impl<T> JsonSchema for McpParams<T>
where
    T: JsonSchema,
{
    fn schema_name() -> std::borrow::Cow<'static, str> {
        T::schema_name()
    }

    fn json_schema(g: &mut schemars::SchemaGenerator) -> schemars::Schema {
        T::json_schema(g)
    }
}

impl<T> AsRef<T> for McpParams<T>
where
    T: JsonSchema,
{
    fn as_ref(&self) -> &T {
        &self.0
    }
}

impl<T> McpParams<T>
where
    T: JsonSchema,
{
    pub fn into_inner(self) -> T {
        self.0
    }
}

pub type ImportProblem = McpParams<Problem>;
pub type ListProblems = McpParams<core::ListProblems>;
pub type ProblemRef = McpParams<core::ProblemRef>;
pub type StartSession = McpParams<core::StartSession>;
pub type SubmitAction = McpParams<core::SubmitAction>;
pub type SessionRef = McpParams<core::SessionRef>;
pub type ListSessions = McpParams<core::ListSessions>;

pub type McpResult = Result<CallToolResult, ErrorData>;

fn text(markdown: String) -> McpResult {
    Ok(CallToolResult::success(vec![Content::text(markdown)]))
}

/// Handler implementations for the MCP server
pub struct McpHandlers {
    guide: Arc<Guide>,
}

impl McpHandlers {
    pub fn new(guide: Arc<Guide>) -> Self {
        Self { guide }
    }

    pub async fn import_problem(&self, Parameters(params): Parameters<ImportProblem>) -> McpResult {
        let problem = params.into_inner();
        debug!("import_problem: {}/{}", problem.device_id, problem.id);

        let result = self
            .guide
            .import_problem(problem)
            .await
            .map_err(|e| to_mcp_error("Failed to import problem", &e))?;
        text(result.to_string())
    }

    pub async fn list_problems(&self, Parameters(params): Parameters<ListProblems>) -> McpResult {
        debug!("list_problems: {params:?}");

        let summaries = self
            .guide
            .list_problems(params.as_ref())
            .await
            .map_err(|e| to_mcp_error("Failed to list problems", &e))?;

        if summaries.is_empty() {
            return text("No problems found.".to_string());
        }
        text(format!("# Problems\n\n{summaries}"))
    }

    pub async fn show_problem(&self, Parameters(params): Parameters<ProblemRef>) -> McpResult {
        debug!("show_problem: {params:?}");
        let inner = params.as_ref();

        let problem = self
            .guide
            .get_problem(inner)
            .await
            .map_err(|e| to_mcp_error("Failed to show problem", &e))?;

        match problem {
            Some(problem) => text(problem.to_string()),
            None => Err(ErrorData::invalid_params(
                format!(
                    "Problem '{}' for device '{}' not found",
                    inner.problem_id, inner.device_id
                ),
                None,
            )),
        }
    }

    pub async fn start_session(&self, Parameters(params): Parameters<StartSession>) -> McpResult {
        debug!("start_session: {params:?}");

        let view = self
            .guide
            .start_session(params.as_ref())
            .await
            .map_err(|e| to_mcp_error("Failed to start session", &e))?;
        text(view.to_string())
    }

    pub async fn submit_action(&self, Parameters(params): Parameters<SubmitAction>) -> McpResult {
        debug!("submit_action: {params:?}");

        let view = self
            .guide
            .submit_action(params.as_ref())
            .await
            .map_err(|e| to_mcp_error("Failed to submit action", &e))?;
        text(view.to_string())
    }

    pub async fn show_session(&self, Parameters(params): Parameters<SessionRef>) -> McpResult {
        debug!("show_session: {params:?}");

        let view = self
            .guide
            .get_session(params.as_ref())
            .await
            .map_err(|e| to_mcp_error("Failed to show session", &e))?;
        text(view.to_string())
    }

    pub async fn list_sessions(&self, Parameters(params): Parameters<ListSessions>) -> McpResult {
        debug!("list_sessions: {params:?}");

        let sessions = self
            .guide
            .list_sessions(params.as_ref())
            .await
            .map_err(|e| to_mcp_error("Failed to list sessions", &e))?;
        text(sessions.to_string())
    }
}
