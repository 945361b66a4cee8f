//! MCP server implementation for Stepwise
//!
//! Exposes the guide's problem and session operations as MCP tools so an AI
//! assistant can walk a user through a troubleshooting procedure.

use std::{future::Future, sync::Arc};

use anyhow::Result;
use log::{debug, error, info};
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{Implementation, ProtocolVersion, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router, ServerHandler,
};
use stepwise_core::Guide;
use tokio::signal::unix::{signal, SignalKind};

pub mod errors;
pub mod handlers;

pub use handlers::{
    ImportProblem, ListProblems, ListSessions, McpResult, ProblemRef, SessionRef, StartSession,
    SubmitAction,
};

/// MCP server for Stepwise
#[derive(Clone)]
pub struct StepwiseMcpServer {
    guide: Arc<Guide>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl StepwiseMcpServer {
    pub fn new(guide: Guide) -> Self {
        Self {
            guide: Arc::new(guide),
            tool_router: Self::tool_router(),
        }
    }

    fn handlers(&self) -> handlers::McpHandlers {
        handlers::McpHandlers::new(Arc::clone(&self.guide))
    }

    #[tool(
        name = "import_problem",
        description = "Import a troubleshooting problem for a device: an id, device_id, title and an ordered list of steps, each with instruction, step_number, optional validation_rules, success_condition, failure_actions and next_step_conditions. Replaces an existing problem with the same device_id and id."
    )]
    async fn import_problem(&self, params: Parameters<ImportProblem>) -> McpResult {
        self.handlers().import_problem(params).await
    }

    #[tool(
        name = "list_problems",
        description = "List stored troubleshooting problems with their step counts and estimated time. Pass device_id to restrict the list to one device."
    )]
    async fn list_problems(&self, params: Parameters<ListProblems>) -> McpResult {
        self.handlers().list_problems(params).await
    }

    #[tool(
        name = "show_problem",
        description = "Show a problem with every step, including its checks, failure handling and routing. Identify the problem by device_id and problem_id."
    )]
    async fn show_problem(&self, params: Parameters<ProblemRef>) -> McpResult {
        self.handlers().show_problem(params).await
    }

    #[tool(
        name = "start_session",
        description = "Start a diagnostic session for a device problem. Returns the session token and the first step to show the user."
    )]
    async fn start_session(&self, params: Parameters<StartSession>) -> McpResult {
        self.handlers().start_session(params).await
    }

    #[tool(
        name = "submit_action",
        description = "Submit what the user did for the session's current step: an action (e.g. pressed, confirmed, entered) and, for steps that ask for one, the value they entered or observed. Returns what happened (advanced, retry, skipped, restarted, branched, completed or aborted) and the next step."
    )]
    async fn submit_action(&self, params: Parameters<SubmitAction>) -> McpResult {
        self.handlers().submit_action(params).await
    }

    #[tool(
        name = "show_session",
        description = "Show a session's status, progress, history of submitted actions and the step it is waiting on."
    )]
    async fn show_session(&self, params: Parameters<SessionRef>) -> McpResult {
        self.handlers().show_session(params).await
    }

    #[tool(
        name = "list_sessions",
        description = "List sessions newest first, optionally filtered by device_id, problem_id or user_id."
    )]
    async fn list_sessions(&self, params: Parameters<ListSessions>) -> McpResult {
        self.handlers().list_sessions(params).await
    }
}

#[tool_handler(router = self.tool_router)]
impl ServerHandler for StepwiseMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "stepwise".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Implementation::from_build_env()
            },
            instructions: Some(r#"Stepwise guides a user through a device troubleshooting procedure one step at a time.

## Core Concepts
- **Problems**: an authored procedure for a device, made of ordered steps
- **Steps**: an instruction plus checks on what the user reports; failed checks retry, skip, restart, branch or abort
- **Sessions**: one user's run through a problem, identified by a session token

## Workflow
1. Find the procedure with `list_problems` (filter by device_id) and review it with `show_problem`
2. Start a session with `start_session` and relay the first step's instruction to the user
3. After the user acts, call `submit_action` with what they did and any value they read or entered
4. Relay the outcome and the next step; repeat until the session is completed or aborted
5. Use `show_session` to resume a session or review its history"#.to_string()),
        }
    }
}

/// Run the MCP server with stdio transport
pub async fn run_stdio_server(server: StepwiseMcpServer) -> Result<()> {
    use rmcp::{transport::stdio, ServiceExt};

    info!("Starting Stepwise MCP server on stdio");
    debug!(
        "Server created with {} tools",
        server.tool_router.list_all().len()
    );

    let service = server.serve(stdio()).await.inspect_err(|e| {
        error!("serving error: {e:?}");
    })?;

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    tokio::select! {
        result = service.waiting() => {
            match result {
                Ok(_) => info!("MCP server stopped normally"),
                Err(e) => error!("MCP server error: {e:?}"),
            }
        }
        _ = sigint.recv() => {
            info!("Received SIGINT, shutting down gracefully...");
        }
        _ = sigterm.recv() => {
            info!("Received SIGTERM, shutting down gracefully...");
        }
    }

    info!("MCP server shutdown complete");
    Ok(())
}
