//! Command definitions and their handlers.
//!
//! Each subcommand has a clap `Args` struct that converts into the matching
//! core parameter type, keeping clap attributes out of `stepwise-core`:
//!
//! ```text
//! User Input → CLI Args (clap) → Core Params → Guide
//! ```

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Subcommand};
use stepwise_core::{models::Problem, params::*, Guide};

use crate::renderer::TerminalRenderer;

/// Import a problem from a JSON file
///
/// The file holds one problem with its steps. Importing a problem that
/// already exists for the device replaces it and all of its steps.
#[derive(Args)]
pub struct ImportProblemArgs {
    #[arg(help = "Path to the problem definition (JSON)")]
    pub file: PathBuf,
}

/// List problems
#[derive(Args)]
pub struct ListProblemsArgs {
    /// Only list problems of this device
    #[arg(short, long = "device")]
    pub device_id: Option<String>,
}

impl From<ListProblemsArgs> for ListProblems {
    fn from(val: ListProblemsArgs) -> Self {
        ListProblems {
            device_id: val.device_id,
        }
    }
}

/// Show a problem with all of its steps
#[derive(Args)]
pub struct ShowProblemArgs {
    #[arg(help = "Device the problem belongs to")]
    pub device_id: String,
    #[arg(help = "Problem identifier")]
    pub problem_id: String,
}

impl From<ShowProblemArgs> for ProblemRef {
    fn from(val: ShowProblemArgs) -> Self {
        ProblemRef {
            device_id: val.device_id,
            problem_id: val.problem_id,
        }
    }
}

/// Delete a problem permanently
#[derive(Args)]
pub struct DeleteProblemArgs {
    #[arg(help = "Device the problem belongs to")]
    pub device_id: String,
    #[arg(help = "Problem identifier")]
    pub problem_id: String,
    /// Confirm the deletion (required to prevent accidental deletion)
    #[arg(long)]
    pub confirm: bool,
}

impl From<DeleteProblemArgs> for DeleteProblem {
    fn from(val: DeleteProblemArgs) -> Self {
        DeleteProblem {
            device_id: val.device_id,
            problem_id: val.problem_id,
            confirmed: val.confirm,
        }
    }
}

#[derive(Subcommand)]
pub enum ProblemCommands {
    /// Import a problem from a JSON file
    #[command(alias = "i")]
    Import(ImportProblemArgs),
    /// List problems
    #[command(aliases = ["l", "ls"])]
    List(ListProblemsArgs),
    /// Show a problem with all of its steps
    #[command(alias = "s")]
    Show(ShowProblemArgs),
    /// Delete a problem permanently
    #[command(aliases = ["d", "rm"])]
    Delete(DeleteProblemArgs),
}

/// Start a diagnostic session on a problem's first step
#[derive(Args)]
pub struct StartSessionArgs {
    #[arg(help = "Device the problem belongs to")]
    pub device_id: String,
    #[arg(help = "Problem identifier")]
    pub problem_id: String,
    /// User the session is run for
    #[arg(short, long = "user")]
    pub user_id: Option<String>,
}

impl From<StartSessionArgs> for StartSession {
    fn from(val: StartSessionArgs) -> Self {
        StartSession {
            device_id: val.device_id,
            problem_id: val.problem_id,
            user_id: val.user_id,
        }
    }
}

/// Submit an action for the session's current step
#[derive(Args)]
pub struct SubmitActionArgs {
    #[arg(help = "Session token printed by `session start`")]
    pub session_id: String,
    #[arg(help = "Action performed, e.g. pressed, confirmed, entered")]
    pub action: String,
    /// Value entered or observed, for steps that ask for one
    #[arg(short, long)]
    pub value: Option<String>,
}

impl From<SubmitActionArgs> for SubmitAction {
    fn from(val: SubmitActionArgs) -> Self {
        SubmitAction {
            session_id: val.session_id,
            action: val.action,
            value: val.value,
        }
    }
}

/// Show a session, its history and the step it is waiting on
#[derive(Args)]
pub struct ShowSessionArgs {
    #[arg(help = "Session token")]
    pub session_id: String,
}

impl From<ShowSessionArgs> for SessionRef {
    fn from(val: ShowSessionArgs) -> Self {
        SessionRef {
            session_id: val.session_id,
        }
    }
}

/// List sessions, newest first
#[derive(Args)]
pub struct ListSessionsArgs {
    #[arg(short, long = "device")]
    pub device_id: Option<String>,
    #[arg(short, long = "problem")]
    pub problem_id: Option<String>,
    #[arg(short, long = "user")]
    pub user_id: Option<String>,
}

impl From<ListSessionsArgs> for ListSessions {
    fn from(val: ListSessionsArgs) -> Self {
        ListSessions {
            device_id: val.device_id,
            problem_id: val.problem_id,
            user_id: val.user_id,
        }
    }
}

#[derive(Subcommand)]
pub enum SessionCommands {
    /// Start a diagnostic session
    #[command(alias = "st")]
    Start(StartSessionArgs),
    /// Submit an action for the current step
    #[command(alias = "a")]
    Submit(SubmitActionArgs),
    /// Show a session
    #[command(alias = "s")]
    Show(ShowSessionArgs),
    /// List sessions
    #[command(aliases = ["l", "ls"])]
    List(ListSessionsArgs),
}

/// Runs commands against a [`Guide`] and renders the results.
pub struct Cli {
    guide: Guide,
    renderer: TerminalRenderer,
}

impl Cli {
    pub fn new(guide: Guide, renderer: TerminalRenderer) -> Self {
        Self { guide, renderer }
    }

    pub async fn handle_problem_command(&self, command: ProblemCommands) -> Result<()> {
        match command {
            ProblemCommands::Import(args) => self.import_problem(args).await,
            ProblemCommands::List(args) => self.list_problems(&args.into()).await,
            ProblemCommands::Show(args) => self.show_problem(&args.into()).await,
            ProblemCommands::Delete(args) => {
                let result = self
                    .guide
                    .delete_problem(&args.into())
                    .await
                    .context("Failed to delete problem")?;
                self.renderer.render(&result.to_string())
            }
        }
    }

    pub async fn handle_session_command(&self, command: SessionCommands) -> Result<()> {
        let view = match command {
            SessionCommands::Start(args) => self
                .guide
                .start_session(&args.into())
                .await
                .context("Failed to start session")?,
            SessionCommands::Submit(args) => self
                .guide
                .submit_action(&args.into())
                .await
                .context("Failed to submit action")?,
            SessionCommands::Show(args) => self
                .guide
                .get_session(&args.into())
                .await
                .context("Failed to show session")?,
            SessionCommands::List(args) => {
                let sessions = self
                    .guide
                    .list_sessions(&args.into())
                    .await
                    .context("Failed to list sessions")?;
                return self.renderer.render(&sessions.to_string());
            }
        };
        self.renderer.render(&view.to_string())
    }

    pub async fn list_problems(&self, params: &ListProblems) -> Result<()> {
        let summaries = self
            .guide
            .list_problems(params)
            .await
            .context("Failed to list problems")?;
        self.renderer.render(&summaries.to_string())
    }

    async fn import_problem(&self, args: ImportProblemArgs) -> Result<()> {
        let contents = std::fs::read_to_string(&args.file)
            .with_context(|| format!("Failed to read {}", args.file.display()))?;
        let problem: Problem = serde_json::from_str(&contents)
            .with_context(|| format!("Invalid problem definition in {}", args.file.display()))?;

        let result = self
            .guide
            .import_problem(problem)
            .await
            .context("Failed to import problem")?;
        self.renderer.render(&result.to_string())
    }

    async fn show_problem(&self, params: &ProblemRef) -> Result<()> {
        let problem = self
            .guide
            .get_problem(params)
            .await
            .context("Failed to show problem")?
            .ok_or_else(|| {
                anyhow!(
                    "Problem '{}' for device '{}' not found",
                    params.problem_id,
                    params.device_id
                )
            })?;
        self.renderer.render(&problem.to_string())
    }
}
