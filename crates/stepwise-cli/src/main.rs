//! Stepwise CLI Application
//!
//! Command-line interface and MCP server for the Stepwise troubleshooting
//! engine.

mod args;
mod cli;
mod mcp;
mod renderer;

use anyhow::{Context, Result};
use args::{Args, Commands};
use clap::Parser;
use cli::Cli;
use log::info;
use mcp::{run_stdio_server, StepwiseMcpServer};
use renderer::TerminalRenderer;
use stepwise_core::{params::ListProblems, GuideBuilder};
use Commands::*;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let Args {
        database_file,
        config,
        max_retries,
        no_color,
        command,
    } = Args::parse();

    let guide = GuideBuilder::new()
        .with_database_path(database_file)
        .with_config_path(config)
        .with_max_retries(max_retries)
        .build()
        .await
        .context("Failed to initialize guide")?;

    let renderer = TerminalRenderer::new(!no_color);

    info!("Stepwise started with database {}", guide.database_path().display());

    match command {
        Some(Problem { command }) => {
            Cli::new(guide, renderer)
                .handle_problem_command(command)
                .await
        }
        Some(Session { command }) => {
            Cli::new(guide, renderer)
                .handle_session_command(command)
                .await
        }
        Some(Serve) => {
            info!("Starting Stepwise MCP server");
            run_stdio_server(StepwiseMcpServer::new(guide))
                .await
                .context("MCP server failed")
        }
        None => {
            Cli::new(guide, renderer)
                .list_problems(&ListProblems::default())
                .await
        }
    }
}
