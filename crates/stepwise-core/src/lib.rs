//! Core library for Stepwise, a guided device troubleshooting engine.
//!
//! Support staff author a *problem* for a device as an ordered list of
//! steps, each carrying declarative validation rules, failure handling and
//! routing. End users then run a *diagnostic session* through it: every
//! submitted action is validated against the current step, and the session
//! advances, retries, skips, restarts, branches or aborts accordingly.
//!
//! # Layers
//!
//! - [`engine`]: the rule evaluator, failure policy, transition selector and
//!   session state machine, all pure over a [`StepCatalog`]
//! - [`db`]: SQLite storage for problems and sessions
//! - [`guide`]: the async [`Guide`] facade used by the CLI and MCP server
//! - [`display`]: markdown formatting for everything the facade returns
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use stepwise_core::{params::StartSession, models::Problem, GuideBuilder};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let guide = GuideBuilder::new()
//!     .with_database_path(Some("test.db"))
//!     .build()
//!     .await?;
//!
//! let problem: Problem = serde_json::from_str(&std::fs::read_to_string("no-signal.json")?)?;
//! guide.import_problem(problem).await?;
//!
//! let view = guide
//!     .start_session(&StartSession {
//!         device_id: "tv-100".to_string(),
//!         problem_id: "no-signal".to_string(),
//!         user_id: None,
//!     })
//!     .await?;
//! println!("{view}");
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod config;
pub mod db;
pub mod display;
pub mod engine;
pub mod error;
pub mod guide;
pub mod models;
pub mod params;

// Re-export commonly used types
pub use catalog::{MemoryCatalog, StepCatalog};
pub use config::EngineConfig;
pub use db::Database;
pub use display::{DeleteResult, ImportResult, ProblemSummaries, SessionView, Sessions};
pub use engine::{PredicateRegistry, SessionEngine, SessionEvent};
pub use error::{GuideError, Result};
pub use guide::{Guide, GuideBuilder};
pub use models::{
    DiagnosticSession, Problem, ProblemSummary, SessionStatus, Step, StepAttempt,
};
