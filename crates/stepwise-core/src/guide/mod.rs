//! High-level async API over the engine and its SQLite store.
//!
//! [`Guide`] is the operation surface consumed by the CLI and the MCP
//! server. Every call opens the database on a blocking task, so a `Guide`
//! is cheap to share and holds no connection between calls.
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐    ┌─────────────────┐
//! │   CLI / MCP     │    │      Guide      │    │    Database     │
//! │                 │───▶│ (problem_ops,   │───▶│  + engine in a  │
//! │                 │    │  session_ops)   │    │  write tx       │
//! └─────────────────┘    └─────────────────┘    └─────────────────┘
//! ```
//!
//! ```rust,no_run
//! use stepwise_core::{params::{StartSession, SubmitAction}, GuideBuilder};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let guide = GuideBuilder::new()
//!     .with_database_path(Some("stepwise.db"))
//!     .build()
//!     .await?;
//!
//! let view = guide
//!     .start_session(&StartSession {
//!         device_id: "tv-100".to_string(),
//!         problem_id: "no-signal".to_string(),
//!         user_id: None,
//!     })
//!     .await?;
//!
//! let view = guide
//!     .submit_action(&SubmitAction {
//!         session_id: view.session.session_id.clone(),
//!         action: "pressed".to_string(),
//!         value: None,
//!     })
//!     .await?;
//! println!("{view}");
//! # Ok(())
//! # }
//! ```

use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
};

use rand::rngs::StdRng;

use crate::{config::EngineConfig, engine::PredicateRegistry};

pub mod builder;
pub mod problem_ops;
pub mod session_ops;


pub use builder::GuideBuilder;

/// Main interface for authoring problems and running diagnostic sessions.
pub struct Guide {
    pub(crate) db_path: PathBuf,
    pub(crate) config: EngineConfig,
    pub(crate) predicates: Arc<PredicateRegistry>,
    pub(crate) rng: Arc<Mutex<StdRng>>,
}

impl Guide {
    /// Location of the SQLite database this guide operates on.
    pub fn database_path(&self) -> &std::path::Path {
        &self.db_path
    }

    /// Effective engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}
