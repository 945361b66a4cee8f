//! Markdown display for models, collections and operation results.
//!
//! Domain models implement [`std::fmt::Display`] directly (see [`models`]);
//! collections and operation outcomes get newtype wrappers so the same data
//! can be rendered differently depending on context.
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐    ┌─────────────────┐
//! │  Domain Models  │    │   Collections   │    │    Markdown     │
//! │ (Problem, Step, │───▶│ & Result Types  │───▶│     Output      │
//! │   Session)      │    │                 │    │  (Terminal/MCP) │
//! └─────────────────┘    └─────────────────┘    └─────────────────┘
//! ```
//!
//! ```rust
//! use stepwise_core::{display::ImportResult, models::Problem};
//!
//! let problem: Problem = serde_json::from_str(r#"{
//!     "id": "no-signal",
//!     "device_id": "tv-100",
//!     "title": "No signal",
//!     "steps": [{"id": "s1", "step_number": 1, "instruction": "Check the cable"}]
//! }"#).unwrap();
//!
//! let output = ImportResult::new(problem).to_string();
//! assert!(output.contains("Imported problem 'no-signal' for device 'tv-100'"));
//! ```

pub mod collections;
pub mod datetime;
pub mod models;
pub mod results;

pub use collections::{ProblemSummaries, Sessions};
pub use datetime::{LocalDateTime, Seconds};
pub use results::{DeleteResult, ImportResult, SessionView};
