//! Error types for the stepwise library.

use std::path::PathBuf;

use thiserror::Error;

/// Comprehensive error type for all guide and engine operations.
#[derive(Error, Debug)]
pub enum GuideError {
    /// Database connection or query errors
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: rusqlite::Error,
    },
    /// No problem is authored for the device/problem pair
    #[error("Problem '{problem_id}' for device '{device_id}' not found")]
    ProblemNotFound {
        device_id: String,
        problem_id: String,
    },
    /// No session exists for the given token
    #[error("Session '{session_id}' not found")]
    SessionNotFound { session_id: String },
    /// An action was submitted after the session reached a terminal state
    #[error("Session '{session_id}' has already terminated")]
    SessionTerminated { session_id: String },
    /// The catalog has no step with this id
    #[error("Step '{step_id}' not found")]
    StepNotFound { step_id: String },
    /// A branch failure action references a step that does not exist
    #[error("Step '{step_id}' branches to unknown step '{target}'")]
    InvalidBranchTarget { step_id: String, target: String },
    /// A custom rule or condition names a predicate nobody registered
    #[error("No predicate registered under '{name}'")]
    UnresolvedCustomRule { name: String },
    /// The step exhausted its failure budget
    #[error("Step '{step_id}' failed {attempts} times, exceeding the retry limit")]
    MaxRetriesExceeded { step_id: String, attempts: u32 },
    /// A condition expression could not be parsed
    #[error("Invalid condition '{expression}': {reason}")]
    InvalidCondition { expression: String, reason: String },
    /// File system operation errors
    #[error("File system error at path '{path}': {source}")]
    FileSystem {
        path: PathBuf,
        source: std::io::Error,
    },
    /// XDG directory specification errors
    #[error("XDG directory error: {0}")]
    XdgDirectory(String),
    /// Invalid input validation errors
    #[error("Invalid input for field '{field}': {reason}")]
    InvalidInput { field: String, reason: String },
    /// Serialization/deserialization errors
    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

/// Builder for creating input validation errors.
pub struct InvalidInputBuilder {
    field: String,
}

impl InvalidInputBuilder {
    /// Create a new invalid input error builder for a field.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }

    /// Build the error with the given reason.
    pub fn with_reason(self, reason: impl Into<String>) -> GuideError {
        GuideError::InvalidInput {
            field: self.field,
            reason: reason.into(),
        }
    }
}

impl GuideError {
    /// Creates a database error with a message and its source.
    pub fn database(message: impl Into<String>, source: rusqlite::Error) -> Self {
        Self::Database {
            message: message.into(),
            source,
        }
    }

    /// Creates a builder for input validation errors.
    pub fn invalid_input(field: impl Into<String>) -> InvalidInputBuilder {
        InvalidInputBuilder::new(field)
    }
}

/// Specialized extension trait for database-related Results.
pub trait DatabaseResultExt<T> {
    /// Map database errors with a message.
    fn db_context(self, message: &str) -> Result<T>;
}

impl<T> DatabaseResultExt<T> for std::result::Result<T, rusqlite::Error> {
    fn db_context(self, message: &str) -> Result<T> {
        self.map_err(|e| GuideError::database(message, e))
    }
}

/// Extension trait mapping task join failures into configuration errors.
pub trait JoinResultExt<T> {
    /// Flatten a `spawn_blocking` result.
    fn join_context(self) -> Result<T>;
}

impl<T> JoinResultExt<T> for std::result::Result<Result<T>, tokio::task::JoinError> {
    fn join_context(self) -> Result<T> {
        self.map_err(|e| GuideError::Configuration {
            message: format!("Task join error: {e}"),
        })?
    }
}

/// Result type alias for stepwise operations
pub type Result<T> = std::result::Result<T, GuideError>;
