//! Database operations and SQLite management for problems and sessions.
//!
//! This module provides low-level database operations for Stepwise. It owns
//! the SQLite connection and schema, implements [`StepCatalog`] over the
//! stored problems, and acts as the session store for the engine.
//!
//! [`StepCatalog`]: crate::catalog::StepCatalog

use std::path::Path;

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::error::{DatabaseResultExt, Result};

pub mod migrations;
pub mod problem_queries;
pub mod session_queries;
mod utils;

pub use session_queries::SessionFilter;

/// Database connection and operations handler.
pub struct Database {
    connection: Connection,
}

impl Database {
    /// Creates a new database connection and initializes the schema.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let connection = Connection::open(path).db_context("Failed to open database connection")?;
        connection
            .busy_timeout(std::time::Duration::from_secs(5))
            .db_context("Failed to set busy timeout")?;

        let db = Self { connection };
        db.initialize_schema()?;
        Ok(db)
    }

    /// Runs `f` inside an immediate transaction, committing only if it
    /// succeeds.
    ///
    /// `BEGIN IMMEDIATE` takes the write lock up front, so concurrent
    /// load-modify-save sequences against the same database are serialized.
    /// The transaction rolls back when `f` fails or the commit does.
    pub fn write_transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Database) -> Result<T>,
    {
        let tx = Transaction::new_unchecked(&self.connection, TransactionBehavior::Immediate)
            .db_context("Failed to begin transaction")?;

        let value = f(self)?;
        tx.commit().db_context("Failed to commit transaction")?;
        Ok(value)
    }
}
