//! Database schema initialization and versioning.

use crate::error::{DatabaseResultExt, GuideError, Result};

/// Schema revision written to `PRAGMA user_version`.
pub const SCHEMA_VERSION: i64 = 1;

impl super::Database {
    /// Initializes the database schema using the embedded SQL file.
    pub(super) fn initialize_schema(&self) -> Result<()> {
        // Enable foreign keys for this connection
        self.connection
            .execute("PRAGMA foreign_keys = ON", [])
            .db_context("Failed to enable foreign keys")?;

        let version = self.schema_version()?;
        if version > SCHEMA_VERSION {
            return Err(GuideError::Configuration {
                message: format!(
                    "Database schema version {version} is newer than supported version {SCHEMA_VERSION}"
                ),
            });
        }

        let schema_sql = include_str!("../../assets/schema.sql");
        self.connection
            .execute_batch(schema_sql)
            .db_context("Failed to initialize database schema")?;

        if version < SCHEMA_VERSION {
            self.connection
                .execute_batch(&format!("PRAGMA user_version = {SCHEMA_VERSION}"))
                .db_context("Failed to record schema version")?;
        }

        Ok(())
    }

    /// Schema revision recorded in the database file (0 when new).
    pub fn schema_version(&self) -> Result<i64> {
        self.connection
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .db_context("Failed to read schema version")
    }
}
