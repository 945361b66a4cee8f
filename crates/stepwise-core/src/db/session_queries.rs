//! Session persistence: create, load, save and list diagnostic sessions.

use rusqlite::{params, OptionalExtension};

use super::utils::{json_column, optional_timestamp_column, timestamp_column};
use crate::{
    error::{DatabaseResultExt, GuideError, Result},
    models::DiagnosticSession,
};

const INSERT_SESSION_SQL: &str = "INSERT INTO sessions (session_id, device_id, problem_id, user_id, current_step_id, completed_steps, total_steps, error_steps, success, failure_reason, history, start_time, end_time, duration) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)";
const UPDATE_SESSION_SQL: &str = "UPDATE sessions SET current_step_id = ?1, completed_steps = ?2, error_steps = ?3, success = ?4, failure_reason = ?5, history = ?6, end_time = ?7, duration = ?8 WHERE session_id = ?9";
const SESSION_COLUMNS: &str = "id, session_id, device_id, problem_id, user_id, current_step_id, completed_steps, total_steps, error_steps, success, failure_reason, history, start_time, end_time, duration";

/// Filters for [`Database::list_sessions`](super::Database::list_sessions).
#[derive(Debug, Clone, Default)]
pub struct SessionFilter<'a> {
    pub device_id: Option<&'a str>,
    pub problem_id: Option<&'a str>,
    pub user_id: Option<&'a str>,
}

impl super::Database {
    /// Helper function to construct a DiagnosticSession from a database row
    fn build_session_from_row(row: &rusqlite::Row) -> rusqlite::Result<DiagnosticSession> {
        Ok(DiagnosticSession {
            id: Some(row.get::<_, i64>(0)? as u64),
            session_id: row.get(1)?,
            device_id: row.get(2)?,
            problem_id: row.get(3)?,
            user_id: row.get(4)?,
            current_step_id: row.get(5)?,
            completed_steps: row.get::<_, i64>(6)? as u32,
            total_steps: row.get::<_, i64>(7)? as u32,
            error_steps: json_column(row, 8)?,
            success: row.get(9)?,
            failure_reason: row.get(10)?,
            history: json_column(row, 11)?,
            start_time: timestamp_column(row, 12)?,
            end_time: optional_timestamp_column(row, 13)?,
            duration: row.get::<_, Option<i64>>(14)?.map(|d| d as u64),
        })
    }

    /// Persists a new session and returns it with its row id assigned.
    pub fn insert_session(&self, session: &DiagnosticSession) -> Result<DiagnosticSession> {
        self.connection
            .execute(
                INSERT_SESSION_SQL,
                params![
                    session.session_id,
                    session.device_id,
                    session.problem_id,
                    session.user_id,
                    session.current_step_id,
                    i64::from(session.completed_steps),
                    i64::from(session.total_steps),
                    serde_json::to_string(&session.error_steps)?,
                    session.success,
                    session.failure_reason,
                    serde_json::to_string(&session.history)?,
                    session.start_time.to_string(),
                    session.end_time.map(|t| t.to_string()),
                    session.duration.map(|d| d as i64),
                ],
            )
            .db_context("Failed to insert session")?;

        let mut stored = session.clone();
        stored.id = Some(self.connection.last_insert_rowid() as u64);
        Ok(stored)
    }

    /// Loads a session by its client token.
    pub fn load_session(&self, session_id: &str) -> Result<Option<DiagnosticSession>> {
        let sql = format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE session_id = ?1");
        self.connection
            .query_row(&sql, params![session_id], Self::build_session_from_row)
            .optional()
            .db_context("Failed to load session")
    }

    /// Writes the mutable state of an existing session.
    pub fn save_session(&self, session: &DiagnosticSession) -> Result<()> {
        let updated = self
            .connection
            .execute(
                UPDATE_SESSION_SQL,
                params![
                    session.current_step_id,
                    i64::from(session.completed_steps),
                    serde_json::to_string(&session.error_steps)?,
                    session.success,
                    session.failure_reason,
                    serde_json::to_string(&session.history)?,
                    session.end_time.map(|t| t.to_string()),
                    session.duration.map(|d| d as i64),
                    session.session_id,
                ],
            )
            .db_context("Failed to save session")?;

        if updated == 0 {
            return Err(GuideError::SessionNotFound {
                session_id: session.session_id.clone(),
            });
        }
        Ok(())
    }

    /// Lists sessions, newest first.
    pub fn list_sessions(&self, filter: &SessionFilter<'_>) -> Result<Vec<DiagnosticSession>> {
        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM sessions WHERE (?1 IS NULL OR device_id = ?1) AND (?2 IS NULL OR problem_id = ?2) AND (?3 IS NULL OR user_id = ?3) ORDER BY id DESC"
        );
        let mut stmt = self
            .connection
            .prepare(&sql)
            .db_context("Failed to prepare session listing")?;

        let sessions = stmt
            .query_map(
                params![filter.device_id, filter.problem_id, filter.user_id],
                Self::build_session_from_row,
            )
            .db_context("Failed to list sessions")?
            .collect::<rusqlite::Result<Vec<_>>>()
            .db_context("Failed to read session")?;
        Ok(sessions)
    }
}
