//! Problem and step storage, and the [`StepCatalog`] implementation.

use jiff::Timestamp;
use rusqlite::{params, types::Type, OptionalExtension};

use super::utils::{json_column, timestamp_column};
use crate::{
    catalog::StepCatalog,
    error::{DatabaseResultExt, GuideError, Result},
    models::{ActionType, Problem, ProblemSummary, Step},
};

const UPSERT_PROBLEM_SQL: &str = "INSERT INTO problems (device_id, id, title, description, category, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6) ON CONFLICT(device_id, id) DO UPDATE SET title = excluded.title, description = excluded.description, category = excluded.category, updated_at = excluded.updated_at";
const DELETE_PROBLEM_STEPS_SQL: &str = "DELETE FROM steps WHERE device_id = ?1 AND problem_id = ?2";
const INSERT_STEP_SQL: &str = "INSERT INTO steps (device_id, problem_id, id, step_number, instruction, action_type, required_action, validation_rules, success_condition, failure_actions, next_step_conditions, estimated_time) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)";
const SELECT_PROBLEM_SQL: &str =
    "SELECT id, device_id, title, description, category FROM problems WHERE device_id = ?1 AND id = ?2";
const SELECT_PROBLEM_SUMMARIES_SQL: &str = "SELECT p.id, p.device_id, p.title, p.category, COUNT(s.id), COALESCE(SUM(s.estimated_time), 0), p.updated_at FROM problems p LEFT JOIN steps s ON s.device_id = p.device_id AND s.problem_id = p.id WHERE (?1 IS NULL OR p.device_id = ?1) GROUP BY p.device_id, p.id ORDER BY p.device_id, p.title";
const DELETE_PROBLEM_SQL: &str = "DELETE FROM problems WHERE device_id = ?1 AND id = ?2";

const STEP_COLUMNS: &str = "id, problem_id, device_id, step_number, instruction, action_type, required_action, validation_rules, success_condition, failure_actions, next_step_conditions, estimated_time";

impl super::Database {
    /// Helper function to construct a Step from a database row
    fn build_step_from_row(row: &rusqlite::Row) -> rusqlite::Result<Step> {
        let action_type_str: String = row.get(5)?;
        let action_type = action_type_str.parse::<ActionType>().map_err(|_| {
            rusqlite::Error::FromSqlConversionFailure(
                5,
                Type::Text,
                format!("Invalid action type: {action_type_str}").into(),
            )
        })?;

        Ok(Step {
            id: row.get(0)?,
            problem_id: row.get(1)?,
            device_id: row.get(2)?,
            step_number: row.get::<_, i64>(3)? as u32,
            instruction: row.get(4)?,
            action_type,
            required_action: row.get(6)?,
            validation_rules: json_column(row, 7)?,
            success_condition: row.get(8)?,
            failure_actions: json_column(row, 9)?,
            next_step_conditions: json_column(row, 10)?,
            estimated_time: row.get::<_, i64>(11)? as u32,
        })
    }

    /// Stores a problem, replacing any previous version and all of its steps.
    ///
    /// The problem is validated first; nothing is written if validation fails.
    pub fn import_problem(&mut self, problem: &Problem) -> Result<Problem> {
        let mut problem = problem.clone();
        problem.validate()?;
        problem.normalize();

        let now = Timestamp::now().to_string();
        let tx = self
            .connection
            .transaction()
            .db_context("Failed to begin transaction")?;

        tx.execute(
            UPSERT_PROBLEM_SQL,
            params![
                problem.device_id,
                problem.id,
                problem.title,
                problem.description,
                problem.category,
                now
            ],
        )
        .db_context("Failed to store problem")?;

        tx.execute(DELETE_PROBLEM_STEPS_SQL, params![problem.device_id, problem.id])
            .db_context("Failed to clear previous steps")?;

        for step in &problem.steps {
            tx.execute(
                INSERT_STEP_SQL,
                params![
                    step.device_id,
                    step.problem_id,
                    step.id,
                    i64::from(step.step_number),
                    step.instruction,
                    step.action_type.as_str(),
                    step.required_action,
                    serde_json::to_string(&step.validation_rules)?,
                    step.success_condition,
                    serde_json::to_string(&step.failure_actions)?,
                    serde_json::to_string(&step.next_step_conditions)?,
                    i64::from(step.estimated_time),
                ],
            )
            .db_context("Failed to insert step")?;
        }

        tx.commit().db_context("Failed to commit transaction")?;

        Ok(problem)
    }

    /// Retrieves a problem with its steps ordered by step number.
    pub fn get_problem(&self, device_id: &str, problem_id: &str) -> Result<Option<Problem>> {
        let problem = self
            .connection
            .query_row(SELECT_PROBLEM_SQL, params![device_id, problem_id], |row| {
                Ok(Problem {
                    id: row.get(0)?,
                    device_id: row.get(1)?,
                    title: row.get(2)?,
                    description: row.get(3)?,
                    category: row.get(4)?,
                    steps: Vec::new(),
                })
            })
            .optional()
            .db_context("Failed to query problem")?;

        let Some(mut problem) = problem else {
            return Ok(None);
        };
        problem.steps = self.get_steps(device_id, problem_id)?;
        Ok(Some(problem))
    }

    /// All steps of a problem ordered by step number.
    pub fn get_steps(&self, device_id: &str, problem_id: &str) -> Result<Vec<Step>> {
        let sql = format!(
            "SELECT {STEP_COLUMNS} FROM steps WHERE device_id = ?1 AND problem_id = ?2 ORDER BY step_number"
        );
        let mut stmt = self
            .connection
            .prepare(&sql)
            .db_context("Failed to prepare steps query")?;

        let steps = stmt
            .query_map(params![device_id, problem_id], Self::build_step_from_row)
            .db_context("Failed to query steps")?
            .collect::<rusqlite::Result<Vec<_>>>()
            .db_context("Failed to read step")?;
        Ok(steps)
    }

    /// Lists stored problems, optionally restricted to one device.
    pub fn list_problems(&self, device_id: Option<&str>) -> Result<Vec<ProblemSummary>> {
        let mut stmt = self
            .connection
            .prepare(SELECT_PROBLEM_SUMMARIES_SQL)
            .db_context("Failed to prepare problem listing")?;

        let summaries = stmt
            .query_map(params![device_id], |row| {
                Ok(ProblemSummary {
                    id: row.get(0)?,
                    device_id: row.get(1)?,
                    title: row.get(2)?,
                    category: row.get(3)?,
                    total_steps: row.get::<_, i64>(4)? as u32,
                    estimated_time: row.get::<_, i64>(5)? as u64,
                    updated_at: timestamp_column(row, 6)?,
                })
            })
            .db_context("Failed to list problems")?
            .collect::<rusqlite::Result<Vec<_>>>()
            .db_context("Failed to read problem summary")?;
        Ok(summaries)
    }

    /// Deletes a problem and its steps. Sessions that ran against it are kept.
    pub fn delete_problem(&mut self, device_id: &str, problem_id: &str) -> Result<()> {
        let deleted = self
            .connection
            .execute(DELETE_PROBLEM_SQL, params![device_id, problem_id])
            .db_context("Failed to delete problem")?;

        if deleted == 0 {
            return Err(GuideError::ProblemNotFound {
                device_id: device_id.to_string(),
                problem_id: problem_id.to_string(),
            });
        }
        Ok(())
    }

    fn query_step(&self, where_clause: &str, params: &[&dyn rusqlite::ToSql]) -> Result<Option<Step>> {
        let sql = format!(
            "SELECT {STEP_COLUMNS} FROM steps WHERE {where_clause} ORDER BY step_number LIMIT 1"
        );
        self.connection
            .query_row(&sql, params, Self::build_step_from_row)
            .optional()
            .db_context("Failed to query step")
    }
}

impl StepCatalog for super::Database {
    fn get_step(&self, device_id: &str, problem_id: &str, step_id: &str) -> Result<Option<Step>> {
        self.query_step(
            "device_id = ?1 AND problem_id = ?2 AND id = ?3",
            params![device_id, problem_id, step_id],
        )
    }

    fn get_first_step(&self, device_id: &str, problem_id: &str) -> Result<Option<Step>> {
        self.query_step("device_id = ?1 AND problem_id = ?2", params![device_id, problem_id])
    }

    fn get_next_step(
        &self,
        device_id: &str,
        problem_id: &str,
        after: u32,
    ) -> Result<Option<Step>> {
        self.query_step(
            "device_id = ?1 AND problem_id = ?2 AND step_number > ?3",
            params![device_id, problem_id, i64::from(after)],
        )
    }

    fn count_steps(&self, device_id: &str, problem_id: &str) -> Result<u32> {
        self.connection
            .query_row(
                "SELECT COUNT(*) FROM steps WHERE device_id = ?1 AND problem_id = ?2",
                params![device_id, problem_id],
                |row| row.get::<_, i64>(0),
            )
            .map(|n| n as u32)
            .db_context("Failed to count steps")
    }
}
