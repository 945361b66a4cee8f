//! Problem authoring operations for the Guide.

use tokio::task;

use super::Guide;
use crate::{
    db::Database,
    display::{DeleteResult, ImportResult, ProblemSummaries},
    error::{GuideError, JoinResultExt, Result},
    models::Problem,
    params::{DeleteProblem, ListProblems, ProblemRef},
};

impl Guide {
    /// Validates and stores a problem, replacing any earlier version with
    /// the same device and problem id.
    ///
    /// # Errors
    ///
    /// Returns `GuideError::InvalidInput` or `GuideError::InvalidBranchTarget`
    /// if the problem fails validation; nothing is stored in that case.
    pub async fn import_problem(&self, problem: Problem) -> Result<ImportResult> {
        let db_path = self.db_path.clone();

        let stored = task::spawn_blocking(move || {
            let mut db = Database::new(&db_path)?;
            db.import_problem(&problem)
        })
        .await
        .join_context()?;

        log::info!(
            "Imported problem '{}' for device '{}' ({} steps)",
            stored.id,
            stored.device_id,
            stored.steps.len()
        );
        Ok(ImportResult::new(stored))
    }

    /// Retrieves a problem with all of its steps.
    pub async fn get_problem(&self, params: &ProblemRef) -> Result<Option<Problem>> {
        let db_path = self.db_path.clone();
        let device_id = params.device_id.clone();
        let problem_id = params.problem_id.clone();

        task::spawn_blocking(move || {
            let db = Database::new(&db_path)?;
            db.get_problem(&device_id, &problem_id)
        })
        .await
        .join_context()
    }

    /// Lists stored problems, optionally for one device only.
    pub async fn list_problems(&self, params: &ListProblems) -> Result<ProblemSummaries> {
        let db_path = self.db_path.clone();
        let device_id = params.device_id.clone();

        let summaries = task::spawn_blocking(move || {
            let db = Database::new(&db_path)?;
            db.list_problems(device_id.as_deref())
        })
        .await
        .join_context()?;

        Ok(ProblemSummaries(summaries))
    }

    /// Permanently deletes a problem and its steps.
    ///
    /// # Errors
    ///
    /// Returns `GuideError::InvalidInput` if `confirmed` is false
    /// Returns `GuideError::ProblemNotFound` if no such problem is stored
    pub async fn delete_problem(&self, params: &DeleteProblem) -> Result<DeleteResult> {
        if !params.confirmed {
            return Err(GuideError::invalid_input("confirmed").with_reason(
                "Problem deletion requires explicit confirmation. Set 'confirmed' to true to proceed.",
            ));
        }

        let db_path = self.db_path.clone();
        let device_id = params.device_id.clone();
        let problem_id = params.problem_id.clone();

        task::spawn_blocking(move || {
            let mut db = Database::new(&db_path)?;
            db.delete_problem(&device_id, &problem_id)?;
            Ok::<_, GuideError>(DeleteResult::new(device_id, problem_id))
        })
        .await
        .join_context()
    }
}
