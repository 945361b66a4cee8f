//! Read-only access to authored steps.
//!
//! The engine only ever reads steps through [`StepCatalog`], so it can run
//! against the SQLite [`Database`](crate::db::Database) or an in-memory
//! [`MemoryCatalog`] alike.

use std::collections::HashMap;

use crate::{
    error::Result,
    models::{Problem, Step},
};

/// Lookup interface over the steps of authored problems.
pub trait StepCatalog {
    /// Step `step_id` of the given problem.
    fn get_step(&self, device_id: &str, problem_id: &str, step_id: &str) -> Result<Option<Step>>;

    /// Step with the lowest step number.
    fn get_first_step(&self, device_id: &str, problem_id: &str) -> Result<Option<Step>>;

    /// Step with the smallest step number greater than `after`.
    fn get_next_step(&self, device_id: &str, problem_id: &str, after: u32)
        -> Result<Option<Step>>;

    /// Number of steps in the problem.
    fn count_steps(&self, device_id: &str, problem_id: &str) -> Result<u32>;
}

/// Catalog holding problems in memory, keyed by `(device_id, problem_id)`.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    problems: HashMap<(String, String), Vec<Step>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a problem. Steps are stamped with the problem's
    /// identity and ordered by step number.
    pub fn insert(&mut self, mut problem: Problem) {
        problem.normalize();
        self.problems
            .insert((problem.device_id, problem.id), problem.steps);
    }

    pub fn with_problem(mut self, problem: Problem) -> Self {
        self.insert(problem);
        self
    }

    fn steps(&self, device_id: &str, problem_id: &str) -> &[Step] {
        self.problems
            .get(&(device_id.to_string(), problem_id.to_string()))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

impl StepCatalog for MemoryCatalog {
    fn get_step(&self, device_id: &str, problem_id: &str, step_id: &str) -> Result<Option<Step>> {
        Ok(self
            .steps(device_id, problem_id)
            .iter()
            .find(|s| s.id == step_id)
            .cloned())
    }

    fn get_first_step(&self, device_id: &str, problem_id: &str) -> Result<Option<Step>> {
        Ok(self.steps(device_id, problem_id).first().cloned())
    }

    fn get_next_step(
        &self,
        device_id: &str,
        problem_id: &str,
        after: u32,
    ) -> Result<Option<Step>> {
        Ok(self
            .steps(device_id, problem_id)
            .iter()
            .find(|s| s.step_number > after)
            .cloned())
    }

    fn count_steps(&self, device_id: &str, problem_id: &str) -> Result<u32> {
        Ok(self.steps(device_id, problem_id).len() as u32)
    }
}
