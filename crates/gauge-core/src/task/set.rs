//! Validated collections of tasks.

use std::collections::HashSet;
use std::path::Path;

use tracing::info;

use super::error::TaskLoadError;
use super::loader::load_tasks;
use super::model::Task;
use crate::toolkit::{Arity, Toolkit};

/// Tasks whose ids are unique and whose assertion and action references
/// resolve on a toolkit.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskSet {
    tasks: Vec<Task>,
}

impl TaskSet {
    /// Validate `tasks` against `toolkit`.
    pub fn new(tasks: Vec<Task>, toolkit: &dyn Toolkit) -> Result<Self, TaskLoadError> {
        validate_tasks(&tasks, toolkit)?;
        Ok(Self { tasks })
    }

    /// Load a task-set file and validate it against `toolkit`.
    pub fn load(path: &Path, toolkit: &dyn Toolkit) -> Result<Self, TaskLoadError> {
        let set = Self::new(load_tasks(path)?, toolkit)?;
        info!(path = %path.display(), tasks = set.len(), "task set validated");
        Ok(set)
    }

    pub fn get(&self, task_id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn into_tasks(self) -> Vec<Task> {
        self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// Check id uniqueness, predicate existence/arity and action tool names.
pub fn validate_tasks(tasks: &[Task], toolkit: &dyn Toolkit) -> Result<(), TaskLoadError> {
    let mut seen = HashSet::new();
    for task in tasks {
        if !seen.insert(task.id.as_str()) {
            return Err(TaskLoadError::DuplicateTaskId {
                task_id: task.id.clone(),
            });
        }

        for assertion in task.env_assertions() {
            let arity = toolkit
                .predicate_arity(&assertion.func_name)
                .ok_or_else(|| TaskLoadError::UnknownAssertion {
                    task_id: task.id.clone(),
                    func_name: assertion.func_name.clone(),
                })?;
            let arity_ok = match arity {
                Arity::Nullary => !assertion.has_arguments(),
                Arity::Unary => assertion.has_arguments(),
            };
            if !arity_ok {
                return Err(TaskLoadError::ArityMismatch {
                    task_id: task.id.clone(),
                    func_name: assertion.func_name.clone(),
                    expected: arity,
                });
            }
        }

        let initial_actions = task
            .initial_state
            .iter()
            .flat_map(|s| s.actions.iter());
        for action in task.expected_actions().iter().chain(initial_actions) {
            if toolkit.tool_type(&action.name).is_none() {
                return Err(TaskLoadError::UnknownAction {
                    task_id: task.id.clone(),
                    action: action.name.clone(),
                });
            }
        }
    }
    Ok(())
}
