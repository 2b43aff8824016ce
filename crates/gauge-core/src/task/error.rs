//! Errors raised while loading and validating task sets.

use std::path::PathBuf;

use crate::toolkit::Arity;

#[derive(Debug, thiserror::Error)]
pub enum TaskLoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("file reference '{reference}' could not be read from {path}: {source}")]
    FileReference {
        reference: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{path}: expected a JSON array of task records")]
    NotAnArray { path: PathBuf },

    #[error("{path}: task record #{index} is invalid: {source}")]
    InvalidRecord {
        path: PathBuf,
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("duplicate task id: {task_id}")]
    DuplicateTaskId { task_id: String },

    #[error("task {task_id}: unknown assertion predicate '{func_name}'")]
    UnknownAssertion { task_id: String, func_name: String },

    #[error("task {task_id}: predicate '{func_name}' expects {expected:?} arguments")]
    ArityMismatch {
        task_id: String,
        func_name: String,
        expected: Arity,
    },

    #[error("task {task_id}: expected action '{action}' names no tool")]
    UnknownAction { task_id: String, action: String },
}
