//! Tasks: scenarios, evaluation criteria and task-set loading.
//!
//! # Modules
//!
//! - [`model`]: `Task`, `EnvAssertion`, `Action`, `EvaluationCriteria`
//! - [`loader`]: `file:` reference pre-pass and JSON loading
//! - [`set`]: `TaskSet` validated against a toolkit
//! - [`error`]: `TaskLoadError`

pub mod error;
pub mod loader;
pub mod model;
pub mod set;

pub use error::TaskLoadError;
pub use loader::{
    load_tasks, parse_tasks, read_task_records, resolve_file_ref, resolve_task_file_refs,
    FILE_REF_PREFIX,
};
pub use model::{
    Action, EnvAssertion, EvaluationCriteria, InitialState, Instructions, RewardBasis,
    StructuredInstructions, Task, TaskDescription, UserScenario,
};
pub use set::{validate_tasks, TaskSet};
