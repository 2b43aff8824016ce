//! Errors raised while grading an attempt.

use crate::digest::DigestError;
use crate::environment::EnvironmentError;
use crate::task::RewardBasis;
use crate::toolkit::{Arity, ToolError};

/// Configuration or replay failures that abort evaluation of one task.
///
/// A failed assertion is not an error; it produces reward 0.
#[derive(Debug, thiserror::Error)]
pub enum EvaluationError {
    #[error("task {task_id}: unknown assertion predicate '{func_name}'")]
    UnknownAssertion { task_id: String, func_name: String },

    #[error("task {task_id}: predicate '{func_name}' expects {expected:?} arguments")]
    ArityMismatch {
        task_id: String,
        func_name: String,
        expected: Arity,
    },

    #[error("predicate '{func_name}' could not be evaluated: {source}")]
    Predicate {
        func_name: String,
        #[source]
        source: ToolError,
    },

    #[error("task {task_id}: replaying expected action '{action}' failed: {source}")]
    Replay {
        task_id: String,
        action: String,
        #[source]
        source: ToolError,
    },

    #[error("reward basis {basis} is not supported by this harness")]
    UnsupportedRewardBasis { basis: RewardBasis },

    #[error(transparent)]
    Environment(#[from] EnvironmentError),

    #[error(transparent)]
    Digest(#[from] DigestError),
}

pub type EvaluationResult<T> = std::result::Result<T, EvaluationError>;
