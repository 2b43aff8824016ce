//! Post-run grading: env assertions, expected actions and state replay.

pub mod error;
pub mod evaluator;
pub mod reward;

pub use error::{EvaluationError, EvaluationResult};
pub use evaluator::{check_actions, check_db, check_env_assertions, evaluate_task};
pub use reward::{ActionCheck, DbCheck, EnvAssertionCheck, RewardInfo};
