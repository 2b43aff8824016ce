//! Crate-wide error type.

use crate::environment::EnvironmentError;
use crate::evaluation::EvaluationError;
use crate::results::{AggregationError, MetricsError};
use crate::task::TaskLoadError;
use crate::toolkit::ToolError;

#[derive(Debug, thiserror::Error)]
pub enum GaugeError {
    #[error("tool error: {0}")]
    Tool(#[from] ToolError),

    #[error("task load error: {0}")]
    TaskLoad(#[from] TaskLoadError),

    #[error("environment error: {0}")]
    Environment(#[from] EnvironmentError),

    #[error("evaluation error: {0}")]
    Evaluation(#[from] EvaluationError),

    #[error("aggregation error: {0}")]
    Aggregation(#[from] AggregationError),

    #[error("metrics error: {0}")]
    Metrics(#[from] MetricsError),

    #[error("trial task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, GaugeError>;
