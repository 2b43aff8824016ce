//! agentgauge core library
//!
//! Evaluation model for tool-using agents (toolkits, environments, tasks,
//! grading) and the results aggregation engine (merging, pass^k, tables).

pub mod config;
pub mod digest;
pub mod environment;
pub mod error;
pub mod evaluation;
pub mod message;
pub mod metrics;
pub mod obs;
pub mod results;
pub mod runner;
pub mod task;
pub mod telemetry;
pub mod toolkit;

pub use config::{AggregationConfig, HarnessConfig};
pub use digest::{canonical_json, compute_digest, DigestError};
pub use environment::{Environment, EnvironmentError, EnvironmentFactory};
pub use error::{GaugeError, Result};
pub use evaluation::{
    evaluate_task, ActionCheck, DbCheck, EnvAssertionCheck, EvaluationError, RewardInfo,
};
pub use message::{Message, ParticipantMessage, Requestor, ToolCall, ToolMessage};
pub use results::{
    compute_task_metrics, generate_metrics_table, load_simulation_file, load_simulations,
    load_simulations_concurrent, load_simulations_lenient, merge_domains, pass_hat_k,
    AggregationError, DomainResults, LoadReport, MetricsError, MetricsRow, MetricsSummary,
    MetricsTable, MultiDomainResults, Results, SimulationRun, TaskMetrics,
};
pub use runner::{build_results, run_trial, run_trials, scripted_calls};
pub use task::{
    load_tasks, resolve_task_file_refs, Action, EnvAssertion, EvaluationCriteria, RewardBasis,
    Task, TaskLoadError, TaskSet,
};
pub use toolkit::{
    CapabilityPolicy, DomainToolkit, ToolError, ToolResult, ToolSpec, ToolTable, ToolType,
    Toolkit,
};
