//! Results aggregation: loading, merging, per-task metrics and tables.
//!
//! # Modules
//!
//! - [`model`]: `Results`, `MultiDomainResults`, `SimulationRun`
//! - [`load`]: single/multi-file loading and first-seen-wins merging
//! - [`stats`]: `TaskMetrics`, `pass_hat_k`
//! - [`table`]: `MetricsTable` with text/CSV/summary rendering
//! - [`error`]: `AggregationError`, `MetricsError`

pub mod error;
pub mod load;
pub mod model;
pub mod stats;
pub mod table;

pub use error::{AggregationError, AggregationResult, MetricsError};
pub use load::{
    load_simulation_file, load_simulations, load_simulations_concurrent,
    load_simulations_lenient, merge_domains, DomainResults, LoadReport,
};
pub use model::{
    EnvironmentInfo, MultiDomainResults, ParticipantInfo, Results, RunInfo, SimulationRun,
    TerminationReason,
};
pub use stats::{binomial, compute_task_metrics, is_successful, pass_hat_k, TaskMetrics};
pub use table::{generate_metrics_table, MetricsRow, MetricsSummary, MetricsTable};
