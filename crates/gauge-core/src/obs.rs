//! Structured lifecycle events for trials and result aggregation.
//!
//! Every event carries an `event` field (`trial.started`, `tool.invoked`,
//! ...) so JSON logs can be filtered without parsing messages.

use tracing::{info, warn};

use crate::toolkit::ToolType;

/// Enters a span tagged with the trial's task and index until dropped.
pub struct TrialSpan {
    _span: tracing::span::EnteredSpan,
}

impl TrialSpan {
    pub fn enter(domain: &str, task_id: &str, trial: u32) -> Self {
        let span = tracing::info_span!(
            "gauge.trial",
            domain = %domain,
            task_id = %task_id,
            trial = trial
        );
        Self {
            _span: span.entered(),
        }
    }
}

pub fn emit_trial_started(domain: &str, task_id: &str, trial: u32) {
    info!(event = "trial.started", domain = %domain, task_id = %task_id, trial = trial);
}

pub fn emit_tool_invoked(tool_name: &str, tool_type: ToolType) {
    info!(event = "tool.invoked", tool = %tool_name, tool_type = %tool_type);
}

/// Tool failures are expected during adversarial runs, hence `warn!`.
pub fn emit_tool_failed(tool_name: &str, error: &dyn std::fmt::Display) {
    warn!(event = "tool.failed", tool = %tool_name, error = %error);
}

pub fn emit_trial_evaluated(task_id: &str, trial: u32, reward: f64) {
    info!(
        event = "trial.evaluated",
        task_id = %task_id,
        trial = trial,
        reward = reward,
        passed = reward >= 1.0,
    );
}

pub fn emit_results_loaded(path: &str, domains: usize, simulations: usize) {
    info!(
        event = "results.loaded",
        path = %path,
        domains = domains,
        simulations = simulations,
    );
}

pub fn emit_results_merged(domain: &str, tasks: usize, simulations: usize) {
    info!(
        event = "results.merged",
        domain = %domain,
        tasks = tasks,
        simulations = simulations,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trial_span_enters() {
        let _span = TrialSpan::enter("collab", "collab-1", 0);
        emit_trial_started("collab", "collab-1", 0);
        emit_tool_invoked("get_collab_note", ToolType::Read);
    }
}
