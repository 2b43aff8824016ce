//! Per-task statistics and the pass^k estimator.
//!
//! pass^k estimates the probability that `k` independent attempts at a task
//! all succeed, given `c` successes in `n` observed trials:
//! `C(c, k) / C(n, k)`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::error::MetricsError;
use super::model::Results;
use crate::config::AggregationConfig;

/// `C(n, k)`, or `None` when it does not fit in a `u128`.
pub fn binomial(n: u64, k: u64) -> Option<u128> {
    if k > n {
        return Some(0);
    }
    let k = k.min(n - k);
    let mut acc: u128 = 1;
    for i in 0..k {
        // Exact at every step: acc * (n - i) is divisible by (i + 1).
        acc = acc.checked_mul(u128::from(n - i))? / u128::from(i + 1);
    }
    Some(acc)
}

/// Unbiased pass^k for `c` successes in `n` trials.
pub fn pass_hat_k(n: u64, c: u64, k: u64) -> Result<f64, MetricsError> {
    if k == 0 {
        return Err(MetricsError::ZeroK);
    }
    if c > n {
        return Err(MetricsError::SuccessesExceedTrials { n, c });
    }
    if k > n {
        return Err(MetricsError::KExceedsTrials { n, k });
    }
    if c < k {
        return Ok(0.0);
    }
    match (binomial(c, k), binomial(n, k)) {
        (Some(num), Some(den)) => Ok(num as f64 / den as f64),
        // Equivalent product form, used once the binomials overflow.
        _ => Ok((0..k).map(|i| (c - i) as f64 / (n - i) as f64).product()),
    }
}

/// Whether `reward` counts as a success.
pub fn is_successful(reward: f64, threshold: f64) -> bool {
    reward >= threshold
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation.
fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

/// Statistics over every simulation of one task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskMetrics {
    pub num_trials: u64,
    pub success_count: u64,
    pub avg_reward: f64,
    pub std_reward: f64,
    /// `None` means "no data", not zero.
    pub avg_agent_cost: Option<f64>,
    pub avg_user_cost: Option<f64>,
    pub avg_duration: f64,
    pub avg_num_messages: f64,
    /// pass^k for `k = 1..=min(num_trials, max_pass_k)`.
    pub pass_hat_k: BTreeMap<u32, f64>,
}

/// Metrics for `task_id`, or `None` when it has no simulations.
pub fn compute_task_metrics(
    results: &Results,
    task_id: &str,
    config: &AggregationConfig,
) -> Option<TaskMetrics> {
    let sims: Vec<_> = results
        .simulations
        .iter()
        .filter(|s| s.task_id == task_id)
        .collect();
    if sims.is_empty() {
        return None;
    }

    let rewards: Vec<f64> = sims.iter().map(|s| s.reward()).collect();
    let agent_costs: Vec<f64> = sims.iter().map(|s| s.agent_cost.unwrap_or(0.0)).collect();
    let user_costs: Vec<f64> = sims.iter().map(|s| s.user_cost.unwrap_or(0.0)).collect();
    let durations: Vec<f64> = sims.iter().map(|s| s.duration).collect();
    let message_counts: Vec<f64> = sims.iter().map(|s| s.messages.len() as f64).collect();

    let num_trials = sims.len() as u64;
    let success_count = rewards
        .iter()
        .filter(|&&r| is_successful(r, config.success_threshold))
        .count() as u64;

    let max_k = u64::from(config.max_pass_k).min(num_trials);
    let mut pass_hat = BTreeMap::new();
    for k in 1..=max_k {
        // k <= num_trials and success_count <= num_trials hold by construction.
        if let Ok(value) = pass_hat_k(num_trials, success_count, k) {
            pass_hat.insert(k as u32, value);
        }
    }

    Some(TaskMetrics {
        num_trials,
        success_count,
        avg_reward: mean(&rewards),
        std_reward: std_dev(&rewards),
        avg_agent_cost: (!agent_costs.is_empty()).then(|| mean(&agent_costs)),
        avg_user_cost: (!user_costs.is_empty()).then(|| mean(&user_costs)),
        avg_duration: mean(&durations),
        avg_num_messages: mean(&message_counts),
        pass_hat_k: pass_hat,
    })
}
