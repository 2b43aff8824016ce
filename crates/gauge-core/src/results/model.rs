//! Simulation result containers, single- and multi-domain.
//!
//! Unknown fields are ignored so result files produced by other runners
//! (which carry token usage, raw model payloads, etc.) still load.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::evaluation::RewardInfo;
use crate::message::Message;
use crate::task::Task;

/// Why a conversation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    UserStop,
    AgentStop,
    MaxSteps,
    TooManyErrors,
    AgentError,
    UserError,
}

/// One executed attempt at a task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimulationRun {
    pub id: String,
    pub task_id: String,
    #[serde(default)]
    pub trial: Option<u32>,
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub end_time: String,
    /// Wall-clock seconds.
    #[serde(default)]
    pub duration: f64,
    pub termination_reason: TerminationReason,
    #[serde(default)]
    pub agent_cost: Option<f64>,
    #[serde(default)]
    pub user_cost: Option<f64>,
    #[serde(default)]
    pub reward_info: Option<RewardInfo>,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl SimulationRun {
    /// Reward, with a missing reward record counting as 0.
    pub fn reward(&self) -> f64 {
        self.reward_info.as_ref().map_or(0.0, |r| r.reward)
    }
}

/// Model configuration of one conversation participant.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ParticipantInfo {
    #[serde(default)]
    pub implementation: String,
    #[serde(default)]
    pub llm: Option<String>,
    #[serde(default)]
    pub llm_args: Option<Map<String, Value>>,
}

impl ParticipantInfo {
    /// Compact JSON of `llm_args`, `{}` when absent or empty.
    ///
    /// Keys come out sorted and without spaces after separators, so the
    /// text differs from `{"temperature": 0.0}`-style output that keeps
    /// insertion order. Compare parsed values, not strings, when
    /// reconciling tables from other tools.
    pub fn params_json(&self) -> String {
        match &self.llm_args {
            Some(args) if !args.is_empty() => Value::Object(args.clone()).to_string(),
            _ => "{}".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EnvironmentInfo {
    pub domain_name: String,
    #[serde(default)]
    pub policy: Option<String>,
    #[serde(default)]
    pub tool_defs: Option<Value>,
}

/// Run configuration recorded alongside the simulations.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RunInfo {
    #[serde(default)]
    pub git_commit: Option<String>,
    #[serde(default)]
    pub num_trials: Option<u32>,
    #[serde(default)]
    pub max_steps: Option<u32>,
    #[serde(default)]
    pub max_errors: Option<u32>,
    #[serde(default)]
    pub user_info: ParticipantInfo,
    #[serde(default)]
    pub agent_info: ParticipantInfo,
    pub environment_info: EnvironmentInfo,
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Simulations of one domain plus the tasks they ran.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Results {
    #[serde(default)]
    pub timestamp: Option<String>,
    pub info: RunInfo,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub simulations: Vec<SimulationRun>,
}

impl Results {
    pub fn domain_name(&self) -> &str {
        &self.info.environment_info.domain_name
    }

    /// Distinct task ids in order of first simulation.
    pub fn simulated_task_ids(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        self.simulations
            .iter()
            .map(|s| s.task_id.as_str())
            .filter(|id| seen.insert(*id))
            .collect()
    }

    /// Write as pretty JSON.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self).context("serialize results")?;
        std::fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }
}

/// Results of several domains from one run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MultiDomainResults {
    #[serde(default)]
    pub timestamp: Option<String>,
    pub domains: BTreeMap<String, Results>,
}

impl MultiDomainResults {
    /// Write as pretty JSON.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self).context("serialize results")?;
        std::fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }
}
