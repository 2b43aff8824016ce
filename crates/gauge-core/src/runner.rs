//! Scripted trials.
//!
//! A scripted trial replays a fixed list of tool calls against a fresh
//! environment, grades the final state and records the attempt as a
//! [`SimulationRun`]. The conversation loop that would normally choose the
//! calls lives outside this crate.

use std::time::Instant;

use chrono::Utc;
use tokio::task::JoinSet;
use tracing::debug;
use uuid::Uuid;

use crate::environment::EnvironmentFactory;
use crate::error::Result;
use crate::evaluation::evaluate_task;
use crate::message::{Message, ParticipantMessage, ToolCall};
use crate::metrics::METRICS;
use crate::obs::{self, TrialSpan};
use crate::results::{
    EnvironmentInfo, ParticipantInfo, Results, RunInfo, SimulationRun, TerminationReason,
};
use crate::task::{Instructions, Task};

/// The task's expected actions as tool calls.
pub fn scripted_calls(task: &Task) -> Vec<ToolCall> {
    task.expected_actions()
        .iter()
        .map(|a| a.to_tool_call())
        .collect()
}

/// What the simulated user opens the conversation with.
fn opening_message(task: &Task) -> Option<String> {
    if let Some(prompt) = &task.user_prompt {
        return Some(prompt.clone());
    }
    task.user_scenario.as_ref().map(|s| match &s.instructions {
        Instructions::Text(text) => text.clone(),
        Instructions::Structured(i) => i.task_instructions.clone(),
    })
}

/// Run one scripted attempt at `task`.
pub fn run_trial(
    factory: &EnvironmentFactory,
    task: &Task,
    script: &[ToolCall],
    trial: u32,
) -> Result<SimulationRun> {
    let _span = TrialSpan::enter(factory.domain_name(), &task.id, trial);
    obs::emit_trial_started(factory.domain_name(), &task.id, trial);

    let start_time = Utc::now();
    let clock = Instant::now();

    let mut env = factory.instantiate();
    if let Some(initial) = &task.initial_state {
        env.apply_initial_state(initial)?;
    }

    let mut messages = vec![Message::System {
        content: Some(env.policy().to_string()),
    }];
    if !env.solo_mode() {
        messages.push(Message::User(ParticipantMessage {
            content: opening_message(task),
            turn_idx: Some(0),
            timestamp: Some(start_time.to_rfc3339()),
            ..ParticipantMessage::default()
        }));
    }

    for (idx, call) in script.iter().enumerate() {
        let turn_idx = Some(idx as u32 + 1);
        messages.push(Message::Assistant(ParticipantMessage {
            tool_calls: Some(vec![call.clone()]),
            turn_idx,
            timestamp: Some(Utc::now().to_rfc3339()),
            ..ParticipantMessage::default()
        }));
        let mut reply = env.invoke(call);
        reply.turn_idx = turn_idx;
        messages.push(Message::Tool(reply));
    }

    let reward_info = evaluate_task(factory, &env, task, &messages)?;
    METRICS.inc_trials_evaluated();
    obs::emit_trial_evaluated(&task.id, trial, reward_info.reward);

    let failed_calls = messages.iter().filter(|m| m.is_tool_error()).count();
    debug!(task_id = %task.id, trial, failed_calls, "scripted trial finished");

    Ok(SimulationRun {
        id: Uuid::new_v4().to_string(),
        task_id: task.id.clone(),
        trial: Some(trial),
        start_time: start_time.to_rfc3339(),
        end_time: Utc::now().to_rfc3339(),
        duration: clock.elapsed().as_secs_f64(),
        termination_reason: TerminationReason::AgentStop,
        agent_cost: None,
        user_cost: None,
        reward_info: Some(reward_info),
        messages,
        seed: None,
    })
}

/// Run `num_trials` attempts concurrently, each on its own environment.
///
/// Runs are returned in trial order.
pub async fn run_trials(
    factory: &EnvironmentFactory,
    task: &Task,
    script: &[ToolCall],
    num_trials: u32,
) -> Result<Vec<SimulationRun>> {
    let mut join_set = JoinSet::new();
    for trial in 0..num_trials {
        let factory = factory.clone();
        let task = task.clone();
        let script = script.to_vec();
        join_set.spawn_blocking(move || run_trial(&factory, &task, &script, trial));
    }

    let mut runs = Vec::with_capacity(num_trials as usize);
    while let Some(joined) = join_set.join_next().await {
        runs.push(joined??);
    }
    runs.sort_by_key(|r| r.trial);
    Ok(runs)
}

/// Package scripted runs as a single-domain results container.
pub fn build_results(
    factory: &EnvironmentFactory,
    tasks: Vec<Task>,
    simulations: Vec<SimulationRun>,
    num_trials: u32,
) -> Results {
    Results {
        timestamp: Some(Utc::now().to_rfc3339()),
        info: RunInfo {
            git_commit: None,
            num_trials: Some(num_trials),
            max_steps: None,
            max_errors: None,
            user_info: ParticipantInfo {
                implementation: "scripted".to_string(),
                llm: None,
                llm_args: None,
            },
            agent_info: ParticipantInfo {
                implementation: "scripted".to_string(),
                llm: None,
                llm_args: None,
            },
            environment_info: EnvironmentInfo {
                domain_name: factory.domain_name().to_string(),
                policy: Some(factory.policy().to_string()),
                tool_defs: None,
            },
            seed: None,
        },
        tasks,
        simulations,
    }
}
