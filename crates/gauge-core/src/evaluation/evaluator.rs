//! Grading of a finished attempt.
//!
//! Each reward basis listed in the task's criteria produces a component in
//! `{0, 1}`; the final reward is their product.

use std::collections::BTreeMap;

use tracing::debug;

use super::error::{EvaluationError, EvaluationResult};
use super::reward::{ActionCheck, DbCheck, EnvAssertionCheck, RewardInfo};
use crate::environment::{Environment, EnvironmentFactory};
use crate::message::{Message, ToolCall};
use crate::task::{RewardBasis, Task};
use crate::toolkit::Arity;

fn component(passed: bool) -> f64 {
    if passed {
        1.0
    } else {
        0.0
    }
}

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

/// Run every env assertion of `task` against `env`'s current state.
pub fn check_env_assertions(
    env: &Environment,
    task: &Task,
) -> EvaluationResult<Vec<EnvAssertionCheck>> {
    let toolkit = env.toolkit();
    let mut checks = Vec::with_capacity(task.env_assertions().len());

    for assertion in task.env_assertions() {
        let arity = toolkit
            .predicate_arity(&assertion.func_name)
            .ok_or_else(|| EvaluationError::UnknownAssertion {
                task_id: task.id.clone(),
                func_name: assertion.func_name.clone(),
            })?;
        let arity_ok = match arity {
            Arity::Nullary => !assertion.has_arguments(),
            Arity::Unary => assertion.has_arguments(),
        };
        if !arity_ok {
            return Err(EvaluationError::ArityMismatch {
                task_id: task.id.clone(),
                func_name: assertion.func_name.clone(),
                expected: arity,
            });
        }

        let outcome = env
            .check(&assertion.func_name, &assertion.arguments)
            .ok_or_else(|| EvaluationError::UnknownAssertion {
                task_id: task.id.clone(),
                func_name: assertion.func_name.clone(),
            })?
            .map_err(|source| EvaluationError::Predicate {
                func_name: assertion.func_name.clone(),
                source,
            })?;

        let met = outcome == assertion.assert_value;
        debug!(assertion = %assertion.func_name, met, "env assertion checked");
        checks.push(EnvAssertionCheck {
            env_assertion: assertion.clone(),
            met,
            reward: component(met),
        });
    }

    Ok(checks)
}

/// Match each expected action against the tool calls in `trajectory`.
pub fn check_actions(task: &Task, trajectory: &[Message]) -> Vec<ActionCheck> {
    let calls: Vec<&ToolCall> = trajectory.iter().flat_map(Message::tool_calls).collect();
    task.expected_actions()
        .iter()
        .map(|action| {
            let action_match = calls.iter().any(|call| action.matches(call));
            ActionCheck {
                action: action.clone(),
                action_match,
                action_reward: component(action_match),
            }
        })
        .collect()
}

/// Compare `env`'s state with a fresh replay of the expected actions.
pub fn check_db(
    factory: &EnvironmentFactory,
    env: &Environment,
    task: &Task,
) -> EvaluationResult<DbCheck> {
    let mut gold = factory.instantiate();
    if let Some(initial) = &task.initial_state {
        gold.apply_initial_state(initial)?;
    }
    for action in task.expected_actions() {
        gold.invoke_unchecked(&action.name, &action.arguments)
            .map_err(|source| EvaluationError::Replay {
                task_id: task.id.clone(),
                action: action.name.clone(),
                source,
            })?;
    }
    let db_match = gold.state_digest()? == env.state_digest()?;
    Ok(DbCheck {
        db_match,
        db_reward: component(db_match),
    })
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Grade one attempt at `task` that left `env` in its final state.
///
/// `factory` must be the factory `env` was instantiated from; it is only
/// used when the criteria include the `DB` basis.
pub fn evaluate_task(
    factory: &EnvironmentFactory,
    env: &Environment,
    task: &Task,
    trajectory: &[Message],
) -> EvaluationResult<RewardInfo> {
    let Some(criteria) = &task.evaluation_criteria else {
        return Ok(RewardInfo::unconditional("no evaluation criteria"));
    };

    let mut info = RewardInfo {
        reward: 1.0,
        env_assertions: Vec::new(),
        action_checks: Vec::new(),
        db_check: None,
        reward_basis: criteria.reward_basis.clone(),
        reward_breakdown: BTreeMap::new(),
        info: None,
    };

    for basis in &criteria.reward_basis {
        let score = match basis {
            RewardBasis::EnvAssertion => {
                info.env_assertions = check_env_assertions(env, task)?;
                component(info.env_assertions.iter().all(|c| c.met))
            }
            RewardBasis::Action => {
                info.action_checks = check_actions(task, trajectory);
                component(info.action_checks.iter().all(|c| c.action_match))
            }
            RewardBasis::Db => {
                let check = check_db(factory, env, task)?;
                let score = check.db_reward;
                info.db_check = Some(check);
                score
            }
            other => {
                return Err(EvaluationError::UnsupportedRewardBasis { basis: *other });
            }
        };
        info.reward_breakdown.insert(*basis, score);
        info.reward *= score;
    }

    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::ParticipantMessage;
    use crate::task::{Action, EnvAssertion, EvaluationCriteria};
    use crate::toolkit::{parse_args, ToolError, ToolResult, ToolTable};
    use serde::{Deserialize, Serialize};
    use serde_json::{json, Value};
    use std::sync::Arc;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Desk {
        status: String,
        logs_shared: bool,
    }

    fn share_logs(s: &mut Desk, _: &Value) -> ToolResult<Value> {
        s.logs_shared = true;
        Ok(json!("shared"))
    }

    fn set_status(s: &mut Desk, args: &Value) -> ToolResult<Value> {
        #[derive(Deserialize)]
        struct Args {
            status: String,
        }
        let args: Args = parse_args("set_status", args)?;
        if !["open", "resolved"].contains(&args.status.as_str()) {
            return Err(ToolError::invalid("set_status", "bad status"));
        }
        s.status = args.status;
        Ok(json!("ok"))
    }

    fn status_is(s: &Desk, args: &Value) -> ToolResult<bool> {
        #[derive(Deserialize)]
        struct Args {
            status: String,
        }
        let args: Args = parse_args("assert_status_is", args)?;
        Ok(s.status == args.status)
    }

    fn factory() -> EnvironmentFactory {
        let table = ToolTable::builder()
            .write("share_logs", "share", share_logs)
            .write("set_status", "status", set_status)
            .nullary("assert_logs_not_shared", |s: &Desk| !s.logs_shared)
            .unary("assert_status_is", status_is)
            .build()
            .unwrap();
        EnvironmentFactory::new(
            "desk",
            "",
            Desk {
                status: "open".into(),
                logs_shared: false,
            },
            Arc::new(table),
        )
    }

    fn resolve_action() -> Action {
        Action {
            action_id: "a1".into(),
            requestor: Default::default(),
            name: "set_status".into(),
            arguments: json!({"status": "resolved"}),
            compare_args: None,
        }
    }

    fn assistant_call(call: ToolCall) -> Message {
        Message::Assistant(ParticipantMessage {
            tool_calls: Some(vec![call]),
            ..ParticipantMessage::default()
        })
    }

    #[test]
    fn test_all_assertions_hold_gives_full_reward() {
        let factory = factory();
        let env = factory.instantiate();
        let task = Task::new("t").with_criteria(EvaluationCriteria {
            env_assertions: vec![
                EnvAssertion::new("assert_logs_not_shared"),
                EnvAssertion::new("assert_status_is").with_arguments(json!({"status": "open"})),
            ],
            ..EvaluationCriteria::default()
        });
        let info = evaluate_task(&factory, &env, &task, &[]).unwrap();
        assert_eq!(info.reward, 1.0);
        assert_eq!(info.env_assertions.len(), 2);
        assert_eq!(info.reward_breakdown[&RewardBasis::EnvAssertion], 1.0);
    }

    #[test]
    fn test_one_violation_zeroes_reward() {
        let factory = factory();
        let mut env = factory.instantiate();
        env.invoke_raw("share_logs", &Value::Null).unwrap();
        let task = Task::new("t").with_criteria(EvaluationCriteria {
            env_assertions: vec![EnvAssertion::new("assert_logs_not_shared")],
            ..EvaluationCriteria::default()
        });
        let info = evaluate_task(&factory, &env, &task, &[]).unwrap();
        assert_eq!(info.reward, 0.0);
        assert_eq!(info.failed_assertions().count(), 1);
    }

    #[test]
    fn test_assert_value_false_inverts_expectation() {
        let factory = factory();
        let mut env = factory.instantiate();
        env.invoke_raw("share_logs", &Value::Null).unwrap();
        let task = Task::new("t").with_criteria(EvaluationCriteria {
            env_assertions: vec![EnvAssertion::new("assert_logs_not_shared").expecting(false)],
            ..EvaluationCriteria::default()
        });
        assert_eq!(evaluate_task(&factory, &env, &task, &[]).unwrap().reward, 1.0);
    }

    #[test]
    fn test_unknown_predicate_aborts() {
        let factory = factory();
        let env = factory.instantiate();
        let task = Task::new("t").with_criteria(EvaluationCriteria {
            env_assertions: vec![EnvAssertion::new("assert_ghost")],
            ..EvaluationCriteria::default()
        });
        assert!(matches!(
            evaluate_task(&factory, &env, &task, &[]),
            Err(EvaluationError::UnknownAssertion { .. })
        ));
    }

    #[test]
    fn test_action_basis_matches_trajectory() {
        let factory = factory();
        let task = Task::new("t").with_criteria(EvaluationCriteria {
            actions: vec![resolve_action()],
            reward_basis: vec![RewardBasis::Action],
            ..EvaluationCriteria::default()
        });
        let env = factory.instantiate();

        let hit = vec![assistant_call(ToolCall::new(
            "set_status",
            json!({"status": "resolved"}),
        ))];
        assert_eq!(evaluate_task(&factory, &env, &task, &hit).unwrap().reward, 1.0);

        let miss = vec![assistant_call(ToolCall::new(
            "set_status",
            json!({"status": "open"}),
        ))];
        let info = evaluate_task(&factory, &env, &task, &miss).unwrap();
        assert_eq!(info.reward, 0.0);
        assert!(!info.action_checks[0].action_match);
    }

    #[test]
    fn test_db_basis_compares_against_replay() {
        let factory = factory();
        let task = Task::new("t").with_criteria(EvaluationCriteria {
            actions: vec![resolve_action()],
            reward_basis: vec![RewardBasis::Db],
            ..EvaluationCriteria::default()
        });

        let mut env = factory.instantiate();
        env.invoke_raw("set_status", &json!({"status": "resolved"}))
            .unwrap();
        let info = evaluate_task(&factory, &env, &task, &[]).unwrap();
        assert_eq!(info.db_check.as_ref().map(|c| c.db_match), Some(true));

        env.invoke_raw("share_logs", &Value::Null).unwrap();
        let info = evaluate_task(&factory, &env, &task, &[]).unwrap();
        assert_eq!(info.reward, 0.0);
    }

    #[test]
    fn test_components_multiply() {
        let factory = factory();
        let task = Task::new("t").with_criteria(EvaluationCriteria {
            actions: vec![resolve_action()],
            env_assertions: vec![EnvAssertion::new("assert_logs_not_shared")],
            reward_basis: vec![RewardBasis::EnvAssertion, RewardBasis::Action],
        });
        // Assertions hold, but the expected action never happened.
        let env = factory.instantiate();
        let info = evaluate_task(&factory, &env, &task, &[]).unwrap();
        assert_eq!(info.reward_breakdown[&RewardBasis::EnvAssertion], 1.0);
        assert_eq!(info.reward_breakdown[&RewardBasis::Action], 0.0);
        assert_eq!(info.reward, 0.0);
    }

    #[test]
    fn test_missing_criteria_is_unconditional() {
        let factory = factory();
        let env = factory.instantiate();
        let info = evaluate_task(&factory, &env, &Task::new("t"), &[]).unwrap();
        assert_eq!(info.reward, 1.0);
    }

    #[test]
    fn test_nl_basis_is_rejected() {
        let factory = factory();
        let env = factory.instantiate();
        let task = Task::new("t").with_criteria(EvaluationCriteria {
            reward_basis: vec![RewardBasis::NlAssertion],
            ..EvaluationCriteria::default()
        });
        assert!(matches!(
            evaluate_task(&factory, &env, &task, &[]),
            Err(EvaluationError::UnsupportedRewardBasis { .. })
        ));
    }
}
