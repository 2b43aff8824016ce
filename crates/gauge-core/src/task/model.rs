//! Task definitions and evaluation criteria.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::message::{Requestor, ToolCall};

/// Component multiplied into a task's reward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RewardBasis {
    /// Environment assertions over final state.
    EnvAssertion,
    /// Expected actions appear in the trajectory.
    Action,
    /// Final state matches a replay of the expected actions.
    Db,
    /// Natural-language judgments. Accepted in result files, never evaluated.
    NlAssertion,
    /// Required facts relayed to the user. Accepted in result files, never evaluated.
    Communicate,
}

impl std::fmt::Display for RewardBasis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RewardBasis::EnvAssertion => "ENV_ASSERTION",
            RewardBasis::Action => "ACTION",
            RewardBasis::Db => "DB",
            RewardBasis::NlAssertion => "NL_ASSERTION",
            RewardBasis::Communicate => "COMMUNICATE",
        };
        f.write_str(s)
    }
}

fn default_reward_basis() -> Vec<RewardBasis> {
    vec![RewardBasis::EnvAssertion]
}

fn default_true() -> bool {
    true
}

/// Reference to an assertion predicate on the bound toolkit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnvAssertion {
    pub func_name: String,
    /// Argument object for unary predicates; `null` or `{}` for nullary ones.
    #[serde(default)]
    pub arguments: Value,
    /// Value the predicate must return for the assertion to hold.
    #[serde(default = "default_true")]
    pub assert_value: bool,
    #[serde(default)]
    pub message: Option<String>,
}

impl EnvAssertion {
    pub fn new(func_name: impl Into<String>) -> Self {
        Self {
            func_name: func_name.into(),
            arguments: Value::Null,
            assert_value: true,
            message: None,
        }
    }

    pub fn with_arguments(mut self, arguments: Value) -> Self {
        self.arguments = arguments;
        self
    }

    pub fn expecting(mut self, assert_value: bool) -> Self {
        self.assert_value = assert_value;
        self
    }

    /// Whether any arguments were supplied.
    pub fn has_arguments(&self) -> bool {
        match &self.arguments {
            Value::Null => false,
            Value::Object(map) => !map.is_empty(),
            _ => true,
        }
    }
}

/// An expected tool call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Action {
    pub action_id: String,
    #[serde(default)]
    pub requestor: Requestor,
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
    /// Argument keys compared when matching; all keys when absent.
    #[serde(default)]
    pub compare_args: Option<Vec<String>>,
}

impl Action {
    /// Whether `call` satisfies this expected action.
    pub fn matches(&self, call: &ToolCall) -> bool {
        if call.name != self.name {
            return false;
        }
        let keys: Vec<&str> = match &self.compare_args {
            Some(keys) => keys.iter().map(String::as_str).collect(),
            None => match &self.arguments {
                Value::Object(map) => map.keys().map(String::as_str).collect(),
                _ => Vec::new(),
            },
        };
        keys.iter()
            .all(|k| self.arguments.get(k) == call.arguments.get(k))
    }

    /// The tool call this action describes.
    pub fn to_tool_call(&self) -> ToolCall {
        ToolCall {
            id: self.action_id.clone(),
            name: self.name.clone(),
            arguments: self.arguments.clone(),
            requestor: self.requestor,
        }
    }
}

/// How a task attempt is graded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvaluationCriteria {
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default)]
    pub env_assertions: Vec<EnvAssertion>,
    #[serde(default = "default_reward_basis")]
    pub reward_basis: Vec<RewardBasis>,
}

impl Default for EvaluationCriteria {
    fn default() -> Self {
        Self {
            actions: Vec::new(),
            env_assertions: Vec::new(),
            reward_basis: default_reward_basis(),
        }
    }
}

/// Structured instructions for the simulated user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StructuredInstructions {
    #[serde(default)]
    pub domain: Option<String>,
    pub reason_for_call: String,
    #[serde(default)]
    pub known_info: Option<String>,
    #[serde(default)]
    pub unknown_info: Option<String>,
    pub task_instructions: String,
}

/// Free text or structured user instructions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Instructions {
    Text(String),
    Structured(StructuredInstructions),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserScenario {
    #[serde(default)]
    pub persona: Option<String>,
    pub instructions: Instructions,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TaskDescription {
    #[serde(default)]
    pub purpose: Option<String>,
    #[serde(default)]
    pub relevant_policies: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// State adjustments applied to a fresh environment before the run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct InitialState {
    /// JSON merge patch over the seed state.
    #[serde(default)]
    pub state_patch: Option<Value>,
    /// Tool calls executed before the conversation starts.
    #[serde(default)]
    pub actions: Vec<Action>,
}

/// One scenario. Immutable once loaded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: String,
    #[serde(default)]
    pub description: Option<TaskDescription>,
    #[serde(default)]
    pub user_prompt: Option<String>,
    #[serde(default)]
    pub agent_prompt: Option<String>,
    #[serde(default)]
    pub user_scenario: Option<UserScenario>,
    #[serde(default)]
    pub initial_state: Option<InitialState>,
    #[serde(default)]
    pub evaluation_criteria: Option<EvaluationCriteria>,
}

impl Task {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: None,
            user_prompt: None,
            agent_prompt: None,
            user_scenario: None,
            initial_state: None,
            evaluation_criteria: None,
        }
    }

    pub fn with_criteria(mut self, criteria: EvaluationCriteria) -> Self {
        self.evaluation_criteria = Some(criteria);
        self
    }

    pub fn env_assertions(&self) -> &[EnvAssertion] {
        self.evaluation_criteria
            .as_ref()
            .map(|c| c.env_assertions.as_slice())
            .unwrap_or(&[])
    }

    pub fn expected_actions(&self) -> &[Action] {
        self.evaluation_criteria
            .as_ref()
            .map(|c| c.actions.as_slice())
            .unwrap_or(&[])
    }
}
