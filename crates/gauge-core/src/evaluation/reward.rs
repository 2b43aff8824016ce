//! Reward records attached to each simulation.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::task::{Action, EnvAssertion, RewardBasis};

/// Treat an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Outcome of one environment assertion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnvAssertionCheck {
    pub env_assertion: EnvAssertion,
    pub met: bool,
    pub reward: f64,
}

/// Whether an expected action appeared in the trajectory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActionCheck {
    pub action: Action,
    pub action_match: bool,
    pub action_reward: f64,
}

/// Final state compared against a replay of the expected actions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DbCheck {
    pub db_match: bool,
    pub db_reward: f64,
}

/// Grade of one attempt. `reward` is in `[0, 1]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RewardInfo {
    pub reward: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub env_assertions: Vec<EnvAssertionCheck>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub action_checks: Vec<ActionCheck>,
    #[serde(default)]
    pub db_check: Option<DbCheck>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub reward_basis: Vec<RewardBasis>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub reward_breakdown: BTreeMap<RewardBasis, f64>,
    #[serde(default)]
    pub info: Option<Value>,
}

impl RewardInfo {
    /// Reward 1 with a note explaining why nothing was checked.
    pub fn unconditional(note: &str) -> Self {
        Self {
            reward: 1.0,
            env_assertions: Vec::new(),
            action_checks: Vec::new(),
            db_check: None,
            reward_basis: Vec::new(),
            reward_breakdown: BTreeMap::new(),
            info: Some(serde_json::json!({ "note": note })),
        }
    }

    /// Assertions that did not hold.
    pub fn failed_assertions(&self) -> impl Iterator<Item = &EnvAssertionCheck> {
        self.env_assertions.iter().filter(|c| !c.met)
    }
}
