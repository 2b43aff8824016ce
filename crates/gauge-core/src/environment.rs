//! Environments: one domain's policy, toolkit and interaction mode.
//!
//! An [`EnvironmentFactory`] holds the domain seed and hands out a fresh,
//! exclusively owned [`Environment`] per attempt. The environment is where
//! capability enforcement happens; toolkits only carry the tags.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::digest::{compute_digest, DigestError};
use crate::message::{ToolCall, ToolMessage};
use crate::metrics::METRICS;
use crate::obs;
use crate::task::InitialState;
use crate::toolkit::{
    CapabilityPolicy, DomainToolkit, PredicateSpec, ToolError, ToolResult, ToolSpec, ToolTable,
    Toolkit,
};

/// Failures while preparing an environment for a run.
#[derive(Debug, thiserror::Error)]
pub enum EnvironmentError {
    #[error("state patch does not fit the {domain} schema: {source}")]
    StatePatch {
        domain: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("initial action '{action}' failed: {source}")]
    InitialAction {
        action: String,
        #[source]
        source: ToolError,
    },

    #[error("domain {domain} does not support solo mode")]
    SoloModeUnsupported { domain: String },

    #[error(transparent)]
    Digest(#[from] DigestError),
}

/// A domain bound to one toolkit instance.
pub struct Environment {
    domain_name: String,
    policy: Arc<str>,
    toolkit: Box<dyn Toolkit>,
    solo_mode: bool,
    capability_policy: CapabilityPolicy,
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("domain_name", &self.domain_name)
            .field("solo_mode", &self.solo_mode)
            .field("capability_policy", &self.capability_policy)
            .finish_non_exhaustive()
    }
}

impl Environment {
    /// Environment with the permissive default policy and solo mode off.
    pub fn new(
        domain_name: impl Into<String>,
        policy: impl Into<Arc<str>>,
        toolkit: Box<dyn Toolkit>,
    ) -> Self {
        Self {
            domain_name: domain_name.into(),
            policy: policy.into(),
            toolkit,
            solo_mode: false,
            capability_policy: CapabilityPolicy::default(),
        }
    }

    pub fn with_capability_policy(mut self, policy: CapabilityPolicy) -> Self {
        self.capability_policy = policy;
        self
    }

    pub fn with_solo_mode(mut self, solo_mode: bool) -> Self {
        self.solo_mode = solo_mode;
        self
    }

    pub fn domain_name(&self) -> &str {
        &self.domain_name
    }

    pub fn policy(&self) -> &str {
        &self.policy
    }

    pub fn solo_mode(&self) -> bool {
        self.solo_mode
    }

    pub fn capability_policy(&self) -> &CapabilityPolicy {
        &self.capability_policy
    }

    pub fn toolkit(&self) -> &dyn Toolkit {
        self.toolkit.as_ref()
    }

    /// Tools the current capability policy lets the agent call.
    pub fn tools(&self) -> Vec<ToolSpec> {
        self.toolkit
            .tool_specs()
            .into_iter()
            .filter(|t| self.capability_policy.allows(&t.name, t.tool_type))
            .collect()
    }

    pub fn predicates(&self) -> Vec<PredicateSpec> {
        self.toolkit.predicate_specs()
    }

    /// Dispatch a tool after the capability check, returning the typed result.
    pub fn invoke_raw(&mut self, name: &str, arguments: &Value) -> ToolResult<Value> {
        METRICS.inc_tool_calls();
        let result = self.dispatch(name, arguments);
        if let Err(err) = &result {
            METRICS.inc_tool_failures();
            obs::emit_tool_failed(name, err);
        }
        result
    }

    fn dispatch(&mut self, name: &str, arguments: &Value) -> ToolResult<Value> {
        let tool_type = self
            .toolkit
            .tool_type(name)
            .ok_or_else(|| ToolError::UnknownTool {
                tool_name: name.to_string(),
            })?;
        self.capability_policy.check(name, tool_type)?;
        obs::emit_tool_invoked(name, tool_type);
        self.toolkit.invoke(name, arguments)
    }

    /// Dispatch without the capability check. Used for world setup and
    /// replays, never for agent calls.
    pub fn invoke_unchecked(&mut self, name: &str, arguments: &Value) -> ToolResult<Value> {
        self.toolkit.invoke(name, arguments)
    }

    /// Execute a tool call and report the outcome as a tool message.
    ///
    /// Failures become `error: true` messages; the run continues.
    pub fn invoke(&mut self, call: &ToolCall) -> ToolMessage {
        let (content, error) = match self.invoke_raw(&call.name, &call.arguments) {
            Ok(Value::String(text)) => (text, false),
            Ok(value) => (value.to_string(), false),
            Err(err) => (format!("Error: {err}"), true),
        };
        ToolMessage {
            id: call.id.clone(),
            content: Some(content),
            requestor: call.requestor,
            error,
            turn_idx: None,
            timestamp: Some(chrono::Utc::now().to_rfc3339()),
        }
    }

    /// Run an assertion predicate. `None` when no predicate has that name.
    pub fn check(&self, name: &str, arguments: &Value) -> Option<ToolResult<bool>> {
        self.toolkit.check(name, arguments)
    }

    pub fn state_snapshot(&self) -> serde_json::Result<Value> {
        self.toolkit.state_snapshot()
    }

    /// SHA-256 of the canonical JSON of the current state.
    pub fn state_digest(&self) -> Result<String, DigestError> {
        compute_digest(&self.toolkit.state_snapshot()?)
    }

    /// Apply a task's state patch, then run its initial actions.
    ///
    /// Initial actions bypass the capability policy: they set up the world
    /// rather than act on behalf of the agent.
    pub fn apply_initial_state(&mut self, initial: &InitialState) -> Result<(), EnvironmentError> {
        if let Some(patch) = &initial.state_patch {
            self.toolkit
                .patch_state(patch)
                .map_err(|source| EnvironmentError::StatePatch {
                    domain: self.domain_name.clone(),
                    source,
                })?;
        }
        for action in &initial.actions {
            self.invoke_unchecked(&action.name, &action.arguments)
                .map_err(|source| EnvironmentError::InitialAction {
                    action: action.name.clone(),
                    source,
                })?;
        }
        Ok(())
    }
}

type ToolkitBuilder = dyn Fn() -> Box<dyn Toolkit> + Send + Sync;

/// Produces fresh environments from a domain seed.
///
/// Cheap to clone; clones share the seed and the tool table.
#[derive(Clone)]
pub struct EnvironmentFactory {
    domain_name: String,
    policy: Arc<str>,
    build: Arc<ToolkitBuilder>,
    solo_mode: bool,
    supports_solo_mode: bool,
    capability_policy: CapabilityPolicy,
}

impl std::fmt::Debug for EnvironmentFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvironmentFactory")
            .field("domain_name", &self.domain_name)
            .field("solo_mode", &self.solo_mode)
            .finish_non_exhaustive()
    }
}

impl EnvironmentFactory {
    pub fn new<S>(
        domain_name: impl Into<String>,
        policy: impl Into<Arc<str>>,
        seed: S,
        table: Arc<ToolTable<S>>,
    ) -> Self
    where
        S: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        let build = move || -> Box<dyn Toolkit> {
            Box::new(DomainToolkit::new(seed.clone(), Arc::clone(&table)))
        };
        Self {
            domain_name: domain_name.into(),
            policy: policy.into(),
            build: Arc::new(build),
            solo_mode: false,
            supports_solo_mode: true,
            capability_policy: CapabilityPolicy::default(),
        }
    }

    /// Mark the domain as unable to run without a simulated user.
    pub fn without_solo_support(mut self) -> Self {
        self.supports_solo_mode = false;
        self
    }

    pub fn with_solo_mode(mut self, solo_mode: bool) -> Result<Self, EnvironmentError> {
        if solo_mode && !self.supports_solo_mode {
            return Err(EnvironmentError::SoloModeUnsupported {
                domain: self.domain_name.clone(),
            });
        }
        self.solo_mode = solo_mode;
        Ok(self)
    }

    pub fn with_capability_policy(mut self, policy: CapabilityPolicy) -> Self {
        self.capability_policy = policy;
        self
    }

    pub fn domain_name(&self) -> &str {
        &self.domain_name
    }

    pub fn policy(&self) -> &str {
        &self.policy
    }

    /// A new environment over a deep copy of the seed.
    pub fn instantiate(&self) -> Environment {
        Environment::new(self.domain_name.clone(), Arc::clone(&self.policy), (self.build)())
            .with_solo_mode(self.solo_mode)
            .with_capability_policy(self.capability_policy.clone())
    }
}
