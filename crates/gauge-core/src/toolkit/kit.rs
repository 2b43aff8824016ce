//! The toolkit interface and its table-driven implementation.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::capability::ToolType;
use super::error::{ToolError, ToolResult};
use super::table::{Arity, Handler, Predicate, PredicateSpec, ToolSpec, ToolTable};

/// Callable operation surface over one domain's state.
///
/// Environments hold a `Box<dyn Toolkit>` so run-loop code never names a
/// concrete domain type.
pub trait Toolkit: Send {
    /// Agent-facing tools in registration order.
    fn tool_specs(&self) -> Vec<ToolSpec>;

    /// Capability tag of `name`, or `None` if no such tool exists.
    fn tool_type(&self, name: &str) -> Option<ToolType>;

    /// Invoke an agent-facing tool.
    fn invoke(&mut self, name: &str, arguments: &Value) -> ToolResult<Value>;

    /// Evaluator-facing predicates.
    fn predicate_specs(&self) -> Vec<PredicateSpec>;

    /// Arity of predicate `name`, or `None` if no such predicate exists.
    fn predicate_arity(&self, name: &str) -> Option<Arity>;

    /// Run predicate `name`. `None` when the predicate does not exist.
    fn check(&self, name: &str, arguments: &Value) -> Option<ToolResult<bool>>;

    /// Current state serialized as JSON.
    fn state_snapshot(&self) -> serde_json::Result<Value>;

    /// Apply a JSON merge patch to the state.
    fn patch_state(&mut self, patch: &Value) -> serde_json::Result<()>;
}

/// A toolkit over state `S`, dispatching through a shared [`ToolTable`].
pub struct DomainToolkit<S> {
    state: S,
    table: Arc<ToolTable<S>>,
}

impl<S> DomainToolkit<S>
where
    S: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    pub fn new(state: S, table: Arc<ToolTable<S>>) -> Self {
        Self { state, table }
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn into_state(self) -> S {
        self.state
    }
}

impl<S> Toolkit for DomainToolkit<S>
where
    S: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn tool_specs(&self) -> Vec<ToolSpec> {
        self.table.specs()
    }

    fn tool_type(&self, name: &str) -> Option<ToolType> {
        self.table.tool(name).map(|t| t.spec.tool_type)
    }

    fn invoke(&mut self, name: &str, arguments: &Value) -> ToolResult<Value> {
        let entry = self.table.tool(name).ok_or_else(|| ToolError::UnknownTool {
            tool_name: name.to_string(),
        })?;
        match entry.handler {
            Handler::Read(f) => f(&self.state, arguments),
            Handler::Write(f) => {
                // Commit only on success so a failed write leaves no trace.
                let mut scratch = self.state.clone();
                let output = f(&mut scratch, arguments)?;
                self.state = scratch;
                Ok(output)
            }
        }
    }

    fn predicate_specs(&self) -> Vec<PredicateSpec> {
        self.table.predicate_specs()
    }

    fn predicate_arity(&self, name: &str) -> Option<Arity> {
        self.table.predicate(name).map(Predicate::arity)
    }

    fn check(&self, name: &str, arguments: &Value) -> Option<ToolResult<bool>> {
        let predicate = self.table.predicate(name)?;
        Some(match predicate {
            Predicate::Nullary(f) => Ok(f(&self.state)),
            Predicate::Unary(f) => f(&self.state, arguments),
        })
    }

    fn state_snapshot(&self) -> serde_json::Result<Value> {
        serde_json::to_value(&self.state)
    }

    fn patch_state(&mut self, patch: &Value) -> serde_json::Result<()> {
        let mut current = serde_json::to_value(&self.state)?;
        merge_patch(&mut current, patch);
        self.state = serde_json::from_value(current)?;
        Ok(())
    }
}

/// RFC 7396 JSON merge patch.
pub fn merge_patch(target: &mut Value, patch: &Value) {
    let Value::Object(patch_map) = patch else {
        *target = patch.clone();
        return;
    };
    if !target.is_object() {
        *target = Value::Object(serde_json::Map::new());
    }
    if let Value::Object(target_map) = target {
        for (key, value) in patch_map {
            if value.is_null() {
                target_map.remove(key);
            } else {
                merge_patch(
                    target_map.entry(key.clone()).or_insert(Value::Null),
                    value,
                );
            }
        }
    }
}
