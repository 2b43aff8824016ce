//! Operation tables: the typed registry behind every domain toolkit.
//!
//! A [`ToolTable`] maps names to handlers over a state type `S`. READ
//! handlers receive `&S` and therefore cannot mutate; WRITE handlers receive
//! `&mut S`. Assertion predicates live in a second table whose names may not
//! collide with tool names, so they are never reachable through `invoke`.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::capability::ToolType;
use super::error::{ToolError, ToolResult};

/// Handler for a READ operation.
pub type ReadFn<S> = fn(&S, &Value) -> ToolResult<Value>;
/// Handler for a WRITE operation.
pub type WriteFn<S> = fn(&mut S, &Value) -> ToolResult<Value>;

/// A tool handler. The variant fixes the capability tag.
pub enum Handler<S> {
    Read(ReadFn<S>),
    Write(WriteFn<S>),
}

impl<S> Handler<S> {
    pub fn tool_type(&self) -> ToolType {
        match self {
            Handler::Read(_) => ToolType::Read,
            Handler::Write(_) => ToolType::Write,
        }
    }
}

/// An assertion predicate over final state.
pub enum Predicate<S> {
    /// Takes no arguments.
    Nullary(fn(&S) -> bool),
    /// Takes an argument object (e.g. `{"status": "resolved"}`).
    Unary(fn(&S, &Value) -> ToolResult<bool>),
}

/// Number of arguments a predicate expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Arity {
    Nullary,
    Unary,
}

impl<S> Predicate<S> {
    pub fn arity(&self) -> Arity {
        match self {
            Predicate::Nullary(_) => Arity::Nullary,
            Predicate::Unary(_) => Arity::Unary,
        }
    }
}

/// A documented tool parameter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolParam {
    pub name: String,
    pub description: String,
    pub required: bool,
}

/// Agent-facing description of one tool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub tool_type: ToolType,
    #[serde(default)]
    pub params: Vec<ToolParam>,
}

/// Evaluator-facing description of one predicate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PredicateSpec {
    pub name: String,
    pub arity: Arity,
}

pub(crate) struct ToolEntry<S> {
    pub(crate) spec: ToolSpec,
    pub(crate) handler: Handler<S>,
}

/// Errors raised while building a table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TableError {
    #[error("duplicate registration: {name}")]
    Duplicate { name: String },

    #[error("parameter '{param}' declared before any tool")]
    OrphanParam { param: String },
}

/// Ordered set of tools plus a disjoint predicate registry.
pub struct ToolTable<S> {
    tools: Vec<ToolEntry<S>>,
    index: BTreeMap<String, usize>,
    predicates: BTreeMap<String, Predicate<S>>,
}

impl<S> ToolTable<S> {
    pub fn builder() -> ToolTableBuilder<S> {
        ToolTableBuilder {
            table: ToolTable {
                tools: Vec::new(),
                index: BTreeMap::new(),
                predicates: BTreeMap::new(),
            },
            errors: Vec::new(),
        }
    }

    pub(crate) fn tool(&self, name: &str) -> Option<&ToolEntry<S>> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    /// Tool specs in registration order.
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools.iter().map(|t| t.spec.clone()).collect()
    }

    pub fn predicate(&self, name: &str) -> Option<&Predicate<S>> {
        self.predicates.get(name)
    }

    /// Predicate specs in name order.
    pub fn predicate_specs(&self) -> Vec<PredicateSpec> {
        self.predicates
            .iter()
            .map(|(name, p)| PredicateSpec {
                name: name.clone(),
                arity: p.arity(),
            })
            .collect()
    }
}

/// Chainable builder; duplicate names surface from [`ToolTableBuilder::build`].
pub struct ToolTableBuilder<S> {
    table: ToolTable<S>,
    errors: Vec<TableError>,
}

impl<S> ToolTableBuilder<S> {
    fn name_taken(&self, name: &str) -> bool {
        self.table.index.contains_key(name) || self.table.predicates.contains_key(name)
    }

    fn push_tool(mut self, name: &str, description: &str, handler: Handler<S>) -> Self {
        if self.name_taken(name) {
            self.errors.push(TableError::Duplicate {
                name: name.to_string(),
            });
            return self;
        }
        let spec = ToolSpec {
            name: name.to_string(),
            description: description.to_string(),
            tool_type: handler.tool_type(),
            params: Vec::new(),
        };
        self.table
            .index
            .insert(name.to_string(), self.table.tools.len());
        self.table.tools.push(ToolEntry { spec, handler });
        self
    }

    fn push_predicate(mut self, name: &str, predicate: Predicate<S>) -> Self {
        if self.name_taken(name) {
            self.errors.push(TableError::Duplicate {
                name: name.to_string(),
            });
            return self;
        }
        self.table.predicates.insert(name.to_string(), predicate);
        self
    }

    /// Register a READ tool.
    pub fn read(self, name: &str, description: &str, handler: ReadFn<S>) -> Self {
        self.push_tool(name, description, Handler::Read(handler))
    }

    /// Register a WRITE tool.
    pub fn write(self, name: &str, description: &str, handler: WriteFn<S>) -> Self {
        self.push_tool(name, description, Handler::Write(handler))
    }

    /// Document a parameter of the most recently registered tool.
    pub fn param(mut self, name: &str, description: &str, required: bool) -> Self {
        match self.table.tools.last_mut() {
            Some(entry) => entry.spec.params.push(ToolParam {
                name: name.to_string(),
                description: description.to_string(),
                required,
            }),
            None => self.errors.push(TableError::OrphanParam {
                param: name.to_string(),
            }),
        }
        self
    }

    /// Register a predicate taking no arguments.
    pub fn nullary(self, name: &str, predicate: fn(&S) -> bool) -> Self {
        self.push_predicate(name, Predicate::Nullary(predicate))
    }

    /// Register a predicate taking an argument object.
    pub fn unary(self, name: &str, predicate: fn(&S, &Value) -> ToolResult<bool>) -> Self {
        self.push_predicate(name, Predicate::Unary(predicate))
    }

    pub fn build(mut self) -> Result<ToolTable<S>, TableError> {
        if self.errors.is_empty() {
            Ok(self.table)
        } else {
            Err(self.errors.remove(0))
        }
    }
}

/// Deserialize tool arguments, treating `null` as an empty object.
pub fn parse_args<T: DeserializeOwned>(tool_name: &str, arguments: &Value) -> ToolResult<T> {
    let value = if arguments.is_null() {
        Value::Object(serde_json::Map::new())
    } else {
        arguments.clone()
    };
    serde_json::from_value(value).map_err(|e| ToolError::invalid(tool_name, e.to_string()))
}

/// Serialize a tool's return value.
pub fn to_output<T: Serialize>(tool_name: &str, value: T) -> ToolResult<Value> {
    serde_json::to_value(value).map_err(|e| ToolError::Output {
        tool_name: tool_name.to_string(),
        reason: e.to_string(),
    })
}
