//! Toolkits: capability-tagged operations over a domain's state.
//!
//! # Modules
//!
//! - [`capability`]: `ToolType` (Read, Write)
//! - [`table`]: `ToolTable` operation/predicate registry, arg helpers
//! - [`kit`]: `Toolkit` trait, `DomainToolkit<S>`
//! - [`policy`]: `CapabilityPolicy` enforced by the environment
//! - [`error`]: `ToolError` / `ToolResult`

pub mod capability;
pub mod error;
pub mod kit;
pub mod policy;
pub mod table;

pub use capability::ToolType;
pub use error::{ToolError, ToolResult};
pub use kit::{merge_patch, DomainToolkit, Toolkit};
pub use policy::CapabilityPolicy;
pub use table::{
    parse_args, to_output, Arity, Predicate, PredicateSpec, TableError, ToolParam, ToolSpec,
    ToolTable, ToolTableBuilder,
};
