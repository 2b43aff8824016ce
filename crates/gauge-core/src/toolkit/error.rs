//! Error types for toolkit operations.

use super::capability::ToolType;

/// Failure of a single tool call.
///
/// Every variant is recoverable: the environment reports it back to the
/// conversation as a tool message and the run continues.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ToolError {
    #[error("unknown tool: {tool_name}")]
    UnknownTool { tool_name: String },

    #[error("invalid arguments for '{tool_name}': {reason}")]
    InvalidArguments { tool_name: String, reason: String },

    #[error("{resource} not found: {id}")]
    NotFound { resource: String, id: String },

    #[error("precondition failed for '{tool_name}': {reason}")]
    Precondition { tool_name: String, reason: String },

    #[error("capability '{capability}' denied for tool '{tool_name}'")]
    CapabilityDenied {
        tool_name: String,
        capability: ToolType,
    },

    #[error("tool '{tool_name}' returned an unserializable value: {reason}")]
    Output { tool_name: String, reason: String },
}

impl ToolError {
    pub fn invalid(tool_name: &str, reason: impl Into<String>) -> Self {
        ToolError::InvalidArguments {
            tool_name: tool_name.to_string(),
            reason: reason.into(),
        }
    }

    pub fn precondition(tool_name: &str, reason: impl Into<String>) -> Self {
        ToolError::Precondition {
            tool_name: tool_name.to_string(),
            reason: reason.into(),
        }
    }

    pub fn not_found(resource: &str, id: impl Into<String>) -> Self {
        ToolError::NotFound {
            resource: resource.to_string(),
            id: id.into(),
        }
    }
}

/// Result type for toolkit operations.
pub type ToolResult<T> = std::result::Result<T, ToolError>;
