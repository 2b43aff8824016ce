//! Capability policy applied by the environment before dispatch.
//!
//! Tool-level denials take precedence over capability-level permissions.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::capability::ToolType;
use super::error::{ToolError, ToolResult};

/// Which capability tags (and which individual tools) a caller may use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityPolicy {
    allowed: BTreeSet<ToolType>,
    #[serde(default)]
    denied_tools: BTreeSet<String>,
}

impl Default for CapabilityPolicy {
    fn default() -> Self {
        Self::permit_all()
    }
}

impl CapabilityPolicy {
    /// READ and WRITE both allowed.
    pub fn permit_all() -> Self {
        Self {
            allowed: [ToolType::Read, ToolType::Write].into_iter().collect(),
            denied_tools: BTreeSet::new(),
        }
    }

    /// Only READ tools allowed.
    pub fn read_only() -> Self {
        Self {
            allowed: [ToolType::Read].into_iter().collect(),
            denied_tools: BTreeSet::new(),
        }
    }

    /// Deny a single tool regardless of its tag.
    pub fn deny_tool(mut self, tool_name: impl Into<String>) -> Self {
        self.denied_tools.insert(tool_name.into());
        self
    }

    pub fn allows(&self, tool_name: &str, tool_type: ToolType) -> bool {
        !self.denied_tools.contains(tool_name) && self.allowed.contains(&tool_type)
    }

    /// `Ok(())` when allowed, otherwise [`ToolError::CapabilityDenied`].
    pub fn check(&self, tool_name: &str, tool_type: ToolType) -> ToolResult<()> {
        if self.allows(tool_name, tool_type) {
            Ok(())
        } else {
            Err(ToolError::CapabilityDenied {
                tool_name: tool_name.to_string(),
                capability: tool_type,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_permits_everything() {
        let policy = CapabilityPolicy::default();
        assert!(policy.allows("get_collab_note", ToolType::Read));
        assert!(policy.allows("shutdown_cluster", ToolType::Write));
    }

    #[test]
    fn test_read_only_denies_writes() {
        let policy = CapabilityPolicy::read_only();
        assert!(policy.allows("get_cluster_status", ToolType::Read));
        match policy.check("shutdown_cluster", ToolType::Write) {
            Err(ToolError::CapabilityDenied { capability, .. }) => {
                assert_eq!(capability, ToolType::Write)
            }
            other => panic!("expected CapabilityDenied, got {other:?}"),
        }
    }

    #[test]
    fn test_tool_denial_overrides_tag() {
        let policy = CapabilityPolicy::permit_all().deny_tool("get_collab_note");
        assert!(!policy.allows("get_collab_note", ToolType::Read));
        assert!(policy.allows("get_ticket_summary", ToolType::Read));
    }
}
