//! Tool capabilities: the READ/WRITE axis for audit and mode restriction.

use serde::{Deserialize, Serialize};

/// What kind of operation a tool performs.
///
/// The tag is metadata. A toolkit never refuses a call because of it; the
/// [`Environment`](crate::environment::Environment) consults its
/// [`CapabilityPolicy`](super::policy::CapabilityPolicy) before dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolType {
    Read,
    Write,
}

impl ToolType {
    /// Whether a tool with this tag may change state.
    pub fn mutates(self) -> bool {
        matches!(self, ToolType::Write)
    }
}

impl std::fmt::Display for ToolType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolType::Read => write!(f, "read"),
            ToolType::Write => write!(f, "write"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_covers_all_variants() {
        assert_eq!(ToolType::Read.to_string(), "read");
        assert_eq!(ToolType::Write.to_string(), "write");
    }

    #[test]
    fn test_only_write_mutates() {
        assert!(!ToolType::Read.mutates());
        assert!(ToolType::Write.mutates());
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&vec![ToolType::Read, ToolType::Write]).unwrap();
        assert_eq!(json, r#"["read","write"]"#);
    }
}
