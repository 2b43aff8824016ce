//! Conversation messages and tool calls recorded in a trajectory.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Which conversation participant issued a tool call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Requestor {
    #[default]
    Assistant,
    User,
}

/// A single tool invocation request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
    #[serde(default)]
    pub requestor: Requestor,
}

impl ToolCall {
    /// New assistant-issued call with a fresh id.
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            arguments,
            requestor: Requestor::Assistant,
        }
    }
}

/// Text and/or tool calls from the agent or the simulated user.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ParticipantMessage {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(default)]
    pub turn_idx: Option<u32>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub cost: Option<f64>,
}

/// Result of executing a tool call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolMessage {
    /// Id of the [`ToolCall`] this answers.
    pub id: String,
    pub content: Option<String>,
    #[serde(default)]
    pub requestor: Requestor,
    #[serde(default)]
    pub error: bool,
    #[serde(default)]
    pub turn_idx: Option<u32>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// One entry in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Message {
    System {
        #[serde(default)]
        content: Option<String>,
    },
    Assistant(ParticipantMessage),
    User(ParticipantMessage),
    Tool(ToolMessage),
}

impl Message {
    /// Tool calls carried by this message, if any.
    pub fn tool_calls(&self) -> &[ToolCall] {
        match self {
            Message::Assistant(m) | Message::User(m) => m.tool_calls.as_deref().unwrap_or(&[]),
            _ => &[],
        }
    }

    pub fn is_tool_error(&self) -> bool {
        matches!(self, Message::Tool(t) if t.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_role_tag_selects_variant() {
        let raw = json!([
            {"role": "system", "content": "policy"},
            {"role": "assistant", "content": null, "tool_calls": [
                {"id": "c1", "name": "get_collab_note", "arguments": {}}
            ]},
            {"role": "tool", "id": "c1", "content": "note", "error": false},
            {"role": "user", "content": "thanks"}
        ]);
        let messages: Vec<Message> = serde_json::from_value(raw).unwrap();
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[1].tool_calls()[0].name, "get_collab_note");
        assert_eq!(messages[1].tool_calls()[0].requestor, Requestor::Assistant);
        assert!(matches!(messages[2], Message::Tool(_)));
        assert!(messages[3].tool_calls().is_empty());
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let raw = json!({"role": "assistant", "content": "hi", "usage": {"tokens": 3}});
        let msg: Message = serde_json::from_value(raw).unwrap();
        assert!(matches!(msg, Message::Assistant(_)));
    }

    #[test]
    fn test_tool_error_flag() {
        let msg = Message::Tool(ToolMessage {
            id: "c1".into(),
            content: Some("Error: nope".into()),
            requestor: Requestor::Assistant,
            error: true,
            turn_idx: None,
            timestamp: None,
        });
        assert!(msg.is_tool_error());
    }

    #[test]
    fn test_new_tool_call_has_unique_ids() {
        let a = ToolCall::new("get_collab_note", json!({}));
        let b = ToolCall::new("get_collab_note", json!({}));
        assert_ne!(a.id, b.id);
    }
}
