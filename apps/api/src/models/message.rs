use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::llm_client::{ChatMessage, ToolCall};

/// Message roles as they appear on the wire and in storage.
pub mod role {
    pub const SYSTEM: &str = "system";
    pub const USER: &str = "user";
    pub const ASSISTANT: &str = "assistant";
    pub const TOOL: &str = "tool";
}

/// A chat message as persisted in a session row: the wire shape plus a
/// timestamp. The timestamp is stripped before the message is sent to the LLM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredMessage {
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl StoredMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self::plain(role::SYSTEM, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::plain(role::USER, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::plain(role::ASSISTANT, content)
    }

    /// An assistant turn that requested tool calls. Content may be absent.
    pub fn assistant_with_calls(content: Option<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: role::ASSISTANT.to_string(),
            content,
            tool_calls: Some(tool_calls),
            tool_call_id: None,
            name: None,
            timestamp: Utc::now(),
        }
    }

    /// The result of one tool call, fed back to the model. `content` is the
    /// JSON-encoded result.
    pub fn tool(tool_call_id: &str, name: &str, content: impl Into<String>) -> Self {
        Self {
            role: role::TOOL.to_string(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: Some(tool_call_id.to_string()),
            name: Some(name.to_string()),
            timestamp: Utc::now(),
        }
    }

    fn plain(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
            name: None,
            timestamp: Utc::now(),
        }
    }
}

impl From<&StoredMessage> for ChatMessage {
    fn from(m: &StoredMessage) -> Self {
        ChatMessage {
            role: m.role.clone(),
            content: m.content.clone(),
            tool_calls: m.tool_calls.clone(),
            tool_call_id: m.tool_call_id.clone(),
            name: m.name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_conversion_drops_timestamp() {
        let stored = StoredMessage::user("hello");
        let wire: ChatMessage = (&stored).into();
        let value = serde_json::to_value(&wire).unwrap();
        assert!(!value.as_object().unwrap().contains_key("timestamp"));
        assert_eq!(value["role"], "user");
        assert_eq!(value["content"], "hello");
    }

    #[test]
    fn test_tool_message_carries_call_id_and_name() {
        let stored = StoredMessage::tool("call_9", "delete_talent", "{\"deleted\":true}");
        assert_eq!(stored.role, role::TOOL);
        assert_eq!(stored.tool_call_id.as_deref(), Some("call_9"));
        assert_eq!(stored.name.as_deref(), Some("delete_talent"));
    }

    #[test]
    fn test_stored_message_round_trips_through_json() {
        let stored = StoredMessage::assistant("done");
        let raw = serde_json::to_string(&stored).unwrap();
        let back: StoredMessage = serde_json::from_str(&raw).unwrap();
        assert_eq!(back.role, role::ASSISTANT);
        assert_eq!(back.content.as_deref(), Some("done"));
        assert_eq!(back.timestamp, stored.timestamp);
    }
}
