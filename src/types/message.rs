//! Provider-agnostic chat message model.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Message role. The set is open: roles the adapter does not know about are
/// carried through as `Custom` so vendor-specific roles survive a round trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MessageRole {
    System,
    User,
    Assistant,
    /// Result of a function (tool) execution
    Function,
    /// Alias role used by callers that speak "tool"; lowered to `function`
    Tool,
    /// Any role outside the closed set, e.g. `search_result`
    Custom(String),
}

impl From<String> for MessageRole {
    fn from(role: String) -> Self {
        match role.as_str() {
            "system" => Self::System,
            "user" => Self::User,
            "assistant" => Self::Assistant,
            "function" => Self::Function,
            "tool" => Self::Tool,
            _ => Self::Custom(role),
        }
    }
}

impl From<MessageRole> for String {
    fn from(role: MessageRole) -> Self {
        match role {
            MessageRole::System => "system".to_string(),
            MessageRole::User => "user".to_string(),
            MessageRole::Assistant => "assistant".to_string(),
            MessageRole::Function => "function".to_string(),
            MessageRole::Tool => "tool".to_string(),
            MessageRole::Custom(role) => role,
        }
    }
}

/// Message content: plain text or a list of parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl Default for MessageContent {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

/// A single content part of a multimodal message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    Image { url: String },
}

/// A tool call requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub arguments: serde_json::Value,
}

/// Message metadata that must survive translation in both directions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageMetadata {
    /// Identifiers of files previously uploaded to the vendor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<String>>,
    /// Session affinity token for stateful function calling
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub functions_state_id: Option<String>,
    /// Legacy single-function-call record: `{ "name": ..., "arguments": <JSON string> }`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<serde_json::Value>,
    /// Open extension bag
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub custom: HashMap<String, serde_json::Value>,
}

impl MessageMetadata {
    pub fn is_empty(&self) -> bool {
        self.attachments.is_none()
            && self.functions_state_id.is_none()
            && self.function_call.is_none()
            && self.custom.is_empty()
    }

    /// Union of two metadata bags; fields already set on `self` win.
    pub fn union(mut self, other: MessageMetadata) -> MessageMetadata {
        if self.attachments.is_none() {
            self.attachments = other.attachments;
        }
        if self.functions_state_id.is_none() {
            self.functions_state_id = other.functions_state_id;
        }
        if self.function_call.is_none() {
            self.function_call = other.function_call;
        }
        for (key, value) in other.custom {
            self.custom.entry(key).or_insert(value);
        }
        self
    }
}

/// A chat message in the provider-agnostic model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: MessageContent,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "MessageMetadata::is_empty")]
    pub metadata: MessageMetadata,
}

impl ChatMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: MessageContent::Text(content.into()),
            tool_calls: Vec::new(),
            metadata: MessageMetadata::default(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    pub fn function(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Function, content)
    }

    pub fn with_tool_call(mut self, tool_call: ToolCall) -> Self {
        self.tool_calls.push(tool_call);
        self
    }

    pub fn with_metadata(mut self, metadata: MessageMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_string() {
        for role in ["system", "user", "assistant", "function", "tool"] {
            let parsed = MessageRole::from(role.to_string());
            assert_eq!(String::from(parsed), role);
        }

        let custom = MessageRole::from("search_result".to_string());
        assert_eq!(custom, MessageRole::Custom("search_result".to_string()));
        assert_eq!(String::from(custom), "search_result");
    }

    #[test]
    fn metadata_union_prefers_left_side() {
        let left = MessageMetadata {
            functions_state_id: Some("abc".to_string()),
            ..Default::default()
        };
        let right = MessageMetadata {
            functions_state_id: Some("def".to_string()),
            attachments: Some(vec!["file-1".to_string()]),
            ..Default::default()
        };

        let merged = left.union(right);
        assert_eq!(merged.functions_state_id.as_deref(), Some("abc"));
        assert_eq!(merged.attachments, Some(vec!["file-1".to_string()]));
    }
}
