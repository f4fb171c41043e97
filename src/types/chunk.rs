//! Streaming accumulation types.
//!
//! A `MessageChunk` is the unit yielded by a chat stream. Chunks merge
//! associatively, so a consumer can fold them in any grouping and obtain the
//! same final message.

use serde::{Deserialize, Serialize};

use super::message::{ChatMessage, MessageContent, MessageMetadata, MessageRole, ToolCall};
use super::result::{FinishReason, Usage};

/// A partial tool call carried by a streaming chunk. `arguments` holds a
/// fragment of the serialized argument text; fragments with the same `index`
/// concatenate in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolCallChunk {
    pub index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub arguments: String,
}

/// One streamed fragment of an assistant message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageChunk {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<MessageRole>,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_call_chunks: Vec<ToolCallChunk>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
    #[serde(default, skip_serializing_if = "MessageMetadata::is_empty")]
    pub metadata: MessageMetadata,
}

impl MessageChunk {
    /// Merge a later chunk into this one.
    ///
    /// Content concatenates, tool-call fragments concatenate per index,
    /// usage sums, the first role and the last finish reason win.
    pub fn merge(mut self, other: MessageChunk) -> MessageChunk {
        if self.role.is_none() {
            self.role = other.role;
        }
        self.content.push_str(&other.content);

        for chunk in other.tool_call_chunks {
            match self
                .tool_call_chunks
                .iter_mut()
                .find(|c| c.index == chunk.index)
            {
                Some(existing) => {
                    if existing.name.is_none() {
                        existing.name = chunk.name;
                    }
                    existing.arguments.push_str(&chunk.arguments);
                }
                None => self.tool_call_chunks.push(chunk),
            }
        }

        self.usage = match (self.usage, other.usage) {
            (Some(a), Some(b)) => Some(a.merge(&b)),
            (a, b) => a.or(b),
        };
        if other.finish_reason.is_some() {
            self.finish_reason = other.finish_reason;
        }
        self.metadata = self.metadata.union(other.metadata);
        self
    }

    /// Finalize the accumulated chunk into a complete message.
    ///
    /// Concatenated tool-call argument text is parsed as JSON; a fragment
    /// that does not form valid JSON is kept verbatim in the legacy
    /// `function_call` metadata record so callers can still inspect it.
    pub fn into_message(self) -> ChatMessage {
        let role = self.role.unwrap_or(MessageRole::Assistant);
        let mut metadata = self.metadata;
        let mut tool_calls = Vec::new();

        for chunk in self.tool_call_chunks {
            let name = match chunk.name {
                Some(name) => name,
                None => {
                    tracing::warn!(index = chunk.index, "discarding unnamed tool call fragment");
                    continue;
                }
            };
            let raw = if chunk.arguments.trim().is_empty() {
                "{}".to_string()
            } else {
                chunk.arguments
            };
            match serde_json::from_str::<serde_json::Value>(&raw) {
                Ok(arguments) => tool_calls.push(ToolCall {
                    id: None,
                    name,
                    arguments,
                }),
                Err(error) => {
                    tracing::warn!(%name, %error, "accumulated tool call arguments are not valid JSON");
                    metadata.function_call = Some(serde_json::json!({
                        "name": name,
                        "arguments": raw,
                    }));
                }
            }
        }

        ChatMessage {
            role,
            content: MessageContent::Text(self.content),
            tool_calls,
            metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content_chunk(text: &str) -> MessageChunk {
        MessageChunk {
            content: text.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn merge_concatenates_content_in_order() {
        let merged = content_chunk("Hel")
            .merge(content_chunk("lo"))
            .merge(content_chunk("!"));
        assert_eq!(merged.content, "Hello!");
    }

    #[test]
    fn merge_is_associative() {
        let a = MessageChunk {
            role: Some(MessageRole::Assistant),
            content: "Hel".to_string(),
            tool_call_chunks: vec![ToolCallChunk {
                index: 0,
                name: Some("lookup".to_string()),
                arguments: "{\"city\":".to_string(),
            }],
            usage: Some(Usage::new(5, 1)),
            ..Default::default()
        };
        let b = MessageChunk {
            content: "lo".to_string(),
            tool_call_chunks: vec![ToolCallChunk {
                index: 0,
                name: None,
                arguments: "\"Moscow\"".to_string(),
            }],
            usage: Some(Usage::new(0, 1)),
            ..Default::default()
        };
        let c = MessageChunk {
            content: "!".to_string(),
            tool_call_chunks: vec![ToolCallChunk {
                index: 0,
                name: None,
                arguments: "}".to_string(),
            }],
            finish_reason: Some(FinishReason::Stop),
            ..Default::default()
        };

        let left = a.clone().merge(b.clone()).merge(c.clone());
        let right = a.merge(b.merge(c));
        assert_eq!(left, right);
        assert_eq!(left.content, "Hello!");
        assert_eq!(left.tool_call_chunks[0].arguments, "{\"city\":\"Moscow\"}");
    }

    #[test]
    fn into_message_parses_accumulated_arguments() {
        let chunk = MessageChunk {
            role: Some(MessageRole::Assistant),
            tool_call_chunks: vec![ToolCallChunk {
                index: 0,
                name: Some("lookup".to_string()),
                arguments: "{\"city\":\"Moscow\"}".to_string(),
            }],
            ..Default::default()
        };

        let message = chunk.into_message();
        assert_eq!(message.tool_calls.len(), 1);
        assert_eq!(message.tool_calls[0].name, "lookup");
        assert_eq!(
            message.tool_calls[0].arguments,
            serde_json::json!({"city": "Moscow"})
        );
    }

    #[test]
    fn into_message_keeps_malformed_arguments_in_metadata() {
        let chunk = MessageChunk {
            tool_call_chunks: vec![ToolCallChunk {
                index: 0,
                name: Some("lookup".to_string()),
                arguments: "{\"city\": oops".to_string(),
            }],
            ..Default::default()
        };

        let message = chunk.into_message();
        assert!(message.tool_calls.is_empty());
        let record = message.metadata.function_call.expect("legacy record");
        assert_eq!(record["name"], "lookup");
        assert_eq!(record["arguments"], "{\"city\": oops");
    }

    #[test]
    fn into_message_defaults_role_to_assistant() {
        let message = content_chunk("hi").into_message();
        assert_eq!(message.role, MessageRole::Assistant);
    }
}
