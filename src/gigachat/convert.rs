//! Conversion between the provider-agnostic message model and GigaChat wire
//! messages, in both directions.

use crate::error::LlmError;
use crate::gigachat::wire::{ChatCompletion, FunctionCall, GigaChatMessage, KNOWN_ROLES};
use crate::types::{
    ChatMessage, ChatResult, ContentPart, FinishReason, MessageContent, MessageMetadata,
    MessageRole, ToolCall,
};

/// Lower a generic role to the vendor role string.
///
/// `Tool` maps to `function` (GigaChat has no separate tool role). Custom
/// roles pass through verbatim; roles outside the known vendor set are
/// logged but never rejected.
pub fn role_to_vendor(role: &MessageRole) -> String {
    match role {
        MessageRole::System => "system".to_string(),
        MessageRole::User => "user".to_string(),
        MessageRole::Assistant => "assistant".to_string(),
        MessageRole::Function | MessageRole::Tool => "function".to_string(),
        MessageRole::Custom(custom) => {
            if !KNOWN_ROLES.contains(&custom.as_str()) {
                tracing::warn!(role = %custom, "unknown message role");
            }
            custom.clone()
        }
    }
}

/// Extract the plain-text rendering of message content.
///
/// Text parts join with a single space; non-text parts are dropped.
pub fn extract_text(content: &MessageContent) -> String {
    match content {
        MessageContent::Text(text) => text.clone(),
        MessageContent::Parts(parts) => {
            let dropped = parts
                .iter()
                .filter(|part| !matches!(part, ContentPart::Text { .. }))
                .count();
            if dropped > 0 {
                tracing::warn!(dropped, "dropping non-text content parts");
            }
            parts
                .iter()
                .filter_map(|part| match part {
                    ContentPart::Text { text } => Some(text.as_str()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join(" ")
        }
    }
}

fn convert_function_call(message: &ChatMessage) -> Result<Option<FunctionCall>, LlmError> {
    if message.role == MessageRole::Assistant && !message.tool_calls.is_empty() {
        if message.tool_calls.len() > 1 {
            tracing::warn!(
                count = message.tool_calls.len(),
                "GigaChat supports a single function call per message; extra calls dropped"
            );
        }
        let first = &message.tool_calls[0];
        return Ok(Some(FunctionCall {
            name: first.name.clone(),
            arguments: first.arguments.clone(),
        }));
    }

    // Legacy record: arguments stored as a JSON string.
    if let Some(record) = &message.metadata.function_call {
        let name = record
            .get("name")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                LlmError::InvalidInput("legacy function_call record has no name".to_string())
            })?
            .to_string();
        let arguments = match record.get("arguments") {
            Some(serde_json::Value::String(raw)) => {
                serde_json::from_str(raw).map_err(|e| {
                    LlmError::InvalidInput(format!(
                        "legacy function_call arguments are not valid JSON: {e}"
                    ))
                })?
            }
            Some(value) => value.clone(),
            None => {
                return Err(LlmError::InvalidInput(
                    "legacy function_call record has no arguments".to_string(),
                ));
            }
        };
        return Ok(Some(FunctionCall { name, arguments }));
    }

    Ok(None)
}

/// Lower a generic message to the vendor format.
pub fn convert_chat_message(message: &ChatMessage) -> Result<GigaChatMessage, LlmError> {
    let role = role_to_vendor(&message.role);
    let mut content = extract_text(&message.content);

    // Function results are sent as a JSON-encoded string.
    if role == "function" {
        content = serde_json::Value::String(content).to_string();
    }

    let function_call = convert_function_call(message)?;

    Ok(GigaChatMessage {
        role,
        content,
        function_call,
        attachments: message.metadata.attachments.clone(),
        functions_state_id: message.metadata.functions_state_id.clone(),
    })
}

/// Lower a whole conversation.
pub fn convert_messages(messages: &[ChatMessage]) -> Result<Vec<GigaChatMessage>, LlmError> {
    messages.iter().map(convert_chat_message).collect()
}

/// Translate a vendor message back into the generic model.
pub fn convert_from_vendor_message(message: &GigaChatMessage) -> ChatMessage {
    let role = match message.role.as_str() {
        "system" => MessageRole::System,
        "user" => MessageRole::User,
        "assistant" => MessageRole::Assistant,
        "function" => MessageRole::Function,
        other => {
            if !KNOWN_ROLES.contains(&other) {
                tracing::warn!(role = %other, "unknown message role in response");
            }
            MessageRole::Custom(other.to_string())
        }
    };

    let mut metadata = MessageMetadata {
        functions_state_id: message.functions_state_id.clone(),
        attachments: message.attachments.clone(),
        ..Default::default()
    };

    let mut tool_calls = Vec::new();
    if let Some(call) = &message.function_call {
        tool_calls.push(ToolCall {
            id: Some(format!("call_{}", chrono::Utc::now().timestamp_millis())),
            name: call.name.clone(),
            arguments: call.arguments.clone(),
        });
        metadata.function_call = Some(serde_json::json!({
            "name": call.name,
            "arguments": call.arguments.to_string(),
        }));
    }

    ChatMessage {
        role,
        content: MessageContent::Text(message.content.clone()),
        tool_calls,
        metadata,
    }
}

/// Translate a non-streaming completion into a [`ChatResult`].
///
/// Only the first choice is translated; extra choices are discarded.
pub fn convert_chat_response(response: ChatCompletion) -> Result<ChatResult, LlmError> {
    let choice = response
        .choices
        .first()
        .ok_or_else(|| LlmError::ParseError("response contained no choices".to_string()))?;
    if response.choices.len() > 1 {
        tracing::warn!(
            discarded = response.choices.len() - 1,
            "discarding extra response choices"
        );
    }

    let message = convert_from_vendor_message(&choice.message);
    let text = extract_text(&message.content);
    let finish_reason = choice
        .finish_reason
        .as_deref()
        .map(FinishReason::from_vendor);

    Ok(ChatResult {
        message,
        text,
        model: response.model,
        usage: response.usage.map(|u| u.lower()),
        finish_reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gigachat::wire::{Choice, WireUsage};
    use serde_json::json;

    #[test]
    fn converts_basic_roles() {
        let lowered = convert_chat_message(&ChatMessage::user("hi")).unwrap();
        assert_eq!(lowered.role, "user");
        assert_eq!(lowered.content, "hi");

        let lowered = convert_chat_message(&ChatMessage::system("rules")).unwrap();
        assert_eq!(lowered.role, "system");

        let lowered =
            convert_chat_message(&ChatMessage::new(MessageRole::Tool, "result")).unwrap();
        assert_eq!(lowered.role, "function");
    }

    #[test]
    fn function_role_content_is_json_encoded() {
        let lowered = convert_chat_message(&ChatMessage::function("42 degrees")).unwrap();
        assert_eq!(lowered.content, "\"42 degrees\"");
    }

    #[test]
    fn custom_role_passes_through() {
        let message = ChatMessage::new(MessageRole::Custom("search_result".to_string()), "found");
        let lowered = convert_chat_message(&message).unwrap();
        assert_eq!(lowered.role, "search_result");

        // An unlisted role is tolerated as well, not rejected.
        let message = ChatMessage::new(MessageRole::Custom("moderator".to_string()), "x");
        assert_eq!(convert_chat_message(&message).unwrap().role, "moderator");
    }

    #[test]
    fn parts_join_with_single_space_and_drop_non_text() {
        let message = ChatMessage {
            role: MessageRole::User,
            content: MessageContent::Parts(vec![
                ContentPart::Text {
                    text: "look at".to_string(),
                },
                ContentPart::Image {
                    url: "https://example.com/cat.png".to_string(),
                },
                ContentPart::Text {
                    text: "this".to_string(),
                },
            ]),
            tool_calls: Vec::new(),
            metadata: MessageMetadata::default(),
        };
        assert_eq!(convert_chat_message(&message).unwrap().content, "look at this");
    }

    #[test]
    fn first_tool_call_becomes_function_call() {
        let message = ChatMessage::assistant("")
            .with_tool_call(ToolCall {
                id: None,
                name: "lookup".to_string(),
                arguments: json!({"city": "Moscow"}),
            })
            .with_tool_call(ToolCall {
                id: None,
                name: "ignored".to_string(),
                arguments: json!({}),
            });

        let lowered = convert_chat_message(&message).unwrap();
        let call = lowered.function_call.expect("function call");
        assert_eq!(call.name, "lookup");
        assert_eq!(call.arguments, json!({"city": "Moscow"}));
    }

    #[test]
    fn legacy_function_call_record_is_parsed() {
        let mut message = ChatMessage::assistant("");
        message.metadata.function_call = Some(json!({
            "name": "lookup",
            "arguments": "{\"city\":\"Moscow\"}",
        }));

        let lowered = convert_chat_message(&message).unwrap();
        let call = lowered.function_call.expect("function call");
        assert_eq!(call.name, "lookup");
        assert_eq!(call.arguments, json!({"city": "Moscow"}));
    }

    #[test]
    fn malformed_legacy_arguments_fail_fast() {
        let mut message = ChatMessage::assistant("");
        message.metadata.function_call = Some(json!({
            "name": "lookup",
            "arguments": "{broken",
        }));

        assert!(matches!(
            convert_chat_message(&message),
            Err(LlmError::InvalidInput(_))
        ));
    }

    #[test]
    fn attachments_and_state_id_pass_through() {
        let message = ChatMessage::user("describe").with_metadata(MessageMetadata {
            attachments: Some(vec!["file-1".to_string()]),
            functions_state_id: Some("state-7".to_string()),
            ..Default::default()
        });

        let lowered = convert_chat_message(&message).unwrap();
        assert_eq!(lowered.attachments, Some(vec!["file-1".to_string()]));
        assert_eq!(lowered.functions_state_id.as_deref(), Some("state-7"));
    }

    #[test]
    fn tool_call_round_trip() {
        let original = ChatMessage::assistant("").with_tool_call(ToolCall {
            id: None,
            name: "lookup".to_string(),
            arguments: json!({"city": "Moscow"}),
        });

        let lowered = convert_chat_message(&original).unwrap();
        let restored = convert_from_vendor_message(&lowered);

        assert_eq!(restored.role, MessageRole::Assistant);
        assert_eq!(restored.tool_calls.len(), 1);
        assert_eq!(restored.tool_calls[0].name, "lookup");
        assert_eq!(restored.tool_calls[0].arguments, json!({"city": "Moscow"}));
        // The legacy record is also populated on the way back.
        let record = restored.metadata.function_call.expect("legacy record");
        assert_eq!(record["name"], "lookup");
    }

    #[test]
    fn vendor_search_result_role_is_tolerated() {
        let vendor = GigaChatMessage {
            role: "search_result".to_string(),
            content: "three results".to_string(),
            function_call: None,
            attachments: None,
            functions_state_id: None,
        };
        let message = convert_from_vendor_message(&vendor);
        assert_eq!(
            message.role,
            MessageRole::Custom("search_result".to_string())
        );
    }

    #[test]
    fn response_translation_uses_first_choice_only() {
        let response = ChatCompletion {
            choices: vec![
                Choice {
                    message: GigaChatMessage {
                        role: "assistant".to_string(),
                        content: "Hi there".to_string(),
                        function_call: None,
                        attachments: None,
                        functions_state_id: None,
                    },
                    finish_reason: Some("stop".to_string()),
                    index: Some(0),
                },
                Choice {
                    message: GigaChatMessage {
                        role: "assistant".to_string(),
                        content: "ignored".to_string(),
                        function_call: None,
                        attachments: None,
                        functions_state_id: None,
                    },
                    finish_reason: Some("stop".to_string()),
                    index: Some(1),
                },
            ],
            model: Some("GigaChat".to_string()),
            usage: Some(WireUsage {
                prompt_tokens: Some(4),
                completion_tokens: Some(2),
                total_tokens: Some(6),
            }),
            created: None,
        };

        let result = convert_chat_response(response).unwrap();
        assert_eq!(result.text, "Hi there");
        assert_eq!(result.finish_reason, Some(FinishReason::Stop));
        assert_eq!(result.usage.unwrap().total_tokens, 6);
    }

    #[test]
    fn empty_choices_is_an_error() {
        let response = ChatCompletion {
            choices: vec![],
            model: None,
            usage: None,
            created: None,
        };
        assert!(matches!(
            convert_chat_response(response),
            Err(LlmError::ParseError(_))
        ));
    }
}
