//! GigaChat wire types.
//!
//! Serde representations of the chat-completions and embeddings payloads.
//! Unknown fields are tolerated on deserialization so vendor additions do
//! not break parsing.

use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

use crate::types::Usage;

/// Known vendor roles. Anything else is passed through with a warning.
pub const KNOWN_ROLES: &[&str] = &[
    "system",
    "user",
    "assistant",
    "function",
    "function_in_progress",
    "search_result",
];

/// A complete function call as it appears in non-streaming responses and
/// outgoing messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: serde_json::Value,
}

/// A function definition offered to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub parameters: serde_json::Value,
}

/// Function-calling policy: `"auto"`, `"none"`, or a forced named call.
#[derive(Debug, Clone, PartialEq)]
pub enum FunctionCallPolicy {
    Auto,
    None,
    Named { name: String },
}

impl Serialize for FunctionCallPolicy {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Auto => serializer.serialize_str("auto"),
            Self::None => serializer.serialize_str("none"),
            Self::Named { name } => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("name", name)?;
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for FunctionCallPolicy {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PolicyVisitor;

        impl<'de> Visitor<'de> for PolicyVisitor {
            type Value = FunctionCallPolicy;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("\"auto\", \"none\", or an object with a \"name\" field")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
                match value {
                    "auto" => Ok(FunctionCallPolicy::Auto),
                    "none" => Ok(FunctionCallPolicy::None),
                    other => Err(E::unknown_variant(other, &["auto", "none"])),
                }
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut name = None;
                while let Some(key) = map.next_key::<String>()? {
                    if key == "name" {
                        name = Some(map.next_value::<String>()?);
                    } else {
                        map.next_value::<serde::de::IgnoredAny>()?;
                    }
                }
                name.map(|name| FunctionCallPolicy::Named { name })
                    .ok_or_else(|| de::Error::missing_field("name"))
            }
        }

        deserializer.deserialize_any(PolicyVisitor)
    }
}

/// A message in GigaChat wire format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GigaChatMessage {
    pub role: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub functions_state_id: Option<String>,
}

/// Chat completions request body.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequestBody {
    pub model: String,
    pub messages: Vec<GigaChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub functions: Option<Vec<FunctionSpec>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCallPolicy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repetition_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_interval: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_sequences: Option<Vec<String>>,
    pub stream: bool,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Usage block with every field optional; absent counters lower to zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireUsage {
    #[serde(default)]
    pub prompt_tokens: Option<u32>,
    #[serde(default)]
    pub completion_tokens: Option<u32>,
    #[serde(default)]
    pub total_tokens: Option<u32>,
}

impl WireUsage {
    pub fn lower(&self) -> Usage {
        Usage {
            prompt_tokens: self.prompt_tokens.unwrap_or(0),
            completion_tokens: self.completion_tokens.unwrap_or(0),
            total_tokens: self.total_tokens.unwrap_or(0),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub message: GigaChatMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
    #[serde(default)]
    pub index: Option<u32>,
}

/// Non-streaming chat completions response.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletion {
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub usage: Option<WireUsage>,
    #[serde(default)]
    pub created: Option<i64>,
}

/// Partial function call carried by a streaming delta. Arguments arrive as a
/// JSON fragment that only forms a complete value once all deltas are
/// concatenated.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FunctionCallDelta {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub arguments: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreamDelta {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub function_call: Option<FunctionCallDelta>,
    #[serde(default)]
    pub functions_state_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StreamChoice {
    pub delta: StreamDelta,
    #[serde(default)]
    pub finish_reason: Option<String>,
    #[serde(default)]
    pub index: Option<u32>,
}

/// One SSE event payload of a streaming chat completion.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionChunk {
    pub choices: Vec<StreamChoice>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub usage: Option<WireUsage>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmbeddingRequestBody {
    pub model: String,
    pub input: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingData {
    pub embedding: Vec<f32>,
    #[serde(default)]
    pub index: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingResponse {
    pub data: Vec<EmbeddingData>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub usage: Option<WireUsage>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn function_call_policy_serialization() {
        assert_eq!(
            serde_json::to_value(FunctionCallPolicy::Auto).unwrap(),
            serde_json::json!("auto")
        );
        assert_eq!(
            serde_json::to_value(FunctionCallPolicy::None).unwrap(),
            serde_json::json!("none")
        );
        assert_eq!(
            serde_json::to_value(FunctionCallPolicy::Named {
                name: "extract".to_string()
            })
            .unwrap(),
            serde_json::json!({"name": "extract"})
        );
    }

    #[test]
    fn function_call_policy_deserialization() {
        let auto: FunctionCallPolicy = serde_json::from_str("\"auto\"").unwrap();
        assert_eq!(auto, FunctionCallPolicy::Auto);

        let named: FunctionCallPolicy = serde_json::from_str("{\"name\": \"lookup\"}").unwrap();
        assert_eq!(
            named,
            FunctionCallPolicy::Named {
                name: "lookup".to_string()
            }
        );

        assert!(serde_json::from_str::<FunctionCallPolicy>("\"required\"").is_err());
    }

    #[test]
    fn wire_usage_lowers_missing_counters_to_zero() {
        let usage = WireUsage {
            prompt_tokens: Some(7),
            completion_tokens: None,
            total_tokens: None,
        };
        let lowered = usage.lower();
        assert_eq!(lowered.prompt_tokens, 7);
        assert_eq!(lowered.completion_tokens, 0);
        assert_eq!(lowered.total_tokens, 0);
    }

    #[test]
    fn request_body_flattens_extra_params() {
        let mut extra = serde_json::Map::new();
        extra.insert("profanity_check".to_string(), serde_json::json!(false));

        let body = ChatRequestBody {
            model: "GigaChat".to_string(),
            messages: vec![],
            functions: None,
            function_call: None,
            temperature: Some(0.5),
            top_p: None,
            max_tokens: None,
            repetition_penalty: None,
            update_interval: None,
            stop_sequences: None,
            stream: false,
            extra,
        };

        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["profanity_check"], serde_json::json!(false));
        assert_eq!(value["temperature"], serde_json::json!(0.5));
        assert!(value.get("top_p").is_none());
    }

    #[test]
    fn chunk_parses_with_unknown_fields() {
        let data = r#"{
            "choices": [{"delta": {"content": "Hi", "role": "assistant"}, "index": 0}],
            "model": "GigaChat",
            "object": "chat.completion.chunk"
        }"#;
        let chunk: ChatCompletionChunk = serde_json::from_str(data).unwrap();
        assert_eq!(chunk.choices[0].delta.content.as_deref(), Some("Hi"));
    }
}
