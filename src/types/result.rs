//! Chat result, token usage and finish reasons.

use serde::{Deserialize, Serialize};

use super::message::ChatMessage;

/// Token usage statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl Usage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }

    /// Field-wise sum. Associative, so partial usage reports can be folded
    /// in any grouping.
    pub fn merge(&self, other: &Usage) -> Usage {
        Usage {
            prompt_tokens: self.prompt_tokens + other.prompt_tokens,
            completion_tokens: self.completion_tokens + other.completion_tokens,
            total_tokens: self.total_tokens + other.total_tokens,
        }
    }
}

/// Why the model stopped generating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FinishReason {
    /// Natural end of generation
    Stop,
    /// Token limit reached
    Length,
    /// The model requested a function call
    ToolCalls,
    /// Content was filtered by the vendor
    ContentFilter,
    /// The vendor reported a generation error
    Error,
    /// Vendor-specific reason outside the known set
    Other(String),
    Unknown,
}

impl FinishReason {
    /// Map a GigaChat finish reason string.
    pub fn from_vendor(reason: &str) -> Self {
        match reason {
            "stop" => Self::Stop,
            "length" => Self::Length,
            "function_call" => Self::ToolCalls,
            "blacklist" => Self::ContentFilter,
            "error" => Self::Error,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Result of a single chat completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResult {
    pub message: ChatMessage,
    /// Plain-text rendering of the message content
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
}
