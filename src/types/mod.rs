//! Provider-agnostic chat types.

pub mod chunk;
pub mod message;
pub mod options;
pub mod result;

pub use chunk::{MessageChunk, ToolCallChunk};
pub use message::{ChatMessage, ContentPart, MessageContent, MessageMetadata, MessageRole, ToolCall};
pub use options::CallOptions;
pub use result::{ChatResult, FinishReason, Usage};
