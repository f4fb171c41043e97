//! GigaChat adapter: chat completions, streaming, structured output and
//! embeddings over a provider-agnostic message model.
//!
//! The crate translates between generic chat types ([`types::ChatMessage`],
//! [`types::MessageChunk`], [`types::ChatResult`]) and the GigaChat wire
//! format. The HTTP transport sits behind the [`gigachat::api::GigaChatApi`]
//! trait so it can be replaced in tests.
//!
//! ```rust,ignore
//! use gigachat_adapter::{ChatMessage, ChatModel, GigaChatConfig, GigaChatModel};
//!
//! let model = GigaChatModel::from_config(
//!     GigaChatConfig::new().with_access_token(std::env::var("GIGACHAT_ACCESS_TOKEN")?),
//! )?
//! .with_temperature(0.3);
//!
//! let result = model.generate(&[ChatMessage::user("Привет!")], None).await?;
//! println!("{}", result.text);
//! ```

pub mod error;
pub mod gigachat;
pub mod retry;
pub mod traits;
pub mod types;
pub mod utils;

pub use error::LlmError;
pub use gigachat::chat::GigaChatModel;
pub use gigachat::config::GigaChatConfig;
pub use gigachat::embeddings::GigaChatEmbeddings;
pub use gigachat::structured::{
    StructuredModel, StructuredOutputMethod, StructuredOutputOptions, StructuredResult,
};
pub use gigachat::tools::ToolInput;
pub use gigachat::wire::{FunctionCallPolicy, FunctionSpec};
pub use retry::{RetryExecutor, RetryPolicy};
pub use traits::{ChatModel, ChunkStream, EmbeddingCapability};
pub use types::{
    CallOptions, ChatMessage, ChatResult, ContentPart, FinishReason, MessageChunk, MessageContent,
    MessageMetadata, MessageRole, ToolCall, ToolCallChunk, Usage,
};
pub use utils::cancel::{CancelHandle, make_cancellable_stream, new_cancel_handle};
