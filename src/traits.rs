//! Capability traits.

use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

use crate::error::LlmError;
use crate::types::{CallOptions, ChatMessage, ChatResult, MessageChunk};

/// Stream of message chunks produced by a streaming chat call.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<MessageChunk, LlmError>> + Send>>;

/// Chat completion capability.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Run a chat completion and return the final result.
    async fn generate(
        &self,
        messages: &[ChatMessage],
        options: Option<&CallOptions>,
    ) -> Result<ChatResult, LlmError>;

    /// Run a chat completion and stream the result chunk by chunk.
    ///
    /// The caller cancels by dropping the stream; see
    /// [`crate::utils::cancel::make_cancellable_stream`] for an explicit
    /// cancellation handle.
    async fn stream(
        &self,
        messages: &[ChatMessage],
        options: Option<&CallOptions>,
    ) -> Result<ChunkStream, LlmError>;
}

/// Text embedding capability.
#[async_trait]
pub trait EmbeddingCapability: Send + Sync {
    /// Embed a batch of documents. The output order matches the input order.
    async fn embed_documents(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, LlmError>;

    /// Embed a single query string.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, LlmError>;
}
