//! Streaming chunk conversion and accumulation.
//!
//! Vendor deltas become [`MessageChunk`]s; a fold over the chunk stream
//! reconstructs the final message. Argument fragments of a streamed function
//! call are re-serialized per delta and concatenated by the accumulator.

use crate::error::LlmError;
use crate::gigachat::api::DeltaStream;
use crate::gigachat::convert::extract_text;
use crate::gigachat::wire::ChatCompletionChunk;
use crate::traits::ChunkStream;
use crate::types::{
    ChatResult, FinishReason, MessageChunk, MessageMetadata, MessageRole, ToolCallChunk,
};

/// Convert one vendor chunk. The first chunk usually carries the role; later
/// chunks inherit `default_role`.
pub(crate) fn convert_chunk(
    chunk: &ChatCompletionChunk,
    default_role: Option<&MessageRole>,
) -> Option<MessageChunk> {
    let choice = match chunk.choices.first() {
        Some(choice) => choice,
        None => {
            tracing::warn!("stream chunk contained no choices");
            return None;
        }
    };
    let delta = &choice.delta;

    let role = delta
        .role
        .clone()
        .map(MessageRole::from)
        .or_else(|| default_role.cloned());

    let mut tool_call_chunks = Vec::new();
    let mut metadata = MessageMetadata {
        functions_state_id: delta.functions_state_id.clone(),
        ..Default::default()
    };
    if let Some(call) = &delta.function_call {
        // Only assistant chunks accumulate tool calls; other roles keep the
        // fragment as metadata.
        if matches!(role, None | Some(MessageRole::Assistant)) {
            let arguments = call
                .arguments
                .as_ref()
                .map(|v| v.to_string())
                .unwrap_or_default();
            tool_call_chunks.push(ToolCallChunk {
                index: 0,
                name: call.name.clone(),
                arguments,
            });
        } else {
            metadata.function_call = Some(serde_json::json!({
                "name": call.name.clone(),
                "arguments": call.arguments.clone(),
            }));
        }
    }

    Some(MessageChunk {
        role,
        content: delta.content.clone().unwrap_or_default(),
        tool_call_chunks,
        usage: chunk.usage.map(|u| u.lower()),
        finish_reason: choice
            .finish_reason
            .as_deref()
            .map(FinishReason::from_vendor),
        metadata,
    })
}

/// Adapt a vendor delta stream into a chunk stream, tracking the role pinned
/// by the first delta.
pub fn into_chunk_stream(deltas: DeltaStream) -> ChunkStream {
    let stream = async_stream::stream! {
        use futures::StreamExt;
        let mut deltas = deltas;
        let mut stream_role: Option<MessageRole> = None;
        while let Some(item) = deltas.next().await {
            match item {
                Ok(chunk) => {
                    if let Some(message_chunk) = convert_chunk(&chunk, stream_role.as_ref()) {
                        if stream_role.is_none() {
                            stream_role = message_chunk.role.clone();
                        }
                        yield Ok(message_chunk);
                    }
                }
                Err(error) => {
                    yield Err(error);
                    return;
                }
            }
        }
    };
    Box::pin(stream)
}

/// Fold an entire chunk stream into a final result.
///
/// A stream that produced no chunks is a hard error, not an empty result.
pub async fn collect_stream(stream: ChunkStream) -> Result<ChatResult, LlmError> {
    use futures::StreamExt;

    let mut stream = stream;
    let mut accumulated: Option<MessageChunk> = None;
    while let Some(item) = stream.next().await {
        let chunk = item?;
        accumulated = Some(match accumulated {
            Some(acc) => acc.merge(chunk),
            None => chunk,
        });
    }

    let merged = accumulated
        .ok_or_else(|| LlmError::StreamError("no chunks returned from the API".to_string()))?;

    let usage = merged.usage;
    let finish_reason = merged.finish_reason.clone();
    let message = merged.into_message();
    let text = extract_text(&message.content);

    Ok(ChatResult {
        message,
        text,
        model: None,
        usage,
        finish_reason,
    })
}
