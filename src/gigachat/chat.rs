//! The GigaChat chat model.

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::LlmError;
use crate::gigachat::api::{GigaChatApi, HttpGigaChatApi};
use crate::gigachat::config::GigaChatConfig;
use crate::gigachat::convert;
use crate::gigachat::request::{self, ModelParams};
use crate::gigachat::streaming;
use crate::gigachat::tools::{self, ToolInput};
use crate::gigachat::wire::{ChatRequestBody, FunctionCallPolicy, FunctionSpec};
use crate::retry::{RetryExecutor, RetryPolicy};
use crate::traits::{ChatModel, ChunkStream};
use crate::types::{CallOptions, ChatMessage, ChatResult};
use crate::utils::cancel::CancelHandle;

/// Chat model backed by the GigaChat chat-completions API.
///
/// Construction is builder-style; `bind_tools` and `with_function_call`
/// return a new model with the binding applied, leaving the original
/// untouched.
#[derive(Clone)]
pub struct GigaChatModel {
    api: Arc<dyn GigaChatApi>,
    params: ModelParams,
    functions: Option<Vec<FunctionSpec>>,
    function_call: Option<FunctionCallPolicy>,
    retry_policy: RetryPolicy,
}

impl GigaChatModel {
    /// Create a model over an injected transport.
    pub fn new(api: Arc<dyn GigaChatApi>) -> Self {
        Self {
            api,
            params: ModelParams::default(),
            functions: None,
            function_call: None,
            retry_policy: RetryPolicy::default(),
        }
    }

    /// Create a model with the reqwest transport built from `config`.
    pub fn from_config(config: GigaChatConfig) -> Result<Self, LlmError> {
        Ok(Self::new(Arc::new(HttpGigaChatApi::new(config)?)))
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.params.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.params.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.params.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.params.top_p = Some(top_p);
        self
    }

    pub fn with_repetition_penalty(mut self, penalty: f32) -> Self {
        self.params.repetition_penalty = Some(penalty);
        self
    }

    pub fn with_update_interval(mut self, interval: f32) -> Self {
        self.params.update_interval = Some(interval);
        self
    }

    pub fn with_stop_sequences(mut self, stop: Vec<String>) -> Self {
        self.params.stop_sequences = Some(stop);
        self
    }

    /// When set, `generate` streams internally and folds the chunks.
    pub fn with_streaming(mut self, streaming: bool) -> Self {
        self.params.streaming = streaming;
        self
    }

    pub fn with_extra_param(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.params.extra_params.insert(key.into(), value);
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Bind function definitions to the model.
    pub fn bind_tools(&self, inputs: Vec<ToolInput>) -> Self {
        let mut bound = self.clone();
        bound.functions = tools::convert_tools(inputs);
        bound
    }

    /// Set the function-calling policy.
    pub fn with_function_call(&self, policy: FunctionCallPolicy) -> Self {
        let mut bound = self.clone();
        bound.function_call = Some(policy);
        bound
    }

    fn build_body(
        &self,
        messages: &[ChatMessage],
        options: Option<&CallOptions>,
        stream: bool,
    ) -> Result<ChatRequestBody, LlmError> {
        let vendor_messages = convert::convert_messages(messages)?;
        request::build_chat_request(
            &self.params,
            vendor_messages,
            self.functions.clone(),
            self.function_call.clone(),
            options,
            stream,
        )
    }

    async fn open_stream(&self, body: ChatRequestBody) -> Result<ChunkStream, LlmError> {
        let executor = RetryExecutor::new(self.retry_policy.clone());
        let api = self.api.clone();
        let deltas = executor
            .execute(|| {
                let api = api.clone();
                let body = body.clone();
                async move { api.chat_stream(body).await }
            })
            .await?;
        Ok(streaming::into_chunk_stream(deltas))
    }

    /// Like [`ChatModel::generate`], with cooperative cancellation for the
    /// non-streaming path.
    pub async fn generate_with_cancel(
        &self,
        messages: &[ChatMessage],
        options: Option<&CallOptions>,
        cancel: Option<&CancelHandle>,
    ) -> Result<ChatResult, LlmError> {
        if self.params.streaming {
            let body = self.build_body(messages, options, true)?;
            let chunks = self.open_stream(body).await?;
            return streaming::collect_stream(chunks).await;
        }

        let body = self.build_body(messages, options, false)?;
        let executor = RetryExecutor::new(self.retry_policy.clone());
        let api = self.api.clone();
        let response = executor
            .execute_cancellable(
                || {
                    let api = api.clone();
                    let body = body.clone();
                    async move { api.chat(body).await }
                },
                cancel,
            )
            .await?;
        convert::convert_chat_response(response)
    }
}

#[async_trait]
impl ChatModel for GigaChatModel {
    async fn generate(
        &self,
        messages: &[ChatMessage],
        options: Option<&CallOptions>,
    ) -> Result<ChatResult, LlmError> {
        self.generate_with_cancel(messages, options, None).await
    }

    async fn stream(
        &self,
        messages: &[ChatMessage],
        options: Option<&CallOptions>,
    ) -> Result<ChunkStream, LlmError> {
        let body = self.build_body(messages, options, true)?;
        self.open_stream(body).await
    }
}
