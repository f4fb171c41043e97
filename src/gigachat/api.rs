//! Transport seam for the GigaChat HTTP API.
//!
//! `GigaChatApi` is the injected capability the model and embeddings types
//! talk to; `HttpGigaChatApi` is the reqwest-backed implementation. Tests
//! substitute mock implementations.

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::Stream;
use secrecy::ExposeSecret;
use std::pin::Pin;

use crate::error::LlmError;
use crate::gigachat::config::GigaChatConfig;
use crate::gigachat::wire::{
    ChatCompletion, ChatCompletionChunk, ChatRequestBody, EmbeddingRequestBody, EmbeddingResponse,
};

/// Stream of parsed streaming chunks.
pub type DeltaStream = Pin<Box<dyn Stream<Item = Result<ChatCompletionChunk, LlmError>> + Send>>;

/// Low-level GigaChat API operations.
#[async_trait]
pub trait GigaChatApi: Send + Sync {
    async fn chat(&self, body: ChatRequestBody) -> Result<ChatCompletion, LlmError>;

    async fn chat_stream(&self, body: ChatRequestBody) -> Result<DeltaStream, LlmError>;

    async fn embeddings(&self, body: EmbeddingRequestBody) -> Result<EmbeddingResponse, LlmError>;
}

/// reqwest-backed implementation.
pub struct HttpGigaChatApi {
    client: reqwest::Client,
    config: GigaChatConfig,
}

impl HttpGigaChatApi {
    pub fn new(config: GigaChatConfig) -> Result<Self, LlmError> {
        config.validate()?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        if !config.verify_ssl_certs {
            builder = builder.danger_accept_invalid_certs(true);
        }
        let client = builder
            .build()
            .map_err(|e| LlmError::ConfigurationError(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    fn bearer_token(&self) -> Result<&str, LlmError> {
        self.config
            .access_token
            .as_ref()
            .map(|token| token.expose_secret())
            .ok_or_else(|| {
                LlmError::ConfigurationError(
                    "no access token available: token exchange must be performed externally"
                        .to_string(),
                )
            })
    }

    async fn post(
        &self,
        path: &str,
        body: &impl serde::Serialize,
    ) -> Result<reqwest::Response, LlmError> {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), path);
        let token = self.bearer_token()?;

        tracing::debug!(%url, "sending GigaChat request");
        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            let details = serde_json::from_str(&message).ok();
            return Err(LlmError::ApiError {
                code: status.as_u16(),
                message,
                details,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl GigaChatApi for HttpGigaChatApi {
    async fn chat(&self, body: ChatRequestBody) -> Result<ChatCompletion, LlmError> {
        let response = self.post("/chat/completions", &body).await?;
        let completion = response
            .json::<ChatCompletion>()
            .await
            .map_err(|e| LlmError::ParseError(format!("invalid chat completion payload: {e}")))?;
        Ok(completion)
    }

    async fn chat_stream(&self, body: ChatRequestBody) -> Result<DeltaStream, LlmError> {
        let response = self.post("/chat/completions", &body).await?;
        let mut events = response.bytes_stream().eventsource();

        let stream = async_stream::stream! {
            use futures::StreamExt;
            while let Some(event) = events.next().await {
                match event {
                    Ok(event) => {
                        if event.data.trim() == "[DONE]" {
                            tracing::debug!("stream finished with [DONE]");
                            break;
                        }
                        match serde_json::from_str::<ChatCompletionChunk>(&event.data) {
                            Ok(chunk) => yield Ok(chunk),
                            Err(e) => {
                                yield Err(LlmError::ParseError(format!(
                                    "invalid stream chunk: {e}"
                                )));
                            }
                        }
                    }
                    Err(e) => {
                        yield Err(LlmError::StreamError(format!("SSE error: {e}")));
                        break;
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }

    async fn embeddings(&self, body: EmbeddingRequestBody) -> Result<EmbeddingResponse, LlmError> {
        let response = self.post("/embeddings", &body).await?;
        let parsed = response
            .json::<EmbeddingResponse>()
            .await
            .map_err(|e| LlmError::ParseError(format!("invalid embeddings payload: {e}")))?;
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_fails_without_credentials() {
        let result = HttpGigaChatApi::new(GigaChatConfig::default());
        assert!(matches!(result, Err(LlmError::ConfigurationError(_))));
    }

    #[test]
    fn bearer_token_requires_access_token() {
        let api =
            HttpGigaChatApi::new(GigaChatConfig::new().with_credentials("client-secret")).unwrap();
        assert!(matches!(
            api.bearer_token(),
            Err(LlmError::ConfigurationError(_))
        ));

        let api = HttpGigaChatApi::new(GigaChatConfig::new().with_access_token("tok")).unwrap();
        assert_eq!(api.bearer_token().unwrap(), "tok");
    }
}
