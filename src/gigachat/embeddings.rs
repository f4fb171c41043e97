//! GigaChat embeddings.

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::LlmError;
use crate::gigachat::api::{GigaChatApi, HttpGigaChatApi};
use crate::gigachat::config::GigaChatConfig;
use crate::gigachat::wire::EmbeddingRequestBody;
use crate::retry::{RetryExecutor, RetryPolicy};
use crate::traits::EmbeddingCapability;

pub const DEFAULT_EMBEDDING_MODEL: &str = "Embeddings";
pub const DEFAULT_BATCH_SIZE: usize = 512;

/// Default query prefix, used when `use_prefix_query` is enabled.
pub const DEFAULT_QUERY_PREFIX: &str =
    "Дано предложение, необходимо найти его парафраз \nпредложение: ";

/// Embedding client over the GigaChat embeddings endpoint.
///
/// Documents are embedded in batches; each batch goes through the retry
/// executor independently.
pub struct GigaChatEmbeddings {
    api: Arc<dyn GigaChatApi>,
    model: String,
    batch_size: usize,
    strip_new_lines: bool,
    use_prefix_query: bool,
    prefix_query: String,
    retry_policy: RetryPolicy,
}

impl GigaChatEmbeddings {
    pub fn new(api: Arc<dyn GigaChatApi>) -> Self {
        Self {
            api,
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            strip_new_lines: true,
            use_prefix_query: false,
            prefix_query: DEFAULT_QUERY_PREFIX.to_string(),
            retry_policy: RetryPolicy::default(),
        }
    }

    pub fn from_config(config: GigaChatConfig) -> Result<Self, LlmError> {
        Ok(Self::new(Arc::new(HttpGigaChatApi::new(config)?)))
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_strip_new_lines(mut self, strip: bool) -> Self {
        self.strip_new_lines = strip;
        self
    }

    pub fn with_prefix_query(mut self, prefix: impl Into<String>) -> Self {
        self.prefix_query = prefix.into();
        self.use_prefix_query = true;
        self
    }

    pub fn with_use_prefix_query(mut self, use_prefix: bool) -> Self {
        self.use_prefix_query = use_prefix;
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    fn prepare(&self, text: &str) -> String {
        let mut prepared = if self.use_prefix_query {
            format!("{}{}", self.prefix_query, text)
        } else {
            text.to_string()
        };
        if self.strip_new_lines {
            prepared = prepared.replace('\n', " ");
        }
        prepared
    }

    async fn embed_batch(&self, batch: Vec<String>) -> Result<Vec<Vec<f32>>, LlmError> {
        let expected = batch.len();
        let executor = RetryExecutor::new(self.retry_policy.clone());
        let api = self.api.clone();
        let model = self.model.clone();

        let response = executor
            .execute(|| {
                let api = api.clone();
                let body = EmbeddingRequestBody {
                    model: model.clone(),
                    input: batch.clone(),
                };
                async move { api.embeddings(body).await }
            })
            .await?;

        if response.data.len() != expected {
            return Err(LlmError::ParseError(format!(
                "embedding response carried {} vectors for {} inputs",
                response.data.len(),
                expected
            )));
        }
        Ok(response.data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl EmbeddingCapability for GigaChatEmbeddings {
    async fn embed_documents(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, LlmError> {
        let prepared: Vec<String> = texts.iter().map(|t| self.prepare(t)).collect();

        let mut embeddings = Vec::with_capacity(prepared.len());
        for batch in prepared.chunks(self.batch_size) {
            let mut vectors = self.embed_batch(batch.to_vec()).await?;
            embeddings.append(&mut vectors);
        }
        Ok(embeddings)
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        let vectors = self.embed_batch(vec![self.prepare(text)]).await?;
        vectors
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::ParseError("empty embedding response".to_string()))
    }
}
