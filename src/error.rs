//! Error types for the GigaChat adapter.

/// Unified error type for all adapter operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LlmError {
    /// HTTP-level error that is not a connection or timeout failure
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Failed to establish a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Request timed out
    #[error("Timeout error: {0}")]
    TimeoutError(String),

    /// Error response from the GigaChat API
    #[error("API error {code}: {message}")]
    ApiError {
        code: u16,
        message: String,
        details: Option<serde_json::Value>,
    },

    /// Failed to parse a response or payload
    #[error("Parse error: {0}")]
    ParseError(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    JsonError(String),

    /// Invalid client or model configuration
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Caller supplied input with an unsupported shape
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Operation not supported by this adapter
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// Streaming transport or protocol failure
    #[error("Stream error: {0}")]
    StreamError(String),

    /// The operation was cancelled by the caller
    #[error("Operation cancelled")]
    Cancelled,

    /// Internal invariant violation
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl LlmError {
    /// Create an API error without structured details.
    pub fn api_error(code: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Whether the retry executor should retry after this error.
    ///
    /// Input, configuration and parse failures are deterministic and never
    /// retried. Cancellation always aborts.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ConnectionError(_) | Self::TimeoutError(_) => true,
            Self::ApiError { code, .. } => *code == 429 || *code >= 500,
            _ => false,
        }
    }
}

impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonError(err.to_string())
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::TimeoutError(err.to_string())
        } else if err.is_connect() {
            Self::ConnectionError(err.to_string())
        } else {
            Self::HttpError(err.to_string())
        }
    }
}
