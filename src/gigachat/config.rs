//! Client configuration.

use secrecy::SecretString;
use std::time::Duration;

use crate::error::LlmError;

pub const DEFAULT_BASE_URL: &str = "https://gigachat.devices.sberbank.ru/api/v1";
pub const DEFAULT_AUTH_URL: &str = "https://ngw.devices.sberbank.ru:9443/api/v2/oauth";
pub const DEFAULT_SCOPE: &str = "GIGACHAT_API_PERS";

/// GigaChat client configuration.
///
/// Credentials are wrapped in [`SecretString`] so they never appear in debug
/// or log output. Token exchange against `auth_url` is left to an external
/// collaborator; a pre-obtained `access_token` is used as a bearer token.
#[derive(Debug, Clone)]
pub struct GigaChatConfig {
    pub base_url: String,
    pub auth_url: String,
    pub scope: String,
    /// OAuth client credentials, used by an external token provider
    pub credentials: Option<SecretString>,
    /// Pre-obtained bearer token
    pub access_token: Option<SecretString>,
    pub user: Option<String>,
    pub password: Option<SecretString>,
    pub timeout: Option<Duration>,
    pub verify_ssl_certs: bool,
}

impl Default for GigaChatConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            auth_url: DEFAULT_AUTH_URL.to_string(),
            scope: DEFAULT_SCOPE.to_string(),
            credentials: None,
            access_token: None,
            user: None,
            password: None,
            timeout: None,
            verify_ssl_certs: true,
        }
    }
}

impl GigaChatConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_auth_url(mut self, auth_url: impl Into<String>) -> Self {
        self.auth_url = auth_url.into();
        self
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    pub fn with_credentials(mut self, credentials: impl Into<String>) -> Self {
        self.credentials = Some(SecretString::from(credentials.into()));
        self
    }

    pub fn with_access_token(mut self, access_token: impl Into<String>) -> Self {
        self.access_token = Some(SecretString::from(access_token.into()));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_verify_ssl_certs(mut self, verify: bool) -> Self {
        self.verify_ssl_certs = verify;
        self
    }

    /// Validate that the configuration carries some way to authenticate.
    pub fn validate(&self) -> Result<(), LlmError> {
        if self.access_token.is_none()
            && self.credentials.is_none()
            && !(self.user.is_some() && self.password.is_some())
        {
            return Err(LlmError::ConfigurationError(
                "no credentials configured: set access_token, credentials, or user and password"
                    .to_string(),
            ));
        }
        Ok(())
    }
}
