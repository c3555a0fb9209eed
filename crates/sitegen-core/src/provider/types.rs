//! Provider identifiers, call parameters, and errors.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

/// Supported AI providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProviderId {
    OpenAi,
    Gemini,
    DeepSeek,
}

impl ProviderId {
    pub const ALL: [ProviderId; 3] = [Self::OpenAi, Self::Gemini, Self::DeepSeek];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Gemini => "gemini",
            Self::DeepSeek => "deepseek",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "gemini" => Ok(Self::Gemini),
            "deepseek" => Ok(Self::DeepSeek),
            _ => Err(ProviderError::UnknownProvider(s.to_string())),
        }
    }
}

/// Sampling and transport parameters shared by every provider call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProviderParams {
    pub timeout: Duration,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl ProviderParams {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
    pub const DEFAULT_TEMPERATURE: f32 = 0.7;
    pub const DEFAULT_MAX_TOKENS: u32 = 2000;

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for ProviderParams {
    fn default() -> Self {
        Self {
            timeout: Self::DEFAULT_TIMEOUT,
            temperature: Self::DEFAULT_TEMPERATURE,
            max_tokens: Self::DEFAULT_MAX_TOKENS,
        }
    }
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("unknown AI provider {0:?} (expected openai, gemini or deepseek)")]
    UnknownProvider(String),

    #[error("invalid {provider} API key: {reason}")]
    InvalidApiKey {
        provider: ProviderId,
        reason: &'static str,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

pub const MIN_API_KEY_LEN: usize = 20;
pub const MAX_API_KEY_LEN: usize = 200;

/// Format check for an API key. Never contacts the provider.
///
/// Keys must be 20..=200 characters with no whitespace. OpenAI and
/// DeepSeek keys must start with `sk-`.
pub fn validate_api_key(provider: ProviderId, key: &str) -> Result<(), ProviderError> {
    let invalid = |reason| Err(ProviderError::InvalidApiKey { provider, reason });

    if key.is_empty() {
        return invalid("key is empty");
    }
    if key.chars().any(char::is_whitespace) {
        return invalid("key contains whitespace");
    }
    let len = key.chars().count();
    if !(MIN_API_KEY_LEN..=MAX_API_KEY_LEN).contains(&len) {
        return invalid("key length must be between 20 and 200 characters");
    }
    if matches!(provider, ProviderId::OpenAi | ProviderId::DeepSeek) && !key.starts_with("sk-") {
        return invalid("key must start with \"sk-\"");
    }
    Ok(())
}
