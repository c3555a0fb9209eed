//! OpenAI-compatible chat completions client (OpenAI and DeepSeek).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::http::{Auth, HttpClient};
use super::trait_def::ProviderClient;
use super::types::{ProviderError, ProviderId, ProviderParams};

pub const OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const OPENAI_MODEL: &str = "gpt-3.5-turbo";
pub const DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com";
pub const DEEPSEEK_MODEL: &str = "deepseek-chat";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl ChatResponse {
    fn into_text(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()?
            .message?
            .content
            .filter(|text| !text.trim().is_empty())
    }
}

/// Client for `POST {base}/v1/chat/completions` with bearer auth.
#[derive(Debug, Clone)]
pub struct ChatCompletionsClient {
    id: ProviderId,
    base_url: String,
    model: String,
    params: ProviderParams,
    http: HttpClient,
}

impl ChatCompletionsClient {
    pub fn openai(params: ProviderParams) -> Result<Self, ProviderError> {
        Self::new(ProviderId::OpenAi, OPENAI_BASE_URL, OPENAI_MODEL, params)
    }

    pub fn deepseek(params: ProviderParams) -> Result<Self, ProviderError> {
        Self::new(ProviderId::DeepSeek, DEEPSEEK_BASE_URL, DEEPSEEK_MODEL, params)
    }

    fn new(
        id: ProviderId,
        base_url: &str,
        model: &str,
        params: ProviderParams,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            id,
            base_url: base_url.to_string(),
            model: model.to_string(),
            params,
            http: HttpClient::new(&params)?,
        })
    }

    /// Point the client at another server (a proxy, or a mock in tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }
}

#[async_trait]
impl ProviderClient for ChatCompletionsClient {
    fn id(&self) -> ProviderId {
        self.id
    }

    async fn complete(&self, prompt: &str, api_key: &str) -> Option<String> {
        let body = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.params.temperature,
            max_tokens: self.params.max_tokens,
        };
        let endpoint = self.endpoint();
        let response: ChatResponse = self
            .http
            .post_json(self.id, &endpoint, Auth::Bearer(api_key), &body)
            .await?;

        let text = response.into_text();
        if text.is_none() {
            warn!(provider = %self.id, "response has no choices[0].message.content");
        }
        text
    }
}
