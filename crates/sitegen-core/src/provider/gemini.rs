//! Google Gemini `generateContent` client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::http::{Auth, HttpClient};
use super::trait_def::ProviderClient;
use super::types::{ProviderError, ProviderId, ProviderParams};

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const GEMINI_MODEL: &str = "gemini-pro";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateResponse {
    fn into_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()?
            .text
            .filter(|text| !text.trim().is_empty())
    }
}

/// Client for `POST {base}/v1beta/models/{model}:generateContent?key=...`.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    base_url: String,
    model: String,
    params: ProviderParams,
    http: HttpClient,
}

impl GeminiClient {
    pub fn new(params: ProviderParams) -> Result<Self, ProviderError> {
        Ok(Self {
            base_url: GEMINI_BASE_URL.to_string(),
            model: GEMINI_MODEL.to_string(),
            params,
            http: HttpClient::new(&params)?,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

#[async_trait]
impl ProviderClient for GeminiClient {
    fn id(&self) -> ProviderId {
        ProviderId::Gemini
    }

    async fn complete(&self, prompt: &str, api_key: &str) -> Option<String> {
        let body = GenerateRequest {
            contents: [Content {
                parts: [Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: self.params.temperature,
                max_output_tokens: self.params.max_tokens,
            },
        };
        let endpoint = self.endpoint();
        let response: GenerateResponse = self
            .http
            .post_json(ProviderId::Gemini, &endpoint, Auth::QueryKey(api_key), &body)
            .await?;

        let text = response.into_text();
        if text.is_none() {
            warn!(provider = %ProviderId::Gemini, "response has no candidates[0].content.parts[0].text");
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const KEY: &str = "AIzaSyTestKey0123456789abcdefghijk";

    fn client(server: &MockServer) -> GeminiClient {
        GeminiClient::new(ProviderParams::default())
            .unwrap()
            .with_base_url(server.uri())
    }

    #[tokio::test]
    async fn sends_key_as_query_parameter() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-pro:generateContent"))
            .and(query_param("key", KEY))
            .and(body_partial_json(json!({
                "contents": [{"parts": [{"text": "plan my site"}]}],
                "generationConfig": {"maxOutputTokens": 2000}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"text": "{\"custom_post_types\":[]}"}]}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = client(&server).complete("plan my site", KEY).await;
        assert_eq!(text.as_deref(), Some("{\"custom_post_types\":[]}"));
    }

    #[tokio::test]
    async fn blocked_candidate_yields_none() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"finishReason": "SAFETY"}]
            })))
            .mount(&server)
            .await;
        assert!(client(&server).complete("p", KEY).await.is_none());
    }

    #[tokio::test]
    async fn server_error_yields_none() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        assert!(client(&server).complete("p", KEY).await.is_none());
    }
}
