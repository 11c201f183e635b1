//! OpenAI-compatible chat-completions client.
//!
//! Sends a fixed system message plus one user prompt and returns the first
//! choice's content.

use std::time::Duration;

use async_trait::async_trait;
use llm_trade_core::{LanguageModel, LlmConfig};
use serde::Deserialize;
use tracing::debug;

use crate::error::LlmError;

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    total_tokens: Option<u64>,
}

/// Chat-completions client.
pub struct ChatClient {
    config: LlmConfig,
    http: reqwest::Client,
}

impl std::fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("api_url", &self.config.api_url)
            .field("model", &self.config.model)
            .finish_non_exhaustive()
    }
}

impl ChatClient {
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { config, http })
    }

    /// Sets a custom base URL (useful for testing).
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_url = url.into();
        self
    }

    /// Sends one prompt and returns the trimmed answer, `None` if empty.
    ///
    /// # Errors
    /// Returns error on transport failure, non-success status or a malformed body.
    pub async fn chat(&self, prompt: &str) -> Result<Option<String>, LlmError> {
        let request_body = serde_json::json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": self.config.system_prompt },
                { "role": "user", "content": prompt }
            ],
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
            "n": 1
        });

        let response = self
            .http
            .post(format!("{}/chat/completions", self.config.api_url))
            .bearer_auth(&self.config.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 429 {
            let retry_after_secs = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);
            return Err(LlmError::RateLimit { retry_after_secs });
        }
        if status.as_u16() == 401 {
            return Err(LlmError::Authentication);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(LlmError::api(status.as_u16(), text));
        }

        let body: CompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        if let Some(tokens) = body.usage.and_then(|u| u.total_tokens) {
            debug!(model = %self.config.model, tokens, "Completion received");
        }

        let answer = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty());

        Ok(answer)
    }
}

#[async_trait]
impl LanguageModel for ChatClient {
    async fn complete(&self, prompt: &str) -> llm_trade_core::Result<Option<String>> {
        Ok(self.chat(prompt).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use llm_trade_core::TradeError;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> ChatClient {
        ChatClient::new(LlmConfig {
            api_key: "sk-test".to_string(),
            ..LlmConfig::default()
        })
        .unwrap()
        .with_base_url(server.uri())
    }

    #[tokio::test]
    async fn test_completion_request_shape() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-4",
                "max_tokens": 150,
                "temperature": 0.5,
                "messages": [
                    { "role": "system", "content": "You are a trading assistant." },
                    { "role": "user", "content": "Suggest one stock." }
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [
                    { "index": 0, "message": { "role": "assistant", "content": "  Buy TCS.NS at 3500, target 3587, SL 3450 \n" } }
                ],
                "usage": { "total_tokens": 42 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let answer = client(&server).complete("Suggest one stock.").await.unwrap();
        assert_eq!(answer.as_deref(), Some("Buy TCS.NS at 3500, target 3587, SL 3450"));
    }

    #[tokio::test]
    async fn test_empty_content_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [ { "message": { "role": "assistant", "content": "   " } } ]
            })))
            .mount(&server)
            .await;

        assert!(client(&server).complete("hi").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rate_limit_reports_retry_after() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "12"))
            .mount(&server)
            .await;

        let err = client(&server).chat("hi").await.unwrap_err();
        assert!(matches!(err, LlmError::RateLimit { retry_after_secs: 12 }));
    }

    #[tokio::test]
    async fn test_auth_failure_maps_to_transient_fetch() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = client(&server).complete("hi").await.unwrap_err();
        assert!(matches!(err, TradeError::TransientFetch(ref m) if m.contains("authentication")));
    }
}
