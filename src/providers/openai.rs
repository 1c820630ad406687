// OpenAI-compatible chat completion provider
//
// Works with any endpoint that speaks the /v1/chat/completions format.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::types::{CompletionRequest, TokenLimit, TokenLimitField};
use super::CompletionProvider;
use crate::config::CompletionConfig;

/// Chat completion client
#[derive(Clone)]
pub struct OpenAIProvider {
    client: Client,
    api_key: String,
    base_url: String,
    default_model: String,
    temperature: f32,
    token_limit: Option<TokenLimit>,
}

impl OpenAIProvider {
    /// Create a provider against `base_url` (e.g. "https://api.openai.com")
    pub fn new(
        api_key: String,
        base_url: impl Into<String>,
        default_model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            default_model: default_model.into(),
            temperature: 0.7,
            token_limit: None,
        })
    }

    /// Create a provider from completion settings
    pub fn from_config(api_key: String, config: &CompletionConfig) -> Result<Self> {
        Ok(Self::new(
            api_key,
            config.base_url.clone(),
            config.model.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )?
        .with_temperature(config.temperature)
        .with_token_limit(config.token_limit()))
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_token_limit(mut self, token_limit: Option<TokenLimit>) -> Self {
        self.token_limit = token_limit;
        self
    }

    fn to_openai_request(&self, request: &CompletionRequest) -> OpenAIRequest {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &request.system {
            messages.push(OpenAIMessage {
                role: "system".to_string(),
                content: system.clone(),
            });
        }
        messages.push(OpenAIMessage {
            role: "user".to_string(),
            content: request.prompt.clone(),
        });

        let (max_tokens, max_completion_tokens) = match self.token_limit {
            Some(TokenLimit {
                value,
                field: TokenLimitField::MaxTokens,
            }) => (Some(value), None),
            Some(TokenLimit {
                value,
                field: TokenLimitField::MaxCompletionTokens,
            }) => (None, Some(value)),
            None => (None, None),
        };

        OpenAIRequest {
            model: self.default_model.clone(),
            messages,
            temperature: self.temperature,
            max_tokens,
            max_completion_tokens,
        }
    }
}

#[async_trait]
impl CompletionProvider for OpenAIProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let openai_request = self.to_openai_request(request);
        let url = format!("{}/v1/chat/completions", self.base_url);

        tracing::debug!(model = %openai_request.model, "Sending completion request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&openai_request)
            .send()
            .await
            .context("Failed to send request to completion API")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!(
                "Completion API request failed\n\nStatus: {}\nBody: {}",
                status,
                error_body
            );
        }

        let openai_response: OpenAIResponse = response
            .json()
            .await
            .context("Failed to parse completion API response")?;

        Ok(openai_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default())
    }

    fn name(&self) -> &str {
        "openai"
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }
}

// OpenAI API types

#[derive(Debug, Clone, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAIResponse {
    #[serde(default)]
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn provider(base_url: &str) -> OpenAIProvider {
        OpenAIProvider::new(
            "test-key".to_string(),
            base_url,
            "gpt-4o-mini",
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_request_without_limit_omits_both_fields() {
        let body = serde_json::to_value(
            provider("http://localhost").to_openai_request(&CompletionRequest::new("hi")),
        )
        .unwrap();
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"], json!([{"role": "user", "content": "hi"}]));
        assert!(body.get("max_tokens").is_none());
        assert!(body.get("max_completion_tokens").is_none());
    }

    #[test]
    fn test_request_uses_selected_limit_field() {
        let base = provider("http://localhost");

        let legacy = base.clone().with_token_limit(Some(TokenLimit {
            value: 256,
            field: TokenLimitField::MaxTokens,
        }));
        let body = serde_json::to_value(legacy.to_openai_request(&CompletionRequest::new("hi")))
            .unwrap();
        assert_eq!(body["max_tokens"], 256);
        assert!(body.get("max_completion_tokens").is_none());

        let modern = base.with_token_limit(Some(TokenLimit {
            value: 512,
            field: TokenLimitField::MaxCompletionTokens,
        }));
        let body = serde_json::to_value(modern.to_openai_request(&CompletionRequest::new("hi")))
            .unwrap();
        assert_eq!(body["max_completion_tokens"], 512);
        assert!(body.get("max_tokens").is_none());
    }

    #[test]
    fn test_request_temperature_and_system_message() {
        let request = CompletionRequest::new("hi").with_system("sys");
        let body = serde_json::to_value(
            provider("http://localhost")
                .with_temperature(0.1)
                .to_openai_request(&request),
        )
        .unwrap();
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "hi");
        assert!((body["temperature"].as_f64().unwrap() - 0.1).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_complete_returns_first_choice() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer test-key")
            .match_body(Matcher::PartialJson(json!({"model": "gpt-4o-mini"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "choices": [
                        {"message": {"role": "assistant", "content": "first"}},
                        {"message": {"role": "assistant", "content": "second"}}
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let text = provider(&server.url())
            .complete(&CompletionRequest::new("hello"))
            .await
            .unwrap();
        assert_eq!(text, "first");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_complete_missing_content_is_empty() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_body(json!({"choices": [{"message": {"role": "assistant", "content": null}}]}).to_string())
            .create_async()
            .await;

        let text = provider(&server.url())
            .complete(&CompletionRequest::new("hello"))
            .await
            .unwrap();
        assert_eq!(text, "");
    }

    #[tokio::test]
    async fn test_complete_surfaces_http_errors() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(429)
            .with_body("rate limited")
            .expect(1)
            .create_async()
            .await;

        let err = provider(&server.url())
            .complete(&CompletionRequest::new("hello"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("rate limited"));
        mock.assert_async().await;
    }
}
