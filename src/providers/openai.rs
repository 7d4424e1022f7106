use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use log::error;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::errors::ProviderError;
use crate::retry::RetryPolicy;

use super::{BatchTranslation, TranslationBackend};

/// OpenAI-compatible client for chat-completions APIs
#[derive(Debug)]
pub struct OpenAi {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// API endpoint URL (optional, defaults to the public API)
    endpoint: String,
    /// Model name to request
    model: String,
    /// Retry schedule for transient failures
    retry: RetryPolicy,
}

/// Chat message format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender (system, user, assistant)
    pub role: String,

    /// Content of the message
    pub content: String,
}

/// Chat-completions request
#[derive(Debug, Serialize)]
pub struct ChatRequest {
    /// The model to use
    model: String,

    /// The messages for the conversation
    messages: Vec<ChatMessage>,

    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,

    /// Maximum number of tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

impl ChatRequest {
    /// Create a new chat request
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            temperature: Some(0.3),
            max_tokens: None,
        }
    }

    /// Add a message to the request
    pub fn add_message(mut self, role: impl Into<String>, content: impl Into<String>) -> Self {
        self.messages.push(ChatMessage {
            role: role.into(),
            content: content.into(),
        });
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the maximum number of tokens
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// One choice in a chat-completions response
#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    /// The generated message
    pub message: ChatMessage,
}

/// Token usage information
#[derive(Debug, Deserialize)]
pub struct TokenUsage {
    /// Number of prompt tokens
    pub prompt_tokens: u64,
    /// Number of completion tokens
    pub completion_tokens: u64,
    /// Total number of tokens
    pub total_tokens: u64,
}

/// Chat-completions response
#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    /// Generated choices
    pub choices: Vec<ChatChoice>,
    /// Token usage information
    #[serde(default)]
    pub usage: Option<TokenUsage>,
}

impl OpenAi {
    /// Create a new client
    pub fn new(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self::new_with_config(api_key, endpoint, model, RetryPolicy::default(), 120)
    }

    /// Create a new client with retry configuration
    pub fn new_with_config(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        model: impl Into<String>,
        retry: RetryPolicy,
        timeout_secs: u64,
    ) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .pool_idle_timeout(Duration::from_secs(90))
                .tcp_keepalive(Duration::from_secs(60))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            model: model.into(),
            retry,
        }
    }

    fn api_url(&self) -> String {
        if self.endpoint.is_empty() {
            "https://api.openai.com/v1/chat/completions".to_string()
        } else {
            format!(
                "{}/chat/completions",
                self.endpoint.trim_end_matches('/')
            )
        }
    }

    /// Complete a chat request with retry logic.
    ///
    /// Network errors and server errors are retried with exponential
    /// backoff; client errors fail immediately.
    pub async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, ProviderError> {
        let api_url = self.api_url();

        let mut attempt = 0u32;
        let mut last_error: Option<ProviderError> = None;

        while self.retry.allows_retry(attempt) {
            if attempt > 0 {
                tokio::time::sleep(self.retry.delay_for(attempt - 1)).await;
            }

            let response_result = self
                .client
                .post(&api_url)
                .header("Content-Type", "application/json")
                .bearer_auth(&self.api_key)
                .json(&request)
                .send()
                .await;

            match response_result {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response.json::<ChatResponse>().await.map_err(|e| {
                            ProviderError::ParseError(format!(
                                "failed to parse chat response: {}",
                                e
                            ))
                        });
                    }

                    let error_text = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Failed to get error response text".to_string());

                    match status.as_u16() {
                        401 | 403 => {
                            // Authentication problems never heal on retry
                            return Err(ProviderError::AuthenticationError(error_text));
                        }
                        429 => {
                            error!(
                                "Rate limited ({}): {} - attempt {}/{}",
                                status,
                                error_text,
                                attempt + 1,
                                self.retry.max_attempts
                            );
                            last_error = Some(ProviderError::RateLimitExceeded(error_text));
                        }
                        s if status.is_server_error() => {
                            error!(
                                "API error ({}): {} - attempt {}/{}",
                                s,
                                error_text,
                                attempt + 1,
                                self.retry.max_attempts
                            );
                            last_error = Some(ProviderError::ApiError {
                                status_code: s,
                                message: error_text,
                            });
                        }
                        s => {
                            // Other client errors - don't retry
                            error!("API error ({}): {}", s, error_text);
                            return Err(ProviderError::ApiError {
                                status_code: s,
                                message: error_text,
                            });
                        }
                    }
                }
                Err(e) => {
                    error!(
                        "Network error: {} - attempt {}/{}",
                        e,
                        attempt + 1,
                        self.retry.max_attempts
                    );
                    last_error = Some(ProviderError::ConnectionError(e.to_string()));
                }
            }

            attempt += 1;
        }

        Err(last_error.unwrap_or_else(|| {
            ProviderError::RequestFailed(format!(
                "chat request failed after {} attempts",
                self.retry.max_attempts
            ))
        }))
    }

    /// Extract the assistant text from a chat response
    pub fn extract_text(response: &ChatResponse) -> String {
        response
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .unwrap_or_default()
    }

    /// Strip Markdown code fences some models wrap JSON output in
    fn strip_code_fences(content: &str) -> &str {
        let trimmed = content.trim();
        let without_open = trimmed
            .strip_prefix("```json")
            .or_else(|| trimmed.strip_prefix("```"))
            .unwrap_or(trimmed);
        without_open
            .strip_suffix("```")
            .unwrap_or(without_open)
            .trim()
    }
}

#[async_trait]
impl TranslationBackend for OpenAi {
    async fn translate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<BatchTranslation, ProviderError> {
        let request = ChatRequest::new(&self.model)
            .add_message("system", system_prompt)
            .add_message("user", user_prompt);

        let response = self.complete(request).await?;
        let content = Self::extract_text(&response);
        if content.is_empty() {
            return Err(ProviderError::ParseError(
                "chat response contained no choices".to_string(),
            ));
        }

        let payload = Self::strip_code_fences(&content);
        let output: HashMap<String, String> = serde_json::from_str(payload).map_err(|e| {
            ProviderError::ParseError(format!(
                "translated batch is not a JSON string map: {}",
                e
            ))
        })?;

        Ok(BatchTranslation { output })
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        let request = ChatRequest::new(&self.model)
            .add_message("user", "Hello")
            .max_tokens(10);

        self.complete(request).await?;
        Ok(())
    }
}
