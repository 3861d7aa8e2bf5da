//! # dealflow-llm
//!
//! HTTP completion client for the dealflow LLM filter gates and the
//! industry-tagging preprocessor.
//!
//! Talks to any OpenAI-compatible `/chat/completions` endpoint: one system
//! message plus the rendered prompt, temperature 0. Transport errors, 429s
//! and 5xx responses are retried with bounded exponential backoff (see
//! [`retry`]); everything else surfaces immediately as a
//! [`CompletionError`](dealflow_core::capabilities::CompletionError).

pub mod chat;
mod error;
mod http;
pub mod retry;

pub use error::LlmError;

use std::time::Duration;

use dealflow_config::LlmConfig;
use dealflow_core::capabilities::{CompletionClient, CompletionError};

use crate::chat::{ChatRequest, ChatResponse};
use crate::http::check_response;
use crate::retry::{RetryConfig, with_retry};

/// Completion client backed by `reqwest`.
pub struct CompletionHttpClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    retry: RetryConfig,
}

impl CompletionHttpClient {
    /// Build a client from the `llm` configuration section.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::NotConfigured`] without an API key, or
    /// [`LlmError::Http`] if the HTTP client cannot be built.
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        if !config.is_configured() {
            return Err(LlmError::NotConfigured);
        }
        let http = reqwest::Client::builder()
            .user_agent(concat!("dealflow/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            retry: RetryConfig::with_max_attempts(config.max_attempts),
        })
    }

    /// Override the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    async fn complete_once(&self, prompt: &str, model: &str) -> Result<String, LlmError> {
        let request = ChatRequest::single_turn(model, prompt);
        let resp = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;
        let data: ChatResponse = check_response(resp).await?.json().await?;
        data.into_text()
    }

    /// Complete with retries, returning the crate's own error type.
    ///
    /// # Errors
    ///
    /// Returns the last [`LlmError`] once retries are exhausted or a
    /// non-retryable error occurs.
    pub async fn complete_with_retry(&self, prompt: &str, model: &str) -> Result<String, LlmError> {
        tracing::debug!(model, prompt_len = prompt.len(), "completion request");
        let text = with_retry(&self.retry, move || self.complete_once(prompt, model)).await?;
        tracing::debug!(model, response = %text.trim(), "completion response");
        Ok(text)
    }
}

impl CompletionClient for CompletionHttpClient {
    async fn complete(&self, prompt: &str, model: &str) -> Result<String, CompletionError> {
        Ok(self.complete_with_retry(prompt, model).await?)
    }
}
