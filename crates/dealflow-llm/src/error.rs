//! Completion client error types.

use dealflow_core::capabilities::CompletionError;
use thiserror::Error;

/// Errors that can occur when calling the completion API.
#[derive(Debug, Error)]
pub enum LlmError {
    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API returned a non-success status code.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code returned by the API.
        status: u16,
        /// Error message or response body.
        message: String,
    },

    /// The API returned a 429 Too Many Requests response.
    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited {
        /// Seconds to wait before retrying.
        retry_after_secs: u64,
    },

    /// The response body did not carry a completion.
    #[error("parse error: {0}")]
    Parse(String),

    /// No API key was configured.
    #[error("completion client not configured: set llm.api_key or DEALFLOW_LLM__API_KEY")]
    NotConfigured,
}

impl LlmError {
    /// Transport failures, rate limits and server errors are worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => !e.is_decode() && !e.is_builder(),
            Self::RateLimited { .. } => true,
            Self::Api { status, .. } => *status >= 500,
            Self::Parse(_) | Self::NotConfigured => false,
        }
    }
}

impl From<LlmError> for CompletionError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Http(e) if e.is_decode() => Self::InvalidResponse(e.to_string()),
            LlmError::Http(e) => Self::Transport(e.to_string()),
            LlmError::Api { status, message } => Self::Api { status, message },
            LlmError::RateLimited { .. } => Self::RateLimited,
            LlmError::Parse(message) => Self::InvalidResponse(message),
            LlmError::NotConfigured => Self::Api {
                status: 401,
                message: LlmError::NotConfigured.to_string(),
            },
        }
    }
}
