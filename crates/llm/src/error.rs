//! Error types for the chat-completions client.

use llm_trade_core::TradeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    /// API key rejected.
    #[error("authentication failed")]
    Authentication,

    /// Rate limit exceeded.
    #[error("rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimit {
        /// Seconds to wait before retry.
        retry_after_secs: u64,
    },

    /// Non-success response.
    #[error("API error: {status_code} - {message}")]
    Api {
        status_code: u16,
        message: String,
    },

    /// Transport failure or timeout.
    #[error("network error: {0}")]
    Network(String),

    /// Response body did not have the expected shape.
    #[error("parse error: {0}")]
    Parse(String),
}

impl LlmError {
    pub fn api(status_code: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status_code,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

impl From<LlmError> for TradeError {
    fn from(err: LlmError) -> Self {
        TradeError::fetch("llm", err)
    }
}
