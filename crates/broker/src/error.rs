//! Error types for the brokerage adapters.

use llm_trade_core::TradeError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, KiteError>;

#[derive(Debug, Error)]
pub enum KiteError {
    /// Access token missing, expired or rejected.
    #[error("authentication error: {0}")]
    Authentication(String),

    /// Kite returned `"status": "error"` or a non-success HTTP status.
    #[error("API error: {status_code} {error_type} - {message}")]
    Api {
        status_code: u16,
        error_type: String,
        message: String,
    },

    #[error("rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimit { retry_after_secs: u64 },

    #[error("network error: {0}")]
    Network(String),

    #[error("unexpected response: {0}")]
    Parse(String),

    /// Paper book rejected the request.
    #[error("paper order rejected: {0}")]
    PaperRejected(String),
}

impl KiteError {
    pub fn api(status_code: u16, error_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            status_code,
            error_type: error_type.into(),
            message: message.into(),
        }
    }

    /// As an order placement or modification failure.
    pub fn into_submission(self) -> TradeError {
        TradeError::submission(format!("kite: {self}"))
    }

    /// As a failed read.
    pub fn into_fetch(self) -> TradeError {
        TradeError::fetch("kite", self)
    }
}

impl From<reqwest::Error> for KiteError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Parse(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}
