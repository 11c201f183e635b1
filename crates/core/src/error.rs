//! Error taxonomy for the trading pipeline.
//!
//! Every collaborator adapter maps its transport or storage failure into one
//! of these variants so the decision pipeline and position monitor can turn
//! them into terminal outcomes instead of crashing the host process.

use thiserror::Error;

/// Errors produced while deciding on, submitting or monitoring a trade.
#[derive(Debug, Error)]
pub enum TradeError {
    /// No usable market data for the configured universe.
    #[error("market data unavailable: {0}")]
    DataUnavailable(String),

    /// Model output did not contain a complete trade proposal.
    #[error("proposal unparseable: {0}")]
    ProposalUnparseable(String),

    /// Proposal rejected by the success predictor or sentiment gate.
    #[error("filtered out: {0}")]
    FilteredOut(String),

    /// Price ordering or risk budget produced no tradable quantity.
    #[error("invalid sizing: {0}")]
    InvalidSizing(String),

    /// Brokerage rejected or failed to accept an order.
    #[error("order submission failed: {0}")]
    SubmissionFailed(String),

    /// A single bounded request to an external service failed.
    #[error("fetch failed: {0}")]
    TransientFetch(String),

    /// Trade store read or write failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// Missing or malformed configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl TradeError {
    /// Creates a transient fetch error tagged with the service that failed.
    pub fn fetch(service: &str, message: impl std::fmt::Display) -> Self {
        Self::TransientFetch(format!("{service}: {message}"))
    }

    /// Creates a storage error.
    pub fn storage(message: impl std::fmt::Display) -> Self {
        Self::Storage(message.to_string())
    }

    /// Creates a submission error.
    pub fn submission(message: impl std::fmt::Display) -> Self {
        Self::SubmissionFailed(message.to_string())
    }

    /// Whether an operator should look at this failure.
    ///
    /// Filter rejections and empty proposals are routine; failed orders and
    /// failed upstream requests are not.
    #[must_use]
    pub fn is_actionable(&self) -> bool {
        matches!(self, Self::SubmissionFailed(_) | Self::TransientFetch(_))
    }
}

/// Result alias used by collaborator traits.
pub type Result<T> = std::result::Result<T, TradeError>;
