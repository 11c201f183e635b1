//! Collaborator seams.
//!
//! The decision pipeline and the position monitor only talk to the outside
//! world through these traits. Each call is a single bounded request with no
//! internal retry.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::warn;

use crate::error::Result;
use crate::types::{
    BrokerPosition, Candidate, ExitRecord, LogLevel, OrderSide, PriceBar, TradeRecord,
};

#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Fetches one symbol's candidate snapshot. `Ok(None)` when the symbol
    /// has no price history.
    async fn fetch(&self, symbol: &str) -> Result<Option<Candidate>>;

    /// Fetches every symbol, dropping the ones that fail.
    async fn fetch_all(&self, symbols: &[String]) -> Vec<Candidate> {
        let mut candidates = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            match self.fetch(symbol).await {
                Ok(Some(candidate)) => candidates.push(candidate),
                Ok(None) => warn!(symbol = %symbol, "No price history, skipping"),
                Err(e) => warn!(symbol = %symbol, error = %e, "Market data fetch failed, skipping"),
            }
        }
        candidates
    }

    /// Daily closes between two dates, inclusive.
    async fn daily_closes(&self, symbol: &str, from: NaiveDate, to: NaiveDate) -> Result<Vec<PriceBar>>;
}

#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Sends one prompt. `Ok(None)` when the model answered with nothing.
    async fn complete(&self, prompt: &str) -> Result<Option<String>>;
}

#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait SentimentSource: Send + Sync {
    /// Recent article texts (headline and summary) mentioning the symbol.
    async fn fetch_articles(&self, symbol: &str) -> Result<Vec<String>>;
}

#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait Brokerage: Send + Sync {
    /// Places a limit order and returns the brokerage's order id.
    async fn place_order(
        &self,
        symbol: &str,
        quantity: u32,
        price: Decimal,
        side: OrderSide,
    ) -> Result<String>;

    /// Positions as the brokerage currently reports them.
    async fn open_positions(&self) -> Result<Vec<BrokerPosition>>;

    /// Moves the trigger price of a resting order.
    async fn modify_order(&self, order_id: &str, trigger_price: Decimal) -> Result<()>;

    /// Last traded price. `Ok(None)` when the brokerage has no quote.
    async fn last_price(&self, symbol: &str) -> Result<Option<Decimal>>;
}

#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait TradeStore: Send + Sync {
    /// Appends a trade and returns its row id.
    ///
    /// Any trailing stop left over from an earlier position in the same
    /// symbol is dropped.
    async fn insert_trade(&self, trade: &TradeRecord) -> Result<i64>;

    /// All trades, oldest first.
    async fn all_trades(&self) -> Result<Vec<TradeRecord>>;

    /// Most recent trade for a symbol.
    async fn latest_trade(&self, symbol: &str) -> Result<Option<TradeRecord>>;

    /// Appends an exit and returns its row id.
    async fn insert_exit(&self, exit: &ExitRecord) -> Result<i64>;

    /// Appends a line to the log table.
    async fn log(&self, level: LogLevel, message: &str) -> Result<()>;

    /// Highest stop recorded for the position opened by `entry_order_id`.
    async fn trailing_stop(&self, entry_order_id: &str) -> Result<Option<Decimal>>;

    async fn save_trailing_stop(&self, entry_order_id: &str, symbol: &str, stop: Decimal) -> Result<()>;

    async fn clear_trailing_stop(&self, entry_order_id: &str) -> Result<()>;
}

/// A model produced by [`Classifier::fit`].
pub trait TrainedModel: Send + Sync + std::fmt::Debug {
    /// Predicts the positive class for one feature row.
    fn predict(&self, features: &[f64]) -> bool;
}

/// Binary classifier used by the success predictor.
pub trait Classifier: Send + Sync {
    /// Fits a model on feature rows and labels of equal length.
    ///
    /// # Errors
    /// Returns an error if the inputs are empty or ragged.
    fn fit(&self, features: &[Vec<f64>], labels: &[bool]) -> anyhow::Result<Box<dyn TrainedModel>>;
}
