//! Signal inputs for the decision pipeline: daily market data with
//! technical indicators, and news sentiment.

pub mod indicators;
pub mod market_data;
pub mod news;
pub mod sentiment;

pub use indicators::{IndicatorSnapshot, NEUTRAL_RSI};
pub use market_data::YahooFinanceClient;
pub use news::NewsApiClient;
pub use sentiment::{sentiment_prompt, SentimentAggregator, SentimentAnalyzer};
