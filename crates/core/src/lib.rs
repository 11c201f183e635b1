//! Core types, collaborator traits, configuration and errors shared by every
//! crate in the LLM-assisted trading pipeline.

pub mod config;
pub mod config_loader;
pub mod error;
pub mod events;
pub mod position_sizing;
pub mod traits;
pub mod types;

pub use config::{
    AppConfig, BrokerConfig, BrokerMode, DatabaseConfig, LlmConfig, LoggingConfig, MarketDataConfig,
    NewsConfig, PredictorConfig, SchedulerConfig, TradingConfig,
};
pub use config_loader::ConfigLoader;
pub use error::{Result, TradeError};
pub use events::{PositionExitedEvent, TradeExecutedEvent};
pub use position_sizing::{calculate_quantity, RiskSizer};
pub use traits::{
    Brokerage, Classifier, LanguageModel, MarketDataSource, SentimentSource, TradeStore, TrainedModel,
};
pub use types::{
    BrokerPosition, Candidate, ExitReason, ExitRecord, LogLevel, OpenPosition, OrderSide, PriceBar,
    Sentiment, TradeDecision, TradeProposal, TradeRecord,
};

#[cfg(any(test, feature = "mocks"))]
pub use traits::{
    MockBrokerage, MockLanguageModel, MockMarketDataSource, MockSentimentSource, MockTradeStore,
};
