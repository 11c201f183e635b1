//! Builds collaborators from configuration.

use std::sync::Arc;

use anyhow::{Context, Result};
use llm_trade_broker::{KiteClient, PaperBroker};
use llm_trade_core::{AppConfig, BrokerMode, Brokerage, LanguageModel, MarketDataSource};
use llm_trade_data::TradeDatabase;
use llm_trade_llm::ChatClient;
use llm_trade_position_manager::MonitorConfig;
use llm_trade_scheduler::TradingJobs;
use llm_trade_signals::{NewsApiClient, SentimentAggregator, SentimentAnalyzer, YahooFinanceClient};
use llm_trade_strategy::{Collaborators, PipelineSettings};
use tracing::info;

/// Everything a command needs, wired once per process.
pub struct App {
    pub config: AppConfig,
    pub database: Arc<TradeDatabase>,
    pub market_data: Arc<dyn MarketDataSource>,
}

impl App {
    /// Opens the trade database and the market data client.
    ///
    /// # Errors
    /// Returns error if the database cannot be opened or the HTTP client
    /// cannot be built.
    pub async fn open(config: AppConfig) -> Result<Self> {
        let database = TradeDatabase::connect(&config.database.url, config.database.max_connections)
            .await
            .with_context(|| format!("Failed to open database {}", config.database.url))?;
        info!(url = %config.database.url, "Trade database ready");

        let market_data = YahooFinanceClient::new(config.market_data.clone())
            .context("Failed to build market data client")?;

        Ok(Self {
            config,
            database: Arc::new(database),
            market_data: Arc::new(market_data),
        })
    }

    /// Paper or Kite brokerage, per `broker.mode`.
    ///
    /// # Errors
    /// Returns error if Kite credentials are missing or open trades cannot
    /// be read to restore the paper book.
    pub async fn broker(&self) -> Result<Arc<dyn Brokerage>> {
        match self.config.broker.mode {
            BrokerMode::Paper => {
                let paper = PaperBroker::new(self.market_data.clone());
                let open = self
                    .database
                    .open_trades()
                    .await
                    .context("Failed to restore paper positions")?;
                paper.restore(&open).await;
                info!(open = open.len(), "Using paper brokerage");
                Ok(Arc::new(paper))
            }
            BrokerMode::Kite => {
                let kite = KiteClient::new(&self.config.broker).context("Failed to configure Kite client")?;
                info!(base_url = %self.config.broker.base_url, "Using Kite Connect brokerage");
                Ok(Arc::new(kite))
            }
        }
    }

    /// Builds the trade and monitor jobs over the configured services.
    ///
    /// # Errors
    /// Returns error if any client cannot be built.
    pub async fn jobs(&self) -> Result<TradingJobs> {
        let model: Arc<dyn LanguageModel> =
            Arc::new(ChatClient::new(self.config.llm.clone()).context("Failed to build LLM client")?);
        let news = NewsApiClient::new(self.config.news.clone()).context("Failed to build news client")?;

        let collaborators = Collaborators {
            market_data: self.market_data.clone(),
            sentiment: SentimentAnalyzer::new(
                Arc::new(news),
                model.clone(),
                SentimentAggregator::new(self.config.news.max_articles),
            ),
            model,
            broker: self.broker().await?,
            store: self.database.clone(),
        };

        Ok(TradingJobs::new(
            collaborators,
            PipelineSettings::from(&self.config.trading),
            self.config.predictor.clone(),
            MonitorConfig::from(&self.config.trading),
        ))
    }
}
