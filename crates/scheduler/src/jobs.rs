use std::sync::Arc;

use anyhow::{Context, Result};
use llm_trade_core::PredictorConfig;
use llm_trade_position_manager::{MonitorConfig, MonitorReport, PositionMonitor};
use llm_trade_strategy::{
    Collaborators, DecisionPipeline, PipelineOutcome, PipelineSettings, RandomForest, SuccessPredictor, TrainingReport,
};
use tokio::sync::Mutex;
use tracing::{info, warn};

/// The two jobs the daemon runs, sharing one set of collaborators.
///
/// Jobs never overlap: a monitor tick that fires while the trade job is
/// still running waits for it to finish.
pub struct TradingJobs {
    collaborators: Collaborators,
    settings: PipelineSettings,
    predictor: PredictorConfig,
    monitor: PositionMonitor,
    running: Mutex<()>,
}

impl TradingJobs {
    #[must_use]
    pub fn new(
        collaborators: Collaborators,
        settings: PipelineSettings,
        predictor: PredictorConfig,
        monitor: MonitorConfig,
    ) -> Self {
        let monitor = PositionMonitor::new(collaborators.broker.clone(), collaborators.store.clone(), monitor);
        Self {
            collaborators,
            settings,
            predictor,
            monitor,
            running: Mutex::new(()),
        }
    }

    /// Trains a fresh success predictor from the store's trade history.
    ///
    /// # Errors
    /// Returns error if the history cannot be read or the forest fails to fit.
    pub async fn train(&self) -> Result<TrainingReport> {
        let trades = self
            .collaborators
            .store
            .all_trades()
            .await
            .context("Failed to load trade history")?;
        let forest = RandomForest::from_config(&self.predictor);
        SuccessPredictor::train(&forest, &trades, &self.predictor)
    }

    /// Retrains the predictor, then runs the decision pipeline once.
    ///
    /// A training failure is logged and the run continues with an untrained
    /// predictor, which lets the sentiment gate decide alone.
    pub async fn trade(&self) -> PipelineOutcome {
        let _guard = self.running.lock().await;

        let predictor = match self.train().await {
            Ok(report) => report.predictor,
            Err(e) => {
                warn!(error = %e, "Training failed, running with an untrained predictor");
                SuccessPredictor::untrained()
            }
        };

        let pipeline = DecisionPipeline::new(self.collaborators.clone(), self.settings.clone(), predictor);
        let outcome = pipeline.run().await;
        info!(outcome = outcome.name(), "Trade job finished");
        outcome
    }

    /// Runs one position monitoring cycle.
    ///
    /// # Errors
    /// Returns error if open positions cannot be fetched from the brokerage.
    pub async fn monitor(&self) -> Result<MonitorReport> {
        let _guard = self.running.lock().await;
        let report = self.monitor.run_cycle().await.context("Monitoring cycle failed")?;
        info!(positions = report.outcomes.len(), "Monitor job finished");
        Ok(report)
    }

    /// One trade run followed by one monitoring cycle.
    ///
    /// # Errors
    /// Returns error if the monitoring cycle fails.
    pub async fn run_once(&self) -> Result<(PipelineOutcome, MonitorReport)> {
        let outcome = self.trade().await;
        let report = self.monitor().await?;
        Ok((outcome, report))
    }
}

/// Shareable handle used by the cron closures.
pub type SharedJobs = Arc<TradingJobs>;

#[cfg(test)]
mod tests {
    use super::*;
    use llm_trade_core::{
        LogLevel, MockBrokerage, MockLanguageModel, MockMarketDataSource, MockSentimentSource, MockTradeStore,
        TradeError,
    };
    use llm_trade_signals::{SentimentAggregator, SentimentAnalyzer};
    use rust_decimal_macros::dec;

    fn jobs(market: MockMarketDataSource, broker: MockBrokerage, store: MockTradeStore) -> TradingJobs {
        let model = Arc::new(MockLanguageModel::new());
        let collaborators = Collaborators {
            market_data: Arc::new(market),
            sentiment: SentimentAnalyzer::new(
                Arc::new(MockSentimentSource::new()),
                model.clone(),
                SentimentAggregator::default(),
            ),
            model,
            broker: Arc::new(broker),
            store: Arc::new(store),
        };
        let settings = PipelineSettings {
            symbols: vec!["INFY.NS".to_string()],
            objective: "Grow the account steadily.".to_string(),
            capital: dec!(5000),
            risk_per_trade: dec!(0.02),
        };
        TradingJobs::new(collaborators, settings, PredictorConfig::default(), MonitorConfig::default())
    }

    fn empty_market() -> MockMarketDataSource {
        let mut market = MockMarketDataSource::new();
        market.expect_fetch_all().times(1).returning(|_| Vec::new());
        market
    }

    #[tokio::test]
    async fn trade_job_trains_then_runs_pipeline() {
        let mut store = MockTradeStore::new();
        store.expect_all_trades().times(1).returning(|| Ok(Vec::new()));
        store
            .expect_log()
            .withf(|level, _| *level == LogLevel::Warning)
            .times(1)
            .returning(|_, _| Ok(()));

        let outcome = jobs(empty_market(), MockBrokerage::new(), store).trade().await;
        assert_eq!(outcome.name(), "no_data");
    }

    #[tokio::test]
    async fn training_failure_does_not_block_trading() {
        let mut store = MockTradeStore::new();
        store
            .expect_all_trades()
            .returning(|| Err(TradeError::storage("database is locked")));
        store.expect_log().returning(|_, _| Ok(()));

        let outcome = jobs(empty_market(), MockBrokerage::new(), store).trade().await;
        assert_eq!(outcome.name(), "no_data");
    }

    #[tokio::test]
    async fn run_once_runs_both_jobs() {
        let mut broker = MockBrokerage::new();
        broker.expect_open_positions().times(1).returning(|| Ok(Vec::new()));

        let mut store = MockTradeStore::new();
        store.expect_all_trades().returning(|| Ok(Vec::new()));
        store.expect_log().returning(|_, _| Ok(()));

        let (outcome, report) = jobs(empty_market(), broker, store).run_once().await.unwrap();
        assert_eq!(outcome.name(), "no_data");
        assert!(report.outcomes.is_empty());
    }

    #[tokio::test]
    async fn monitor_job_surfaces_broker_outage() {
        let mut broker = MockBrokerage::new();
        broker
            .expect_open_positions()
            .returning(|| Err(TradeError::fetch("kite", "connection reset")));
        let mut store = MockTradeStore::new();
        store.expect_log().returning(|_, _| Ok(()));

        let result = jobs(MockMarketDataSource::new(), broker, store).monitor().await;
        assert!(result.is_err());
    }
}
