use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use chrono_tz::Tz;
use llm_trade_core::SchedulerConfig;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, warn};

use crate::jobs::{SharedJobs, TradingJobs};

pub struct TradingScheduler {
    config: SchedulerConfig,
    jobs: SharedJobs,
}

impl TradingScheduler {
    #[must_use]
    pub fn new(config: SchedulerConfig, jobs: TradingJobs) -> Self {
        Self {
            config,
            jobs: Arc::new(jobs),
        }
    }

    /// Parses the configured IANA zone.
    ///
    /// # Errors
    /// Returns error if the zone name is unknown.
    pub fn timezone(&self) -> Result<Tz> {
        self.config
            .timezone
            .parse::<Tz>()
            .map_err(|e| anyhow!("Invalid scheduler timezone {:?}: {e}", self.config.timezone))
    }

    /// Registers both jobs and runs them until Ctrl-C.
    ///
    /// A failing job is logged; the daemon keeps running.
    ///
    /// # Errors
    /// Returns an error if the timezone or a cron expression is invalid, or
    /// the scheduler fails to start.
    pub async fn start(self) -> Result<()> {
        let tz = self.timezone()?;
        info!(
            trade_cron = %self.config.trade_cron,
            monitor_cron = %self.config.monitor_cron,
            timezone = %tz,
            "Starting trading scheduler"
        );

        let mut scheduler = JobScheduler::new().await.context("Failed to create job scheduler")?;

        let jobs = self.jobs.clone();
        let trade = Job::new_async_tz(self.config.trade_cron.as_str(), tz, move |_uuid, _lock| {
            let jobs = jobs.clone();
            Box::pin(async move {
                let outcome = jobs.trade().await;
                if let Some(e) = outcome.error().filter(|e| e.is_actionable()) {
                    error!(outcome = outcome.name(), error = %e, "Trade job needs attention");
                }
            })
        })
        .with_context(|| format!("Invalid trade cron expression: {}", self.config.trade_cron))?;

        let jobs = self.jobs.clone();
        let monitor = Job::new_async_tz(self.config.monitor_cron.as_str(), tz, move |_uuid, _lock| {
            let jobs = jobs.clone();
            Box::pin(async move {
                if let Err(e) = jobs.monitor().await {
                    error!("Monitor job failed: {e:#}");
                }
            })
        })
        .with_context(|| format!("Invalid monitor cron expression: {}", self.config.monitor_cron))?;

        scheduler.add(trade).await.context("Failed to add trade job")?;
        scheduler.add(monitor).await.context("Failed to add monitor job")?;
        scheduler.start().await.context("Failed to start job scheduler")?;

        info!("Trading scheduler started, press Ctrl-C to stop");

        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Could not listen for Ctrl-C, stopping scheduler");
        }

        info!("Shutting down trading scheduler");
        scheduler.shutdown().await.context("Failed to shut down job scheduler")?;
        Ok(())
    }

    /// Runs both jobs once without scheduling.
    ///
    /// # Errors
    /// Returns an error if the monitoring cycle fails.
    pub async fn run_once(&self) -> Result<()> {
        let (outcome, report) = self.jobs.run_once().await?;
        info!(outcome = outcome.name(), monitor = %report.summary(), "Manual run complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use llm_trade_core::{
        MockBrokerage, MockLanguageModel, MockMarketDataSource, MockSentimentSource, MockTradeStore, PredictorConfig,
    };
    use llm_trade_position_manager::MonitorConfig;
    use llm_trade_signals::{SentimentAggregator, SentimentAnalyzer};
    use llm_trade_strategy::{Collaborators, PipelineSettings};
    use rust_decimal_macros::dec;

    fn scheduler(config: SchedulerConfig) -> TradingScheduler {
        let model = Arc::new(MockLanguageModel::new());
        let collaborators = Collaborators {
            market_data: Arc::new(MockMarketDataSource::new()),
            sentiment: SentimentAnalyzer::new(
                Arc::new(MockSentimentSource::new()),
                model.clone(),
                SentimentAggregator::default(),
            ),
            model,
            broker: Arc::new(MockBrokerage::new()),
            store: Arc::new(MockTradeStore::new()),
        };
        let settings = PipelineSettings {
            symbols: Vec::new(),
            objective: String::new(),
            capital: dec!(5000),
            risk_per_trade: dec!(0.02),
        };
        TradingScheduler::new(
            config,
            TradingJobs::new(collaborators, settings, PredictorConfig::default(), MonitorConfig::default()),
        )
    }

    #[test]
    fn default_timezone_is_kolkata() {
        let tz = scheduler(SchedulerConfig::default()).timezone().unwrap();
        assert_eq!(tz, chrono_tz::Asia::Kolkata);
    }

    #[test]
    fn unknown_timezone_is_rejected() {
        let config = SchedulerConfig {
            timezone: "Mars/Olympus_Mons".to_string(),
            ..SchedulerConfig::default()
        };
        let err = scheduler(config).timezone().unwrap_err();
        assert!(err.to_string().contains("Mars/Olympus_Mons"));
    }

    #[tokio::test]
    async fn bad_cron_fails_before_running() {
        let config = SchedulerConfig {
            trade_cron: "every weekday at ten".to_string(),
            ..SchedulerConfig::default()
        };
        let err = scheduler(config).start().await.unwrap_err();
        assert!(format!("{err:#}").contains("Invalid trade cron expression"));
    }
}
