//! Yahoo Finance chart client.
//!
//! Pulls daily closes and turns them into candidate snapshots
//! (close, RSI, rolling support/resistance).

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use llm_trade_core::{Candidate, MarketDataConfig, MarketDataSource, PriceBar, Sentiment, TradeError};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

use crate::indicators;

const SERVICE: &str = "yahoo";

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    timestamp: Option<Vec<i64>>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Deserialize)]
struct ChartQuote {
    close: Option<Vec<Option<f64>>>,
}

impl ChartResult {
    /// (timestamp, close) pairs with null closes dropped.
    fn closes(&self) -> Vec<(i64, f64)> {
        let timestamps = self.timestamp.as_deref().unwrap_or_default();
        let closes = self
            .indicators
            .quote
            .first()
            .and_then(|q| q.close.as_deref())
            .unwrap_or_default();

        timestamps
            .iter()
            .zip(closes)
            .filter_map(|(ts, close)| (*close).filter(|c| c.is_finite()).map(|c| (*ts, c)))
            .collect()
    }
}

/// Daily-bar market data client.
pub struct YahooFinanceClient {
    config: MarketDataConfig,
    http: reqwest::Client,
}

impl std::fmt::Debug for YahooFinanceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YahooFinanceClient")
            .field("base_url", &self.config.base_url)
            .finish_non_exhaustive()
    }
}

impl YahooFinanceClient {
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: MarketDataConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent("Mozilla/5.0 (compatible; llm-trade)")
            .build()?;
        Ok(Self { config, http })
    }

    /// Sets a custom base URL (useful for testing).
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    async fn chart(&self, symbol: &str, query: &[(&str, String)]) -> llm_trade_core::Result<Vec<(i64, f64)>> {
        let url = format!("{}/v8/finance/chart/{}", self.config.base_url, symbol);
        debug!(url = %url, "Fetching chart");

        let response = self
            .http
            .get(&url)
            .query(query)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| TradeError::fetch(SERVICE, e))?;

        let status = response.status();
        if status.as_u16() == 404 {
            return Ok(Vec::new());
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(TradeError::fetch(SERVICE, format!("HTTP {status}: {text}")));
        }

        let body: ChartResponse = response
            .json()
            .await
            .map_err(|e| TradeError::fetch(SERVICE, format!("invalid chart payload: {e}")))?;

        if let Some(err) = body.chart.error {
            return Err(TradeError::fetch(
                SERVICE,
                format!(
                    "{}: {}",
                    err.code.unwrap_or_default(),
                    err.description.unwrap_or_default()
                ),
            ));
        }

        Ok(body
            .chart
            .result
            .and_then(|results| results.into_iter().next())
            .map(|result| result.closes())
            .unwrap_or_default())
    }

    fn to_candidate(&self, symbol: &str, closes: &[f64]) -> Option<Candidate> {
        let snap = indicators::snapshot(
            closes,
            self.config.rsi_period,
            self.config.support_resistance_window,
        )?;

        Some(Candidate {
            symbol: symbol.to_string(),
            close: two_dp(snap.close)?,
            support: two_dp(snap.support)?,
            resistance: two_dp(snap.resistance)?,
            rsi: two_dp(snap.rsi)?,
            sentiment: Sentiment::Neutral,
        })
    }
}

fn two_dp(value: f64) -> Option<Decimal> {
    Decimal::try_from(value).ok().map(|d| d.round_dp(2))
}

fn start_of_day(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp()
}

#[async_trait]
impl MarketDataSource for YahooFinanceClient {
    async fn fetch(&self, symbol: &str) -> llm_trade_core::Result<Option<Candidate>> {
        let query = [
            ("range", self.config.history_range.clone()),
            ("interval", "1d".to_string()),
        ];
        let closes: Vec<f64> = self.chart(symbol, &query).await?.into_iter().map(|(_, c)| c).collect();
        Ok(self.to_candidate(symbol, &closes))
    }

    async fn daily_closes(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> llm_trade_core::Result<Vec<PriceBar>> {
        let query = [
            ("period1", start_of_day(from).to_string()),
            // period2 is exclusive
            ("period2", start_of_day(to.succ_opt().unwrap_or(to)).to_string()),
            ("interval", "1d".to_string()),
        ];

        let bars = self
            .chart(symbol, &query)
            .await?
            .into_iter()
            .filter_map(|(ts, close)| {
                let date = DateTime::<Utc>::from_timestamp(ts, 0)?.date_naive();
                Some(PriceBar {
                    date,
                    close: Decimal::try_from(close).ok()?,
                })
            })
            .collect();

        Ok(bars)
    }
}
