//! NewsAPI article collector.
//!
//! Fetches recent articles mentioning a symbol and returns their
//! headline and description as one text per article.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use llm_trade_core::{NewsConfig, SentimentSource, TradeError};
use serde::Deserialize;

const SERVICE: &str = "newsapi";

#[derive(Debug, Deserialize)]
struct EverythingResponse {
    status: String,
    message: Option<String>,
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Debug, Deserialize)]
struct Article {
    title: Option<String>,
    description: Option<String>,
}

impl Article {
    /// `"{title} {description}"`, or whichever part exists.
    fn text(&self) -> Option<String> {
        let parts: Vec<&str> = [self.title.as_deref(), self.description.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        (!parts.is_empty()).then(|| parts.join(" "))
    }
}

/// NewsAPI `/v2/everything` client.
pub struct NewsApiClient {
    config: NewsConfig,
    http: reqwest::Client,
}

impl std::fmt::Debug for NewsApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewsApiClient")
            .field("api_url", &self.config.api_url)
            .field("max_articles", &self.config.max_articles)
            .finish_non_exhaustive()
    }
}

impl NewsApiClient {
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: NewsConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent("llm-trade")
            .build()?;
        Ok(Self { config, http })
    }

    /// Sets a custom base URL (useful for testing).
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_url = url.into();
        self
    }
}

#[async_trait]
impl SentimentSource for NewsApiClient {
    async fn fetch_articles(&self, symbol: &str) -> llm_trade_core::Result<Vec<String>> {
        let url = format!("{}/v2/everything", self.config.api_url);
        tracing::debug!(symbol = %symbol, "Fetching news");

        let response = self
            .http
            .get(&url)
            .query(&[("q", symbol), ("apiKey", self.config.api_key.as_str())])
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| TradeError::fetch(SERVICE, e))?;

        let status = response.status();
        let body: EverythingResponse = response
            .json()
            .await
            .map_err(|e| TradeError::fetch(SERVICE, format!("HTTP {status}: invalid payload: {e}")))?;

        if !status.is_success() || body.status != "ok" {
            return Err(TradeError::fetch(
                SERVICE,
                format!("HTTP {status}: {}", body.message.unwrap_or_default()),
            ));
        }

        Ok(body
            .articles
            .iter()
            .filter_map(Article::text)
            .take(self.config.max_articles)
            .collect())
    }
}
