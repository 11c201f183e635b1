//! News sentiment scoring.
//!
//! Each article is labelled by the language model; labels are combined by
//! [`SentimentAggregator`] with ties resolving to neutral.

use std::sync::Arc;

use llm_trade_core::{Candidate, LanguageModel, Sentiment, SentimentSource};
use tracing::{debug, info, warn};

/// Majority vote over article labels.
#[derive(Debug, Clone, Copy)]
pub struct SentimentAggregator {
    max_votes: usize,
}

impl Default for SentimentAggregator {
    fn default() -> Self {
        Self { max_votes: 5 }
    }
}

impl SentimentAggregator {
    #[must_use]
    pub fn new(max_votes: usize) -> Self {
        Self { max_votes }
    }

    /// Label with strictly more votes than each of the other two among the
    /// first `max_votes` labels. Ties and empty input are neutral.
    pub fn aggregate(&self, labels: &[Sentiment]) -> Sentiment {
        let votes = &labels[..labels.len().min(self.max_votes)];
        let count = |label: Sentiment| votes.iter().filter(|l| **l == label).count();

        let positive = count(Sentiment::Positive);
        let negative = count(Sentiment::Negative);
        let neutral = count(Sentiment::Neutral);

        if positive > negative && positive > neutral {
            Sentiment::Positive
        } else if negative > positive && negative > neutral {
            Sentiment::Negative
        } else {
            Sentiment::Neutral
        }
    }
}

/// Prompt asking the model to label one article.
pub fn sentiment_prompt(text: &str) -> String {
    format!("Analyze the sentiment of the following text: {text}. Return Positive, Negative, or Neutral.")
}

/// Scores symbols by classifying their recent news with a language model.
#[derive(Clone)]
pub struct SentimentAnalyzer {
    source: Arc<dyn SentimentSource>,
    model: Arc<dyn LanguageModel>,
    aggregator: SentimentAggregator,
}

impl SentimentAnalyzer {
    pub fn new(
        source: Arc<dyn SentimentSource>,
        model: Arc<dyn LanguageModel>,
        aggregator: SentimentAggregator,
    ) -> Self {
        Self {
            source,
            model,
            aggregator,
        }
    }

    /// Aggregate sentiment for a symbol. Never fails: a news fetch error
    /// yields `Neutral`, and articles the model cannot label are ignored.
    pub async fn score(&self, symbol: &str) -> Sentiment {
        let articles = match self.source.fetch_articles(symbol).await {
            Ok(articles) => articles,
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "News fetch failed, treating sentiment as neutral");
                return Sentiment::Neutral;
            }
        };

        let mut labels = Vec::with_capacity(articles.len());
        for text in articles.iter().take(self.aggregator.max_votes) {
            match self.model.complete(&sentiment_prompt(text)).await {
                Ok(Some(answer)) => match Sentiment::from_label(&answer) {
                    Some(label) => labels.push(label),
                    None => debug!(symbol = %symbol, answer = %answer, "Unrecognised sentiment label"),
                },
                Ok(None) => debug!(symbol = %symbol, "Empty sentiment answer"),
                Err(e) => warn!(symbol = %symbol, error = %e, "Sentiment classification failed"),
            }
        }

        let sentiment = self.aggregator.aggregate(&labels);
        info!(symbol = %symbol, articles = articles.len(), labelled = labels.len(), sentiment = %sentiment, "Sentiment scored");
        sentiment
    }

    /// Returns the candidates annotated with their aggregate sentiment.
    pub async fn annotate(&self, candidates: Vec<Candidate>) -> Vec<Candidate> {
        let mut annotated = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let sentiment = self.score(&candidate.symbol).await;
            annotated.push(candidate.with_sentiment(sentiment));
        }
        annotated
    }
}
