//! One-shot trade decision pipeline.
//!
//! fetch → sentiment → prompt → parse → filter → size → submit → record.
//! Every early exit is a [`PipelineOutcome`]; nothing is retried and nothing
//! already appended is rolled back.

use std::fmt;
use std::sync::Arc;

use llm_trade_core::{
    Brokerage, LanguageModel, LogLevel, MarketDataSource, OrderSide, RiskSizer, Sentiment, TradeDecision,
    TradeError, TradeExecutedEvent, TradeRecord, TradeStore, TradingConfig,
};
use llm_trade_signals::SentimentAnalyzer;
use rust_decimal::Decimal;
use tracing::{error, info, warn};

use crate::parser::TradeProposalParser;
use crate::predictor::SuccessPredictor;
use crate::prompt::build_prompt;

/// External services the pipeline talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub market_data: Arc<dyn MarketDataSource>,
    pub sentiment: SentimentAnalyzer,
    pub model: Arc<dyn LanguageModel>,
    pub broker: Arc<dyn Brokerage>,
    pub store: Arc<dyn TradeStore>,
}

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub symbols: Vec<String>,
    pub objective: String,
    pub capital: Decimal,
    pub risk_per_trade: Decimal,
}

impl From<&TradingConfig> for PipelineSettings {
    fn from(config: &TradingConfig) -> Self {
        Self {
            symbols: config.symbols.clone(),
            objective: config.objective.clone(),
            capital: config.capital,
            risk_per_trade: config.risk_per_trade,
        }
    }
}

/// Terminal state of one pipeline run.
#[derive(Debug)]
pub enum PipelineOutcome {
    /// No candidate could be fetched.
    NoData,
    /// The model gave no answer, failed, or answered without a full proposal.
    NoProposal(TradeError),
    RejectedByFilter(TradeError),
    /// Bad price ordering or a zero share count.
    ZeroQuantity(TradeError),
    SubmissionFailed(TradeError),
    /// The order went through but could not be recorded.
    Aborted(TradeError),
    Recorded(TradeRecord),
}

impl PipelineOutcome {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::NoData => "no_data",
            Self::NoProposal(_) => "no_proposal",
            Self::RejectedByFilter(_) => "rejected_by_filter",
            Self::ZeroQuantity(_) => "zero_quantity",
            Self::SubmissionFailed(_) => "submission_failed",
            Self::Aborted(_) => "aborted",
            Self::Recorded(_) => "recorded",
        }
    }

    #[must_use]
    pub fn level(&self) -> LogLevel {
        match self {
            Self::Recorded(_) => LogLevel::Info,
            Self::NoData => LogLevel::Warning,
            Self::Aborted(_) => LogLevel::Error,
            Self::NoProposal(e) | Self::RejectedByFilter(e) | Self::ZeroQuantity(e) | Self::SubmissionFailed(e) => {
                if e.is_actionable() {
                    LogLevel::Error
                } else {
                    LogLevel::Warning
                }
            }
        }
    }

    #[must_use]
    pub fn trade(&self) -> Option<&TradeRecord> {
        match self {
            Self::Recorded(trade) => Some(trade),
            _ => None,
        }
    }

    #[must_use]
    pub fn error(&self) -> Option<&TradeError> {
        match self {
            Self::NoData | Self::Recorded(_) => None,
            Self::NoProposal(e)
            | Self::RejectedByFilter(e)
            | Self::ZeroQuantity(e)
            | Self::SubmissionFailed(e)
            | Self::Aborted(e) => Some(e),
        }
    }
}

impl fmt::Display for PipelineOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoData => write!(f, "No stock data fetched. No trade executed."),
            Self::NoProposal(e) => write!(f, "No trade proposal. {e}"),
            Self::RejectedByFilter(e) => write!(f, "Trade rejected. {e}"),
            Self::ZeroQuantity(e) => write!(f, "Trade skipped. {e}"),
            Self::SubmissionFailed(e) => write!(f, "Order not placed. {e}"),
            Self::Aborted(e) => write!(f, "Run aborted. {e}"),
            Self::Recorded(trade) => write!(
                f,
                "Bought {} {} at {} (target {}, stop {}), order {}",
                trade.quantity, trade.symbol, trade.entry, trade.target, trade.stop, trade.order_id
            ),
        }
    }
}

pub struct DecisionPipeline {
    collaborators: Collaborators,
    settings: PipelineSettings,
    predictor: SuccessPredictor,
    sizer: RiskSizer,
    parser: TradeProposalParser,
}

impl DecisionPipeline {
    #[must_use]
    pub fn new(collaborators: Collaborators, settings: PipelineSettings, predictor: SuccessPredictor) -> Self {
        let sizer = RiskSizer::new(settings.capital, settings.risk_per_trade);
        Self {
            collaborators,
            settings,
            predictor,
            sizer,
            parser: TradeProposalParser::new(),
        }
    }

    /// Runs the pipeline once and reports the outcome to tracing and the
    /// store's log table.
    pub async fn run(&self) -> PipelineOutcome {
        let outcome = self.decide().await;
        self.report(&outcome).await;
        outcome
    }

    async fn decide(&self) -> PipelineOutcome {
        let c = &self.collaborators;

        let candidates = c.market_data.fetch_all(&self.settings.symbols).await;
        if candidates.is_empty() {
            return PipelineOutcome::NoData;
        }
        info!(candidates = candidates.len(), universe = self.settings.symbols.len(), "Fetched candidates");

        let candidates = c.sentiment.annotate(candidates).await;

        let prompt = build_prompt(&self.settings.objective, &candidates);
        let answer = match c.model.complete(&prompt).await {
            Ok(Some(answer)) => answer,
            Ok(None) => {
                return PipelineOutcome::NoProposal(TradeError::ProposalUnparseable(
                    "no response from language model".to_string(),
                ))
            }
            Err(e) => return PipelineOutcome::NoProposal(e),
        };
        info!(answer = %answer, "Language model answered");

        let Some(proposal) = self.parser.parse(&answer) else {
            return PipelineOutcome::NoProposal(TradeError::ProposalUnparseable(format!(
                "expected 'Buy <SYMBOL> at <entry>, target <price>, SL <price>', got {answer:?}"
            )));
        };

        let sentiment = candidates
            .iter()
            .find(|candidate| candidate.symbol == proposal.symbol)
            .map_or(Sentiment::Neutral, |candidate| candidate.sentiment);
        let predicted_success = self.predictor.predict(&proposal);
        info!(
            symbol = %proposal.symbol,
            predicted_success,
            trained = self.predictor.is_trained(),
            sentiment = %sentiment,
            "Filtering proposal"
        );

        if !(predicted_success && sentiment == Sentiment::Positive) {
            return PipelineOutcome::RejectedByFilter(TradeError::FilteredOut(format!(
                "{}: predicted {}, sentiment {}",
                proposal.symbol,
                if predicted_success { "success" } else { "failure" },
                sentiment
            )));
        }

        let quantity = self.sizer.size(proposal.entry, proposal.stop);
        let decision = match TradeDecision::new(proposal, sentiment, predicted_success, quantity) {
            Ok(decision) => decision,
            Err(e) => return PipelineOutcome::ZeroQuantity(e),
        };

        let entry = decision.proposal().entry;
        let order_id = match c
            .broker
            .place_order(decision.symbol(), decision.quantity(), entry, OrderSide::Buy)
            .await
        {
            Ok(order_id) => order_id,
            Err(e) => return PipelineOutcome::SubmissionFailed(e),
        };

        let trade = TradeRecord::from_decision(&decision, order_id);
        if let Err(e) = c.store.insert_trade(&trade).await {
            return PipelineOutcome::Aborted(TradeError::storage(format!(
                "order {} for {} placed but not recorded: {e}",
                trade.order_id, trade.symbol
            )));
        }

        PipelineOutcome::Recorded(trade)
    }

    async fn report(&self, outcome: &PipelineOutcome) {
        let message = match outcome {
            PipelineOutcome::Recorded(trade) => TradeExecutedEvent::from(trade).emit(),
            other => other.to_string(),
        };

        let level = outcome.level();
        match level {
            LogLevel::Info => info!(outcome = outcome.name(), "{message}"),
            LogLevel::Warning => warn!(outcome = outcome.name(), "{message}"),
            LogLevel::Error => error!(outcome = outcome.name(), "{message}"),
        }

        if let Err(e) = self.collaborators.store.log(level, &message).await {
            warn!(error = %e, "Failed to append pipeline outcome to the log table");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use llm_trade_core::{
        Candidate, MockBrokerage, MockLanguageModel, MockMarketDataSource, MockSentimentSource, MockTradeStore,
        TrainedModel,
    };
    use llm_trade_signals::SentimentAggregator;
    use rust_decimal_macros::dec;

    const PROPOSAL: &str = "Buy RELIANCE.NS at 201, target 206, SL 198";

    fn candidate(symbol: &str) -> Candidate {
        Candidate {
            symbol: symbol.to_string(),
            close: dec!(200.50),
            support: dec!(195.00),
            resistance: dec!(210.00),
            rsi: dec!(42.10),
            sentiment: Sentiment::Neutral,
        }
    }

    fn settings() -> PipelineSettings {
        PipelineSettings {
            symbols: vec!["RELIANCE.NS".to_string(), "TCS.NS".to_string()],
            objective: "Our goal is steady growth.".to_string(),
            capital: dec!(5000),
            risk_per_trade: dec!(0.015),
        }
    }

    /// News always has one article; the model labels it with `label` and
    /// answers the trade prompt with `proposal`.
    fn collaborators(
        market: MockMarketDataSource,
        label: &'static str,
        proposal: Option<&'static str>,
        broker: MockBrokerage,
        store: MockTradeStore,
    ) -> Collaborators {
        let mut news = MockSentimentSource::new();
        news.expect_fetch_articles()
            .returning(|symbol| Ok(vec![format!("{symbol} posts results")]));

        let mut model = MockLanguageModel::new();
        model.expect_complete().returning(move |prompt| {
            if prompt.starts_with("Analyze the sentiment") {
                Ok(Some(label.to_string()))
            } else {
                Ok(proposal.map(str::to_string))
            }
        });
        let model: Arc<dyn LanguageModel> = Arc::new(model);

        Collaborators {
            market_data: Arc::new(market),
            sentiment: SentimentAnalyzer::new(Arc::new(news), model.clone(), SentimentAggregator::default()),
            model,
            broker: Arc::new(broker),
            store: Arc::new(store),
        }
    }

    fn market_with(symbols: &'static [&'static str]) -> MockMarketDataSource {
        let mut market = MockMarketDataSource::new();
        market
            .expect_fetch_all()
            .returning(move |_| symbols.iter().map(|s| candidate(s)).collect());
        market
    }

    fn logging_store(level: LogLevel) -> MockTradeStore {
        let mut store = MockTradeStore::new();
        store
            .expect_log()
            .withf(move |l, _| *l == level)
            .times(1)
            .returning(|_, _| Ok(()));
        store
    }

    #[tokio::test]
    async fn test_empty_fetch_is_no_data_without_model_calls() {
        let mut market = MockMarketDataSource::new();
        market.expect_fetch_all().times(1).returning(|_| Vec::new());

        let mut news = MockSentimentSource::new();
        news.expect_fetch_articles().never();
        let mut model = MockLanguageModel::new();
        model.expect_complete().never();
        let model: Arc<dyn LanguageModel> = Arc::new(model);
        let mut broker = MockBrokerage::new();
        broker.expect_place_order().never();

        let collaborators = Collaborators {
            market_data: Arc::new(market),
            sentiment: SentimentAnalyzer::new(Arc::new(news), model.clone(), SentimentAggregator::default()),
            model,
            broker: Arc::new(broker),
            store: Arc::new(logging_store(LogLevel::Warning)),
        };

        let outcome = DecisionPipeline::new(collaborators, settings(), SuccessPredictor::untrained())
            .run()
            .await;
        assert!(matches!(outcome, PipelineOutcome::NoData));
    }

    #[tokio::test]
    async fn test_positive_proposal_is_recorded() {
        let mut broker = MockBrokerage::new();
        broker
            .expect_place_order()
            .withf(|symbol, quantity, price, side| {
                symbol == "RELIANCE.NS" && *quantity == 25 && *price == dec!(201) && *side == OrderSide::Buy
            })
            .times(1)
            .returning(|_, _, _, _| Ok("240101000001".to_string()));

        let mut store = logging_store(LogLevel::Info);
        store
            .expect_insert_trade()
            .withf(|t| {
                t.symbol == "RELIANCE.NS"
                    && t.quantity == 25
                    && t.entry == dec!(201)
                    && t.target == dec!(206)
                    && t.stop == dec!(198)
                    && t.order_id == "240101000001"
            })
            .times(1)
            .returning(|_| Ok(1));

        let collaborators = collaborators(market_with(&["RELIANCE.NS"]), "Positive", Some(PROPOSAL), broker, store);
        let outcome = DecisionPipeline::new(collaborators, settings(), SuccessPredictor::untrained())
            .run()
            .await;

        let trade = outcome.trade().unwrap();
        assert_eq!(trade.quantity, 25);
        assert_eq!(outcome.level(), LogLevel::Info);
    }

    #[tokio::test]
    async fn test_non_positive_sentiment_is_filtered() {
        let mut broker = MockBrokerage::new();
        broker.expect_place_order().never();
        let mut store = logging_store(LogLevel::Warning);
        store.expect_insert_trade().never();

        let collaborators = collaborators(market_with(&["RELIANCE.NS"]), "Negative", Some(PROPOSAL), broker, store);
        let outcome = DecisionPipeline::new(collaborators, settings(), SuccessPredictor::untrained())
            .run()
            .await;

        assert!(matches!(outcome, PipelineOutcome::RejectedByFilter(TradeError::FilteredOut(_))));
    }

    #[tokio::test]
    async fn test_unfetched_symbol_counts_as_neutral() {
        let mut broker = MockBrokerage::new();
        broker.expect_place_order().never();

        let collaborators = collaborators(
            market_with(&["TCS.NS"]),
            "Positive",
            Some(PROPOSAL),
            broker,
            logging_store(LogLevel::Warning),
        );
        let outcome = DecisionPipeline::new(collaborators, settings(), SuccessPredictor::untrained())
            .run()
            .await;

        assert!(matches!(outcome, PipelineOutcome::RejectedByFilter(_)));
    }

    #[derive(Debug)]
    struct Pessimist;

    impl TrainedModel for Pessimist {
        fn predict(&self, _features: &[f64]) -> bool {
            false
        }
    }

    #[tokio::test]
    async fn test_predicted_failure_is_filtered() {
        let mut broker = MockBrokerage::new();
        broker.expect_place_order().never();

        let collaborators = collaborators(
            market_with(&["RELIANCE.NS"]),
            "Positive",
            Some(PROPOSAL),
            broker,
            logging_store(LogLevel::Warning),
        );
        let predictor = SuccessPredictor::from_model(Box::new(Pessimist));
        let outcome = DecisionPipeline::new(collaborators, settings(), predictor).run().await;

        assert!(matches!(outcome, PipelineOutcome::RejectedByFilter(_)));
    }

    #[tokio::test]
    async fn test_unparseable_answer_is_no_proposal() {
        let mut broker = MockBrokerage::new();
        broker.expect_place_order().never();

        let collaborators = collaborators(
            market_with(&["RELIANCE.NS"]),
            "Positive",
            Some("No suitable trade found today."),
            broker,
            logging_store(LogLevel::Warning),
        );
        let outcome = DecisionPipeline::new(collaborators, settings(), SuccessPredictor::untrained())
            .run()
            .await;

        assert!(matches!(outcome, PipelineOutcome::NoProposal(TradeError::ProposalUnparseable(_))));
    }

    #[tokio::test]
    async fn test_empty_answer_is_no_proposal() {
        let mut broker = MockBrokerage::new();
        broker.expect_place_order().never();

        let collaborators = collaborators(
            market_with(&["RELIANCE.NS"]),
            "Positive",
            None,
            broker,
            logging_store(LogLevel::Warning),
        );
        let outcome = DecisionPipeline::new(collaborators, settings(), SuccessPredictor::untrained())
            .run()
            .await;

        assert!(matches!(outcome, PipelineOutcome::NoProposal(_)));
    }

    #[tokio::test]
    async fn test_inverted_prices_are_zero_quantity() {
        let mut broker = MockBrokerage::new();
        broker.expect_place_order().never();

        let collaborators = collaborators(
            market_with(&["RELIANCE.NS"]),
            "Positive",
            Some("Buy RELIANCE.NS at 201, target 206, SL 205"),
            broker,
            logging_store(LogLevel::Warning),
        );
        let outcome = DecisionPipeline::new(collaborators, settings(), SuccessPredictor::untrained())
            .run()
            .await;

        assert!(matches!(outcome, PipelineOutcome::ZeroQuantity(TradeError::InvalidSizing(_))));
    }

    #[tokio::test]
    async fn test_rejected_order_is_not_recorded() {
        let mut broker = MockBrokerage::new();
        broker
            .expect_place_order()
            .times(1)
            .returning(|_, _, _, _| Err(TradeError::submission("kite: insufficient margin")));
        let mut store = logging_store(LogLevel::Error);
        store.expect_insert_trade().never();

        let collaborators = collaborators(market_with(&["RELIANCE.NS"]), "Positive", Some(PROPOSAL), broker, store);
        let outcome = DecisionPipeline::new(collaborators, settings(), SuccessPredictor::untrained())
            .run()
            .await;

        assert!(matches!(outcome, PipelineOutcome::SubmissionFailed(_)));
        assert!(outcome.error().unwrap().is_actionable());
    }

    #[tokio::test]
    async fn test_store_failure_after_order_aborts() {
        let mut broker = MockBrokerage::new();
        broker
            .expect_place_order()
            .returning(|_, _, _, _| Ok("ORD-9".to_string()));
        let mut store = logging_store(LogLevel::Error);
        store
            .expect_insert_trade()
            .returning(|_| Err(TradeError::storage("database is locked")));

        let collaborators = collaborators(market_with(&["RELIANCE.NS"]), "Positive", Some(PROPOSAL), broker, store);
        let outcome = DecisionPipeline::new(collaborators, settings(), SuccessPredictor::untrained())
            .run()
            .await;

        match outcome {
            PipelineOutcome::Aborted(e) => assert!(e.to_string().contains("ORD-9")),
            other => panic!("expected Aborted, got {other:?}"),
        }
    }
}
