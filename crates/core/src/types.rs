//! Domain types shared by the pipeline, the monitor and the adapters.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::TradeError;

/// News sentiment label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Sentiment {
    Positive,
    Negative,
    #[default]
    Neutral,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "Positive",
            Self::Negative => "Negative",
            Self::Neutral => "Neutral",
        }
    }

    /// Reads a label out of classifier text.
    ///
    /// The answer must open with a label word, case-insensitively, so
    /// `"Positive."` and `"Negative - weak guidance"` count while
    /// `"Not positive"` does not. Anything else is `None`.
    pub fn from_label(text: &str) -> Option<Self> {
        let first = text.split(|c: char| !c.is_ascii_alphabetic()).find(|word| !word.is_empty())?;
        match first.to_ascii_lowercase().as_str() {
            "positive" => Some(Self::Positive),
            "negative" => Some(Self::Negative),
            "neutral" => Some(Self::Neutral),
            _ => None,
        }
    }
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One stock's signal snapshot for a single fetch cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub symbol: String,
    pub close: Decimal,
    /// Rolling minimum of closes over the support/resistance window.
    pub support: Decimal,
    /// Rolling maximum of closes over the support/resistance window.
    pub resistance: Decimal,
    pub rsi: Decimal,
    pub sentiment: Sentiment,
}

impl Candidate {
    /// Returns the same snapshot annotated with a sentiment label.
    #[must_use]
    pub fn with_sentiment(self, sentiment: Sentiment) -> Self {
        Self { sentiment, ..self }
    }
}

/// A single trade idea extracted from model output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeProposal {
    pub symbol: String,
    pub entry: Decimal,
    pub target: Decimal,
    pub stop: Decimal,
}

impl TradeProposal {
    /// Whether `target > entry > stop`, the only shape a long trade may take.
    pub fn is_long_ordered(&self) -> bool {
        self.target > self.entry && self.entry > self.stop
    }
}

/// A proposal that passed filtering and sizing, ready for submission.
///
/// Only constructible through [`TradeDecision::new`], which enforces price
/// ordering and a positive quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeDecision {
    proposal: TradeProposal,
    sentiment: Sentiment,
    predicted_success: bool,
    quantity: u32,
}

impl TradeDecision {
    /// # Errors
    /// Returns `InvalidSizing` if the prices are not `target > entry > stop`
    /// or the quantity is zero.
    pub fn new(
        proposal: TradeProposal,
        sentiment: Sentiment,
        predicted_success: bool,
        quantity: u32,
    ) -> Result<Self, TradeError> {
        if !proposal.is_long_ordered() {
            return Err(TradeError::InvalidSizing(format!(
                "{}: expected target > entry > stop, got target {} entry {} stop {}",
                proposal.symbol, proposal.target, proposal.entry, proposal.stop
            )));
        }
        if quantity == 0 {
            return Err(TradeError::InvalidSizing(format!(
                "{}: risk budget yields zero shares",
                proposal.symbol
            )));
        }
        Ok(Self {
            proposal,
            sentiment,
            predicted_success,
            quantity,
        })
    }

    pub fn proposal(&self) -> &TradeProposal {
        &self.proposal
    }

    pub fn symbol(&self) -> &str {
        &self.proposal.symbol
    }

    pub fn sentiment(&self) -> Sentiment {
        self.sentiment
    }

    pub fn predicted_success(&self) -> bool {
        self.predicted_success
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }
}

/// Order direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
        }
    }
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A position as reported by the brokerage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerPosition {
    pub symbol: String,
    /// Net quantity; zero for closed intraday positions, negative for shorts.
    pub quantity: i64,
    pub average_price: Decimal,
    /// Resting order attached to the position, when the brokerage reports one.
    pub order_id: Option<String>,
}

/// A long position mirrored locally with its exit bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenPosition {
    pub symbol: String,
    pub quantity: u32,
    pub entry: Decimal,
    pub target: Decimal,
    pub stop: Decimal,
    pub order_id: Option<String>,
}

/// A submitted entry, as persisted in the trade store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub symbol: String,
    pub quantity: u32,
    pub entry: Decimal,
    pub target: Decimal,
    pub stop: Decimal,
    pub order_id: String,
    pub executed_at: DateTime<Utc>,
}

impl TradeRecord {
    /// Builds the record for a decision the brokerage accepted.
    pub fn from_decision(decision: &TradeDecision, order_id: impl Into<String>) -> Self {
        let proposal = decision.proposal();
        Self {
            symbol: proposal.symbol.clone(),
            quantity: decision.quantity(),
            entry: proposal.entry,
            target: proposal.target,
            stop: proposal.stop,
            order_id: order_id.into(),
            executed_at: Utc::now(),
        }
    }
}

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    TargetReached,
    StopLossTriggered,
}

impl ExitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TargetReached => "Target reached",
            Self::StopLossTriggered => "Stop-loss triggered",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Target reached" => Some(Self::TargetReached),
            "Stop-loss triggered" => Some(Self::StopLossTriggered),
            _ => None,
        }
    }
}

impl std::fmt::Display for ExitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A sell order that closed a position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitRecord {
    pub symbol: String,
    pub quantity: u32,
    pub price: Decimal,
    pub reason: ExitReason,
    pub order_id: String,
    pub entry_order_id: Option<String>,
    pub exited_at: DateTime<Utc>,
}

/// Severity for entries in the store's log table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Daily closing price, used by backtests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub close: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn proposal(entry: Decimal, target: Decimal, stop: Decimal) -> TradeProposal {
        TradeProposal {
            symbol: "RELIANCE.NS".to_string(),
            entry,
            target,
            stop,
        }
    }

    #[test]
    fn sentiment_label_parsing() {
        assert_eq!(Sentiment::from_label("Positive"), Some(Sentiment::Positive));
        assert_eq!(Sentiment::from_label(" negative.\n"), Some(Sentiment::Negative));
        assert_eq!(
            Sentiment::from_label("Neutral: results were in line"),
            Some(Sentiment::Neutral)
        );
        assert_eq!(Sentiment::from_label("unclear"), None);
    }

    #[test]
    fn sentiment_label_must_lead_the_answer() {
        assert_eq!(Sentiment::from_label("Not positive"), None);
        assert_eq!(Sentiment::from_label("non-negative outlook"), None);
        assert_eq!(Sentiment::from_label("The sentiment is Neutral overall"), None);
        assert_eq!(Sentiment::from_label("Positively surprising"), None);
        assert_eq!(Sentiment::from_label("**Negative** - weak guidance"), Some(Sentiment::Negative));
    }

    #[test]
    fn decision_requires_long_ordering() {
        let err = TradeDecision::new(proposal(dec!(201), dec!(206), dec!(202)), Sentiment::Positive, true, 10)
            .unwrap_err();
        assert!(matches!(err, TradeError::InvalidSizing(_)));
    }

    #[test]
    fn decision_requires_positive_quantity() {
        let err = TradeDecision::new(proposal(dec!(201), dec!(206), dec!(198)), Sentiment::Positive, true, 0)
            .unwrap_err();
        assert!(matches!(err, TradeError::InvalidSizing(_)));
    }

    #[test]
    fn record_from_decision_copies_prices() {
        let decision =
            TradeDecision::new(proposal(dec!(201), dec!(206), dec!(198)), Sentiment::Positive, true, 25)
                .unwrap();
        let record = TradeRecord::from_decision(&decision, "220101000000001");
        assert_eq!(record.quantity, 25);
        assert_eq!(record.entry, dec!(201));
        assert_eq!(record.target, dec!(206));
        assert_eq!(record.stop, dec!(198));
        assert_eq!(record.order_id, "220101000000001");
    }

    #[test]
    fn exit_reason_round_trips_through_storage_text() {
        for reason in [ExitReason::TargetReached, ExitReason::StopLossTriggered] {
            assert_eq!(ExitReason::parse(reason.as_str()), Some(reason));
        }
    }
}
