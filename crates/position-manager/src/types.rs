//! Types for position monitoring.

use llm_trade_core::{ExitReason, ExitRecord, TradingConfig};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Exit and trailing rules, as fractions of the entry or live price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Target above entry (0.025 = 2.5 %).
    pub target_pct: Decimal,
    /// Stop below entry.
    pub stop_loss_pct: Decimal,
    /// Distance of the trailing trigger below the live price.
    pub trailing_stop_pct: Decimal,
    /// Keep ratcheted stops in the store and use them as the next cycle's stop.
    pub persist_trailing_stop: bool,
}

impl From<&TradingConfig> for MonitorConfig {
    fn from(config: &TradingConfig) -> Self {
        Self {
            target_pct: config.target_pct,
            stop_loss_pct: config.stop_loss_pct,
            trailing_stop_pct: config.trailing_stop_pct,
            persist_trailing_stop: config.persist_trailing_stop,
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self::from(&TradingConfig::default())
    }
}

/// Exit levels derived from the entry price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitLevels {
    pub target: Decimal,
    pub stop: Decimal,
}

/// What to do with one position this cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MonitorAction {
    /// Sell the full quantity at `price`.
    Exit { price: Decimal, reason: ExitReason },
    /// Move the resting order's trigger up to `trigger`.
    RaiseStop { from: Decimal, trigger: Decimal },
    Hold,
}

/// Result for one position in a monitoring cycle.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PositionOutcome {
    Exited(ExitRecord),
    StopRaised {
        symbol: String,
        from: Decimal,
        to: Decimal,
        /// Whether a resting order was actually modified.
        order_modified: bool,
    },
    Held {
        symbol: String,
        live: Decimal,
        stop: Decimal,
    },
    /// No live price this cycle.
    Skipped { symbol: String, reason: String },
    Failed { symbol: String, error: String },
}

/// Everything one monitoring cycle did.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MonitorReport {
    pub outcomes: Vec<PositionOutcome>,
}

impl MonitorReport {
    #[must_use]
    pub fn exits(&self) -> Vec<&ExitRecord> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                PositionOutcome::Exited(exit) => Some(exit),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn failures(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, PositionOutcome::Failed { .. }))
            .count()
    }

    #[must_use]
    pub fn summary(&self) -> String {
        let mut exits = 0;
        let mut raised = 0;
        let mut held = 0;
        let mut skipped = 0;
        for outcome in &self.outcomes {
            match outcome {
                PositionOutcome::Exited(_) => exits += 1,
                PositionOutcome::StopRaised { .. } => raised += 1,
                PositionOutcome::Held { .. } => held += 1,
                PositionOutcome::Skipped { .. } => skipped += 1,
                PositionOutcome::Failed { .. } => {}
            }
        }
        format!(
            "{} positions: {exits} exited, {raised} stops raised, {held} held, {skipped} skipped, {} failed",
            self.outcomes.len(),
            self.failures()
        )
    }
}
