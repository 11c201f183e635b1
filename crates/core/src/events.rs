use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::types::{ExitRecord, ExitReason, TradeRecord};

/// Emitted once an entry order is accepted and recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeExecutedEvent {
    pub symbol: String,
    pub quantity: u32,
    pub entry_price: Decimal,
    pub target_price: Decimal,
    pub stop_loss: Decimal,
    pub order_id: String,
    pub timestamp: DateTime<Utc>,
}

impl From<&TradeRecord> for TradeExecutedEvent {
    fn from(trade: &TradeRecord) -> Self {
        Self {
            symbol: trade.symbol.clone(),
            quantity: trade.quantity,
            entry_price: trade.entry,
            target_price: trade.target,
            stop_loss: trade.stop,
            order_id: trade.order_id.clone(),
            timestamp: trade.executed_at,
        }
    }
}

/// Emitted once an exit order is accepted and recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionExitedEvent {
    pub symbol: String,
    pub quantity: u32,
    pub price: Decimal,
    pub reason: ExitReason,
    pub order_id: String,
    pub timestamp: DateTime<Utc>,
}

impl From<&ExitRecord> for PositionExitedEvent {
    fn from(exit: &ExitRecord) -> Self {
        Self {
            symbol: exit.symbol.clone(),
            quantity: exit.quantity,
            price: exit.price,
            reason: exit.reason,
            order_id: exit.order_id.clone(),
            timestamp: exit.exited_at,
        }
    }
}

impl TradeExecutedEvent {
    /// Logs the event under the `trade_events` target and returns the
    /// message stored alongside it in the log table.
    pub fn emit(&self) -> String {
        let payload = serde_json::to_string(self).unwrap_or_else(|_| format!("{self:?}"));
        info!(
            target: "trade_events",
            symbol = %self.symbol,
            quantity = self.quantity,
            entry = %self.entry_price,
            target_price = %self.target_price,
            stop = %self.stop_loss,
            order_id = %self.order_id,
            "Trade executed"
        );
        format!("Trade Executed: {payload}")
    }
}

impl PositionExitedEvent {
    pub fn emit(&self) -> String {
        let payload = serde_json::to_string(self).unwrap_or_else(|_| format!("{self:?}"));
        info!(
            target: "trade_events",
            symbol = %self.symbol,
            quantity = self.quantity,
            price = %self.price,
            reason = %self.reason,
            order_id = %self.order_id,
            "Position exited"
        );
        format!("Position Exited: {payload}")
    }
}
