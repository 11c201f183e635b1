//! Row types for the SQLite trade store.
//!
//! Prices are persisted as decimal text; these rows convert back into the
//! core domain records.

use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use llm_trade_core::{ExitReason, ExitRecord, TradeRecord};
use rust_decimal::Decimal;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TradeRow {
    pub id: i64,
    pub symbol: String,
    pub quantity: i64,
    pub entry_price: String,
    pub target_price: String,
    pub stop_loss: String,
    pub order_id: String,
    pub timestamp: DateTime<Utc>,
}

impl TradeRow {
    /// # Errors
    /// Returns an error if a stored price or quantity is malformed.
    pub fn into_record(self) -> Result<TradeRecord> {
        Ok(TradeRecord {
            quantity: u32::try_from(self.quantity)
                .with_context(|| format!("trade {} has invalid quantity {}", self.id, self.quantity))?,
            entry: parse_price(&self.entry_price, self.id)?,
            target: parse_price(&self.target_price, self.id)?,
            stop: parse_price(&self.stop_loss, self.id)?,
            symbol: self.symbol,
            order_id: self.order_id,
            executed_at: self.timestamp,
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ExitRow {
    pub id: i64,
    pub symbol: String,
    pub quantity: i64,
    pub price: String,
    pub reason: String,
    pub order_id: String,
    pub entry_order_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ExitRow {
    /// # Errors
    /// Returns an error if the stored price, quantity or reason is malformed.
    pub fn into_record(self) -> Result<ExitRecord> {
        let reason = ExitReason::parse(&self.reason)
            .ok_or_else(|| anyhow!("exit {} has unknown reason {:?}", self.id, self.reason))?;
        Ok(ExitRecord {
            quantity: u32::try_from(self.quantity)
                .with_context(|| format!("exit {} has invalid quantity {}", self.id, self.quantity))?,
            price: parse_price(&self.price, self.id)?,
            reason,
            symbol: self.symbol,
            order_id: self.order_id,
            entry_order_id: self.entry_order_id,
            exited_at: self.timestamp,
        })
    }
}

/// One row of the log table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LogRow {
    pub id: i64,
    pub level: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

fn parse_price(raw: &str, row_id: i64) -> Result<Decimal> {
    Decimal::from_str(raw).with_context(|| format!("row {row_id} has invalid price {raw:?}"))
}
