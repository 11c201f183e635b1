//! Paper trading brokerage.
//!
//! Fills limit orders immediately at their limit price and keeps positions
//! in memory. Last prices come from the market data source. A fresh process
//! restores its book from the trades that have no recorded exit.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use llm_trade_core::{BrokerPosition, Brokerage, MarketDataSource, OrderSide, TradeRecord};
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::KiteError;

#[derive(Debug, Clone)]
struct PaperPosition {
    quantity: u32,
    average_price: Decimal,
    /// Entry order, the one trailing stops are attached to.
    order_id: String,
    trigger_price: Option<Decimal>,
}

#[derive(Debug, Default)]
struct PaperBook {
    positions: HashMap<String, PaperPosition>,
}

pub struct PaperBroker {
    prices: Arc<dyn MarketDataSource>,
    book: Mutex<PaperBook>,
    sequence: AtomicU64,
}

impl PaperBroker {
    pub fn new(prices: Arc<dyn MarketDataSource>) -> Self {
        Self {
            prices,
            book: Mutex::new(PaperBook::default()),
            sequence: AtomicU64::new(0),
        }
    }

    /// Seeds the book with still-open trades, oldest first.
    pub async fn restore(&self, open_trades: &[TradeRecord]) {
        let mut book = self.book.lock().await;
        for trade in open_trades {
            book.buy(&trade.symbol, trade.quantity, trade.entry, &trade.order_id);
        }
        info!(positions = book.positions.len(), "Paper book restored");
    }

    fn next_order_id(&self) -> String {
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        format!("PAPER-{}-{seq}", Utc::now().timestamp_millis())
    }

    /// Trigger price last set on a position's entry order.
    pub async fn trigger_price(&self, symbol: &str) -> Option<Decimal> {
        self.book
            .lock()
            .await
            .positions
            .get(symbol)
            .and_then(|p| p.trigger_price)
    }
}

impl PaperBook {
    fn buy(&mut self, symbol: &str, quantity: u32, price: Decimal, order_id: &str) {
        self.positions
            .entry(symbol.to_string())
            .and_modify(|p| {
                let held = Decimal::from(p.quantity);
                let added = Decimal::from(quantity);
                p.average_price = (p.average_price * held + price * added) / (held + added);
                p.quantity += quantity;
            })
            .or_insert_with(|| PaperPosition {
                quantity,
                average_price: price,
                order_id: order_id.to_string(),
                trigger_price: None,
            });
    }

    fn sell(&mut self, symbol: &str, quantity: u32) -> Result<(), KiteError> {
        let Some(position) = self.positions.get_mut(symbol) else {
            return Err(KiteError::PaperRejected(format!("no position in {symbol}")));
        };
        if position.quantity < quantity {
            return Err(KiteError::PaperRejected(format!(
                "cannot sell {quantity} {symbol}, holding {}",
                position.quantity
            )));
        }
        position.quantity -= quantity;
        if position.quantity == 0 {
            self.positions.remove(symbol);
        }
        Ok(())
    }
}

#[async_trait]
impl Brokerage for PaperBroker {
    async fn place_order(
        &self,
        symbol: &str,
        quantity: u32,
        price: Decimal,
        side: OrderSide,
    ) -> llm_trade_core::Result<String> {
        if quantity == 0 || price <= Decimal::ZERO {
            return Err(KiteError::PaperRejected(format!("invalid order {quantity} @ {price}")).into_submission());
        }

        let order_id = self.next_order_id();
        let mut book = self.book.lock().await;
        match side {
            OrderSide::Buy => book.buy(symbol, quantity, price, &order_id),
            OrderSide::Sell => book.sell(symbol, quantity).map_err(KiteError::into_submission)?,
        }

        info!(
            order_id = %order_id,
            symbol = %symbol,
            side = side.as_str(),
            quantity,
            price = %price,
            "Paper fill simulated"
        );
        Ok(order_id)
    }

    async fn open_positions(&self) -> llm_trade_core::Result<Vec<BrokerPosition>> {
        let book = self.book.lock().await;
        let mut positions: Vec<BrokerPosition> = book
            .positions
            .iter()
            .map(|(symbol, p)| BrokerPosition {
                symbol: symbol.clone(),
                quantity: i64::from(p.quantity),
                average_price: p.average_price,
                order_id: Some(p.order_id.clone()),
            })
            .collect();
        positions.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        Ok(positions)
    }

    async fn modify_order(&self, order_id: &str, trigger_price: Decimal) -> llm_trade_core::Result<()> {
        let mut book = self.book.lock().await;
        let position = book
            .positions
            .values_mut()
            .find(|p| p.order_id == order_id)
            .ok_or_else(|| KiteError::PaperRejected(format!("unknown order {order_id}")).into_submission())?;
        position.trigger_price = Some(trigger_price);
        debug!(order_id = %order_id, trigger_price = %trigger_price, "Paper trigger updated");
        Ok(())
    }

    async fn last_price(&self, symbol: &str) -> llm_trade_core::Result<Option<Decimal>> {
        Ok(self.prices.fetch(symbol).await?.map(|candidate| candidate.close))
    }
}
