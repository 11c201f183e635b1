//! Position monitoring cycle.
//!
//! Each cycle reads open positions fresh from the brokerage and handles each
//! one independently: sell at target, sell at stop, or ratchet the trailing
//! stop. A failure on one position never stops the others.

use std::sync::Arc;

use chrono::Utc;
use llm_trade_core::{
    BrokerPosition, Brokerage, ExitRecord, LogLevel, OpenPosition, OrderSide, PositionExitedEvent, TradeError,
    TradeStore,
};
use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};

use crate::stops::check_stop_loss;
use crate::targets::{check_target, exit_levels};
use crate::trailing::{check_trailing, effective_stop};
use crate::types::{MonitorAction, MonitorConfig, MonitorReport, PositionOutcome};

/// Mirrors a brokerage position locally with its exit bounds.
pub fn mirror(
    position: &BrokerPosition,
    quantity: u32,
    order_id: Option<String>,
    config: &MonitorConfig,
) -> OpenPosition {
    let levels = exit_levels(position.average_price, config);
    OpenPosition {
        symbol: position.symbol.clone(),
        quantity,
        entry: position.average_price,
        target: levels.target,
        stop: levels.stop,
        order_id,
    }
}

/// Decides what to do with a position given the live price and any
/// previously ratcheted stop.
pub fn evaluate(
    position: &OpenPosition,
    live: Decimal,
    ratcheted: Option<Decimal>,
    trailing_stop_pct: Decimal,
) -> MonitorAction {
    let stop = effective_stop(position.stop, ratcheted);

    check_target(&position.symbol, live, position.target)
        .or_else(|| check_stop_loss(&position.symbol, live, stop))
        .or_else(|| check_trailing(live, stop, trailing_stop_pct))
        .unwrap_or(MonitorAction::Hold)
}

pub struct PositionMonitor {
    broker: Arc<dyn Brokerage>,
    store: Arc<dyn TradeStore>,
    config: MonitorConfig,
}

impl PositionMonitor {
    pub fn new(broker: Arc<dyn Brokerage>, store: Arc<dyn TradeStore>, config: MonitorConfig) -> Self {
        Self { broker, store, config }
    }

    /// Runs one monitoring cycle.
    ///
    /// # Errors
    /// Returns error only if the open positions cannot be fetched.
    pub async fn run_cycle(&self) -> llm_trade_core::Result<MonitorReport> {
        let positions = match self.broker.open_positions().await {
            Ok(positions) => positions,
            Err(e) => {
                self.log(LogLevel::Error, &format!("Could not fetch open positions: {e}")).await;
                return Err(e);
            }
        };

        let mut report = MonitorReport::default();
        if positions.is_empty() {
            info!("No open trades to manage");
            self.log(LogLevel::Info, "No open trades to manage.").await;
            return Ok(report);
        }

        for position in positions {
            let symbol = position.symbol.clone();
            let outcome = match self.manage(&position).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(symbol = %symbol, error = %e, "Position management failed");
                    self.log(LogLevel::Error, &format!("Error managing {symbol}: {e}")).await;
                    PositionOutcome::Failed {
                        symbol,
                        error: e.to_string(),
                    }
                }
            };
            report.outcomes.push(outcome);
        }

        info!(summary = %report.summary(), "Monitoring cycle complete");
        Ok(report)
    }

    async fn manage(&self, position: &BrokerPosition) -> llm_trade_core::Result<PositionOutcome> {
        let symbol = position.symbol.as_str();
        let quantity = u32::try_from(position.quantity).map_err(|_| {
            TradeError::DataUnavailable(format!("{symbol}: unsupported position quantity {}", position.quantity))
        })?;

        let live = match self.broker.last_price(symbol).await {
            Ok(Some(live)) => live,
            Ok(None) => return Ok(self.skip(symbol, "no quote available".to_string()).await),
            Err(e) => return Ok(self.skip(symbol, e.to_string()).await),
        };

        let open = mirror(position, quantity, self.entry_order_id(position).await?, &self.config);
        let ratcheted = match &open.order_id {
            Some(entry) if self.config.persist_trailing_stop => self.store.trailing_stop(entry).await?,
            _ => None,
        };

        match evaluate(&open, live, ratcheted, self.config.trailing_stop_pct) {
            MonitorAction::Exit { price, reason } => {
                let order_id = self.broker.place_order(symbol, quantity, price, OrderSide::Sell).await?;
                let exit = ExitRecord {
                    symbol: symbol.to_string(),
                    quantity,
                    price,
                    reason,
                    order_id,
                    entry_order_id: open.order_id.clone(),
                    exited_at: Utc::now(),
                };
                // Sell is placed: drop the stop even if the exit insert fails.
                let recorded = self.store.insert_exit(&exit).await;
                if let Some(entry) = &open.order_id {
                    self.store.clear_trailing_stop(entry).await?;
                }
                recorded?;

                let event = PositionExitedEvent::from(&exit).emit();
                self.log(LogLevel::Info, &format!("{reason} for {symbol}, sold {quantity} at ₹{price}")).await;
                self.log(LogLevel::Info, &event).await;
                Ok(PositionOutcome::Exited(exit))
            }
            MonitorAction::RaiseStop { from, trigger } => {
                let order_modified = match &open.order_id {
                    Some(order_id) => {
                        if let Err(e) = self.broker.modify_order(order_id, trigger).await {
                            self.log(
                                LogLevel::Error,
                                &format!("Error updating trailing stop-loss for {symbol}: {e}"),
                            )
                            .await;
                            return Err(e);
                        }
                        true
                    }
                    None => {
                        warn!(symbol, "No entry order for position, trailing stop lasts this cycle only");
                        false
                    }
                };

                if let Some(entry) = open.order_id.as_deref().filter(|_| self.config.persist_trailing_stop) {
                    self.store.save_trailing_stop(entry, symbol, trigger).await?;
                }

                info!(symbol, from = %from, to = %trigger, order_modified, "Trailing stop raised");
                self.log(LogLevel::Info, &format!("Trailing stop-loss updated for {symbol} to ₹{trigger}"))
                    .await;
                Ok(PositionOutcome::StopRaised {
                    symbol: symbol.to_string(),
                    from,
                    to: trigger,
                    order_modified,
                })
            }
            MonitorAction::Hold => {
                let stop = effective_stop(open.stop, ratcheted);
                debug!(symbol, live = %live, stop = %stop, "Holding");
                Ok(PositionOutcome::Held {
                    symbol: symbol.to_string(),
                    live,
                    stop,
                })
            }
        }
    }

    /// The broker's order id for the position, falling back to the latest
    /// recorded entry for the symbol.
    async fn entry_order_id(&self, position: &BrokerPosition) -> llm_trade_core::Result<Option<String>> {
        if let Some(order_id) = &position.order_id {
            return Ok(Some(order_id.clone()));
        }
        Ok(self
            .store
            .latest_trade(&position.symbol)
            .await?
            .map(|trade| trade.order_id))
    }

    async fn skip(&self, symbol: &str, reason: String) -> PositionOutcome {
        warn!(symbol, reason = %reason, "Skipping position this cycle");
        self.log(LogLevel::Warning, &format!("Error fetching current price for {symbol}: {reason}"))
            .await;
        PositionOutcome::Skipped {
            symbol: symbol.to_string(),
            reason,
        }
    }

    async fn log(&self, level: LogLevel, message: &str) {
        if let Err(e) = self.store.log(level, message).await {
            warn!(error = %e, "Failed to append to the log table");
        }
    }
}
