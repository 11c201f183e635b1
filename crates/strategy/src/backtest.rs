//! RSI mean-reversion backtest over daily closes.
//!
//! Buys with all available cash when RSI drops below the oversold level and
//! the book is flat; sells the whole holding when RSI rises above the
//! overbought level. Any holding left at the end is marked to the last close.

use chrono::NaiveDate;
use llm_trade_core::{MarketDataSource, PriceBar};
use llm_trade_signals::indicators::rsi_series;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone)]
pub struct RsiBacktest {
    pub rsi_period: usize,
    pub oversold: f64,
    pub overbought: f64,
    pub starting_cash: Decimal,
}

impl Default for RsiBacktest {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            oversold: 30.0,
            overbought: 70.0,
            starting_cash: dec!(5000),
        }
    }
}

/// One completed buy/sell pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundTrip {
    pub bought_on: NaiveDate,
    pub buy_price: Decimal,
    pub sold_on: NaiveDate,
    pub sell_price: Decimal,
    pub shares: u64,
}

impl RoundTrip {
    #[must_use]
    pub fn pnl(&self) -> Decimal {
        (self.sell_price - self.buy_price) * Decimal::from(self.shares)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BacktestReport {
    pub symbol: String,
    pub bars: usize,
    pub starting_cash: Decimal,
    pub final_value: Decimal,
    /// (final − start) / start.
    pub total_return: Decimal,
    pub max_drawdown: Decimal,
    pub round_trips: Vec<RoundTrip>,
    /// Shares still held after the last bar.
    pub open_shares: u64,
}

impl BacktestReport {
    #[must_use]
    pub fn win_rate(&self) -> Option<f64> {
        if self.round_trips.is_empty() {
            return None;
        }
        let wins = self.round_trips.iter().filter(|t| t.pnl() > Decimal::ZERO).count();
        #[allow(clippy::cast_precision_loss)]
        Some(wins as f64 / self.round_trips.len() as f64)
    }
}

struct Holding {
    shares: u64,
    price: Decimal,
    date: NaiveDate,
}

impl RsiBacktest {
    /// Replays the bars in order.
    pub fn run(&self, symbol: &str, bars: &[PriceBar]) -> BacktestReport {
        let closes: Vec<f64> = bars.iter().map(|b| b.close.to_f64().unwrap_or(0.0)).collect();
        let rsi = rsi_series(&closes, self.rsi_period);

        let mut cash = self.starting_cash;
        let mut holding: Option<Holding> = None;
        let mut round_trips = Vec::new();
        let mut peak = self.starting_cash;
        let mut max_drawdown = Decimal::ZERO;

        for (bar, rsi) in bars.iter().zip(rsi) {
            if let Some(rsi) = rsi {
                match holding.take() {
                    None if rsi < self.oversold && bar.close > Decimal::ZERO => {
                        let shares = (cash / bar.close).floor().to_u64().unwrap_or(0);
                        if shares > 0 {
                            cash -= bar.close * Decimal::from(shares);
                            holding = Some(Holding {
                                shares,
                                price: bar.close,
                                date: bar.date,
                            });
                        }
                    }
                    Some(h) if rsi > self.overbought => {
                        cash += bar.close * Decimal::from(h.shares);
                        round_trips.push(RoundTrip {
                            bought_on: h.date,
                            buy_price: h.price,
                            sold_on: bar.date,
                            sell_price: bar.close,
                            shares: h.shares,
                        });
                    }
                    other => holding = other,
                }
            }

            let equity = cash + holding.as_ref().map_or(Decimal::ZERO, |h| bar.close * Decimal::from(h.shares));
            if equity > peak {
                peak = equity;
            }
            if peak > Decimal::ZERO {
                max_drawdown = max_drawdown.max((peak - equity) / peak);
            }
        }

        let open_shares = holding.as_ref().map_or(0, |h| h.shares);
        let last_close = bars.last().map_or(Decimal::ZERO, |b| b.close);
        let final_value = cash + last_close * Decimal::from(open_shares);
        let total_return = if self.starting_cash.is_zero() {
            Decimal::ZERO
        } else {
            (final_value - self.starting_cash) / self.starting_cash
        };

        BacktestReport {
            symbol: symbol.to_string(),
            bars: bars.len(),
            starting_cash: self.starting_cash,
            final_value,
            total_return,
            max_drawdown,
            round_trips,
            open_shares,
        }
    }

    /// Fetches daily closes for the range and replays them.
    ///
    /// # Errors
    /// Returns error if the price history cannot be fetched.
    pub async fn run_for(
        &self,
        source: &dyn MarketDataSource,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> llm_trade_core::Result<BacktestReport> {
        info!(symbol = %symbol, %from, %to, "Starting backtest");
        let bars = source.daily_closes(symbol, from, to).await?;
        let report = self.run(symbol, &bars);
        info!(
            symbol = %symbol,
            bars = report.bars,
            round_trips = report.round_trips.len(),
            final_value = %report.final_value,
            "Backtest completed"
        );
        Ok(report)
    }
}
