//! Monthly performance report.
//!
//! PnL per trade is the planned outcome, `(target − entry) × quantity`.

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Datelike;
use csv::Writer;
use llm_trade_core::TradeRecord;
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyReport {
    #[serde(skip)]
    pub month: u32,
    #[serde(skip)]
    pub year: i32,
    #[serde(rename = "Total Trades")]
    pub total_trades: usize,
    #[serde(rename = "Winning Trades")]
    pub winning_trades: usize,
    #[serde(rename = "Losing Trades")]
    pub losing_trades: usize,
    #[serde(rename = "Total PnL")]
    pub total_pnl: Decimal,
    #[serde(rename = "Average PnL")]
    pub average_pnl: Decimal,
    #[serde(rename = "Win Rate (%)")]
    pub win_rate_pct: Decimal,
}

impl MonthlyReport {
    /// Builds the report for trades executed in `month`/`year`.
    ///
    /// Returns `None` when no trade falls in that month.
    #[must_use]
    pub fn from_trades(month: u32, year: i32, trades: &[TradeRecord]) -> Option<Self> {
        let pnls: Vec<Decimal> = trades
            .iter()
            .filter(|t| t.executed_at.month() == month && t.executed_at.year() == year)
            .map(planned_pnl)
            .collect();

        if pnls.is_empty() {
            return None;
        }

        let total_trades = pnls.len();
        let winning_trades = pnls.iter().filter(|p| **p > Decimal::ZERO).count();
        let losing_trades = pnls.iter().filter(|p| **p < Decimal::ZERO).count();
        let total_pnl: Decimal = pnls.iter().sum();
        let count = Decimal::from(total_trades);

        Some(Self {
            month,
            year,
            total_trades,
            winning_trades,
            losing_trades,
            total_pnl: two_places(total_pnl),
            average_pnl: two_places(total_pnl / count),
            win_rate_pct: two_places(Decimal::from(winning_trades) * Decimal::ONE_HUNDRED / count),
        })
    }

    /// Default file name, `monthly_report_<m>_<y>.csv`.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("monthly_report_{}_{}.csv", self.month, self.year)
    }

    /// Writes the report as a one-row CSV into `dir` and returns the path.
    ///
    /// # Errors
    /// Returns error if the file cannot be created or written.
    pub fn write_csv(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(self.file_name());
        let file = File::create(&path)
            .with_context(|| format!("Failed to create report file: {}", path.display()))?;
        let mut writer = Writer::from_writer(file);
        writer.serialize(self)?;
        writer.flush()?;
        Ok(path)
    }
}

fn two_places(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp(2);
    rounded.rescale(2);
    rounded
}

fn planned_pnl(trade: &TradeRecord) -> Decimal {
    (trade.target - trade.entry) * Decimal::from(trade.quantity)
}
