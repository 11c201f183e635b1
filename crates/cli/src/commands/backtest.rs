//! RSI mean-reversion backtest over daily closes.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Args;
use llm_trade_strategy::RsiBacktest;

use crate::app::App;

#[derive(Args, Debug, Clone)]
pub struct BacktestArgs {
    /// Symbol to replay (e.g., "RELIANCE.NS")
    #[arg(long)]
    pub symbol: String,

    /// First day, YYYY-MM-DD
    #[arg(long)]
    pub from: NaiveDate,

    /// Last day, YYYY-MM-DD
    #[arg(long)]
    pub to: NaiveDate,

    /// Print the full report as JSON
    #[arg(long)]
    pub json: bool,
}

/// # Errors
/// Returns an error if the date range is empty or prices cannot be fetched.
pub async fn run_backtest(app: &App, args: BacktestArgs) -> Result<()> {
    anyhow::ensure!(args.from < args.to, "--from must be before --to");

    let backtest = RsiBacktest {
        rsi_period: app.config.market_data.rsi_period,
        starting_cash: app.config.trading.capital,
        ..RsiBacktest::default()
    };
    let report = backtest
        .run_for(app.market_data.as_ref(), &args.symbol, args.from, args.to)
        .await
        .with_context(|| format!("Backtest failed for {}", args.symbol))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Starting Portfolio Value: {:.2}", report.starting_cash);
    println!("Final Portfolio Value: {:.2}", report.final_value);
    println!(
        "{} bars, {} round trips, return {:.2}%, max drawdown {:.2}%",
        report.bars,
        report.round_trips.len(),
        report.total_return * rust_decimal::Decimal::ONE_HUNDRED,
        report.max_drawdown * rust_decimal::Decimal::ONE_HUNDRED
    );
    if let Some(win_rate) = report.win_rate() {
        println!("Win rate {:.1}%", win_rate * 100.0);
    }
    Ok(())
}
