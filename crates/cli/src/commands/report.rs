//! Monthly performance report.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Datelike, Local};
use clap::Args;
use llm_trade_core::TradeStore;
use llm_trade_data::{MonthlyReport, TradeDatabase};
use tracing::info;

use crate::app::App;

#[derive(Args, Debug, Clone)]
pub struct ReportArgs {
    /// Month (1-12), defaults to the current month
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
    pub month: Option<u32>,

    /// Year, defaults to the current year
    #[arg(long)]
    pub year: Option<i32>,

    /// Directory the CSV is written to
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,
}

/// # Errors
/// Returns an error if trades cannot be read or the CSV cannot be written.
pub async fn run_report(app: &App, args: ReportArgs) -> Result<()> {
    let today = Local::now().date_naive();
    let month = args.month.unwrap_or_else(|| today.month());
    let year = args.year.unwrap_or_else(|| today.year());

    match write_report(&app.database, month, year, &args.output_dir).await? {
        Some((report, path)) => {
            println!(
                "{month}/{year}: {} trades, {} winning, {} losing, total PnL {}, win rate {}%",
                report.total_trades, report.winning_trades, report.losing_trades, report.total_pnl, report.win_rate_pct
            );
            println!("Report written to {}", path.display());
        }
        None => println!("No trades found for {month}/{year}"),
    }
    Ok(())
}

async fn write_report(
    database: &TradeDatabase,
    month: u32,
    year: i32,
    dir: &Path,
) -> Result<Option<(MonthlyReport, PathBuf)>> {
    let trades = database.all_trades().await.context("Failed to load trades")?;
    let Some(report) = MonthlyReport::from_trades(month, year, &trades) else {
        info!(month, year, "No trades found for the month");
        return Ok(None);
    };
    let path = report.write_csv(dir)?;
    info!(path = %path.display(), total_trades = report.total_trades, "Monthly report written");
    Ok(Some((report, path)))
}
