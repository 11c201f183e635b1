//! Scheduler daemon.

use anyhow::Result;
use clap::Args;
use llm_trade_scheduler::TradingScheduler;

use crate::app::App;

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Run the trade job and one monitor cycle immediately, then exit
    #[arg(long)]
    pub once: bool,
}

/// Runs the cron-driven trade and monitor jobs until Ctrl-C.
///
/// # Errors
/// Returns an error if the jobs cannot be built or the scheduler fails to start.
pub async fn run_daemon(app: &App, args: RunArgs) -> Result<()> {
    let scheduler = TradingScheduler::new(app.config.scheduler.clone(), app.jobs().await?);
    if args.once {
        return scheduler.run_once().await;
    }
    scheduler.start().await
}
