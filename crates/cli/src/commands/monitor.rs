//! One position monitoring cycle.

use anyhow::Result;

use crate::app::App;

/// # Errors
/// Returns an error if positions cannot be fetched from the brokerage.
pub async fn run_monitor(app: &App) -> Result<()> {
    let jobs = app.jobs().await?;
    let report = jobs.monitor().await?;

    for exit in report.exits() {
        println!(
            "Sold {} {} at {} ({}), order {}",
            exit.quantity, exit.symbol, exit.price, exit.reason, exit.order_id
        );
    }
    println!("{}", report.summary());
    Ok(())
}
