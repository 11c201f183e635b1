//! One decision pipeline run.

use anyhow::Result;

use crate::app::App;

/// Trains the predictor from history, then runs the pipeline once.
///
/// # Errors
/// Returns an error if the collaborators cannot be built.
pub async fn run_trade(app: &App) -> Result<()> {
    let jobs = app.jobs().await?;
    let outcome = jobs.trade().await;
    println!("{outcome}");
    Ok(())
}
