//! Trains the success predictor and reports hold-out accuracy.

use anyhow::Result;

use crate::app::App;

/// # Errors
/// Returns an error if the trade history cannot be read or fitting fails.
pub async fn run_train(app: &App) -> Result<()> {
    let report = app.jobs().await?.train().await?;

    match report.accuracy {
        Some(accuracy) => println!(
            "Trained on {} trades ({} held out), accuracy {:.2}%",
            report.samples,
            report.test_samples,
            accuracy * 100.0
        ),
        None if report.samples == 0 => println!("No trade history yet, predictor left untrained"),
        None => println!("Trained on {} trades, too few to hold any out", report.samples),
    }
    Ok(())
}
