use clap::{Parser, Subcommand};

mod app;
mod commands;
mod logging;

use app::App;
use commands::{BacktestArgs, ReportArgs, RunArgs};

#[derive(Parser)]
#[command(name = "llm-trade")]
#[command(about = "LLM-assisted equity trading for NSE stocks", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, global = true, default_value = "config/Config.toml", env = "LLMT_CONFIG")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the decision pipeline once
    Trade,
    /// Run one position monitoring cycle
    Monitor,
    /// Run the scheduler daemon (trade job and monitor job)
    Run(RunArgs),
    /// Write the monthly performance report
    Report(ReportArgs),
    /// Backtest the RSI mean-reversion strategy on daily closes
    Backtest(BacktestArgs),
    /// Train the success predictor from trade history
    Train,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; secrets may come from the environment directly.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = llm_trade_core::ConfigLoader::load_from(&cli.config)?;
    logging::init(&config.logging)?;

    tracing::info!(config = %cli.config, "Configuration loaded");
    let app = App::open(config).await?;

    match cli.command {
        Commands::Trade => commands::run_trade(&app).await?,
        Commands::Monitor => commands::run_monitor(&app).await?,
        Commands::Run(args) => commands::run_daemon(&app, args).await?,
        Commands::Report(args) => commands::run_report(&app, args).await?,
        Commands::Backtest(args) => commands::run_backtest(&app, args).await?,
        Commands::Train => commands::run_train(&app).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn report_month_is_bounded() {
        assert!(Cli::try_parse_from(["llm-trade", "report", "--month", "13"]).is_err());

        let cli = Cli::try_parse_from(["llm-trade", "report", "--month", "3", "--year", "2024"]).unwrap();
        match cli.command {
            Commands::Report(args) => {
                assert_eq!(args.month, Some(3));
                assert_eq!(args.year, Some(2024));
            }
            _ => panic!("expected report"),
        }
    }

    #[test]
    fn backtest_parses_dates() {
        let cli = Cli::try_parse_from([
            "llm-trade",
            "backtest",
            "--symbol",
            "TCS.NS",
            "--from",
            "2023-01-01",
            "--to",
            "2024-01-01",
        ])
        .unwrap();
        match cli.command {
            Commands::Backtest(args) => {
                assert_eq!(args.symbol, "TCS.NS");
                assert_eq!(args.from, chrono::NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());
            }
            _ => panic!("expected backtest"),
        }
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::try_parse_from(["llm-trade", "run", "--once", "--config", "alt.toml"]).unwrap();
        assert_eq!(cli.config, "alt.toml");
        assert!(matches!(cli.command, Commands::Run(RunArgs { once: true })));
    }
}
