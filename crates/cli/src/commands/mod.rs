//! CLI commands for the trading pipeline.

pub mod backtest;
pub mod monitor;
pub mod report;
pub mod run;
pub mod trade;
pub mod train;

pub use backtest::{run_backtest, BacktestArgs};
pub use monitor::run_monitor;
pub use report::{run_report, ReportArgs};
pub use run::{run_daemon, RunArgs};
pub use trade::run_trade;
pub use train::run_train;
