//! Persistence for the trading pipeline.
//!
//! This crate provides:
//! - `SQLite` trade store implementing [`llm_trade_core::TradeStore`]
//! - Row types for trades, exits and log lines
//! - Monthly CSV performance reports

pub mod database;
pub mod reporting;
pub mod rows;

pub use database::TradeDatabase;
pub use reporting::MonthlyReport;
pub use rows::{ExitRow, LogRow, TradeRow};
