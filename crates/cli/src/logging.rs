//! Tracing setup: human-readable stderr plus an optional JSON log file.

use std::fs::OpenOptions;
use std::sync::Mutex;

use anyhow::{Context, Result};
use llm_trade_core::LoggingConfig;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Installs the global subscriber. `RUST_LOG` overrides the default `info`.
///
/// # Errors
/// Returns error if the JSON log file cannot be opened or a subscriber is
/// already installed.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json = if config.json_file.is_empty() {
        None
    } else {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.json_file)
            .with_context(|| format!("Failed to open log file: {}", config.json_file))?;
        Some(fmt::layer().json().with_writer(Mutex::new(file)))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(json)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}
