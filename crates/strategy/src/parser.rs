//! Extraction of a trade proposal from free-form model output.
//!
//! The expected shape is `Buy RELIANCE.NS at 201, target 206, SL 198`. Each
//! field is matched independently and case-insensitively; the first match of
//! each wins and all four are required.

use std::str::FromStr;
use std::sync::LazyLock;

use llm_trade_core::TradeProposal;
use regex::Regex;
use rust_decimal::Decimal;
use tracing::debug;

static SYMBOL: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)Buy\s+([A-Z.]+)"));
static ENTRY: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)at\s+(\d+\.?\d*)"));
static TARGET: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)target\s+(\d+\.?\d*)"));
static STOP: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)SL\s+(\d+\.?\d*)"));

#[allow(clippy::expect_used)]
fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static proposal pattern is valid")
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TradeProposalParser;

impl TradeProposalParser {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Returns `None` unless symbol, entry, target and stop are all present.
    pub fn parse(&self, text: &str) -> Option<TradeProposal> {
        let symbol = capture(&SYMBOL, text)?.to_uppercase();
        let entry = number(&ENTRY, text)?;
        let target = number(&TARGET, text)?;
        let stop = number(&STOP, text)?;

        let proposal = TradeProposal {
            symbol,
            entry,
            target,
            stop,
        };
        debug!(?proposal, "Parsed trade proposal");
        Some(proposal)
    }
}

fn capture<'t>(re: &Regex, text: &'t str) -> Option<&'t str> {
    re.captures(text).and_then(|c| c.get(1)).map(|m| m.as_str())
}

fn number(re: &Regex, text: &str) -> Option<Decimal> {
    let raw = capture(re, text)?;
    // "201." is a valid match; Decimal wants the trailing dot gone.
    Decimal::from_str(raw.trim_end_matches('.')).ok()
}
