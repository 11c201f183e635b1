//! Kite Connect wire types and symbol mapping.

use std::collections::HashMap;

use llm_trade_core::BrokerPosition;
use rust_decimal::Decimal;
use serde::Deserialize;

/// `{"status": "success", "data": ...}` or
/// `{"status": "error", "error_type": ..., "message": ...}`.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub status: String,
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OrderAck {
    pub order_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Positions {
    #[serde(default)]
    pub day: Vec<RawPosition>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawPosition {
    pub tradingsymbol: String,
    pub quantity: i64,
    pub average_price: Decimal,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Ltp {
    pub last_price: Decimal,
}

pub(crate) type LtpMap = HashMap<String, Ltp>;

/// Maps between the pipeline's symbols (`RELIANCE.NS`) and Kite trading
/// symbols (`RELIANCE`).
#[derive(Debug, Clone)]
pub struct SymbolMap {
    exchange: String,
    suffix: String,
}

impl SymbolMap {
    pub fn new(exchange: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            exchange: exchange.into(),
            suffix: suffix.into(),
        }
    }

    pub fn exchange(&self) -> &str {
        &self.exchange
    }

    pub fn to_trading_symbol<'a>(&self, symbol: &'a str) -> &'a str {
        if self.suffix.is_empty() {
            return symbol;
        }
        symbol.strip_suffix(self.suffix.as_str()).unwrap_or(symbol)
    }

    pub fn from_trading_symbol(&self, trading_symbol: &str) -> String {
        format!("{trading_symbol}{}", self.suffix)
    }

    /// `NSE:RELIANCE`, the instrument key used by quote endpoints.
    pub fn instrument(&self, symbol: &str) -> String {
        format!("{}:{}", self.exchange, self.to_trading_symbol(symbol))
    }

    pub(crate) fn position(&self, raw: RawPosition) -> BrokerPosition {
        BrokerPosition {
            symbol: self.from_trading_symbol(&raw.tradingsymbol),
            quantity: raw.quantity,
            average_price: raw.average_price,
            order_id: None,
        }
    }
}
