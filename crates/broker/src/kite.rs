//! Kite Connect REST brokerage.
//!
//! Places day limit orders, lists day positions, moves trigger prices and
//! reads last traded prices. One request per call, no retries.

use std::time::Duration;

use async_trait::async_trait;
use llm_trade_core::{BrokerConfig, BrokerPosition, Brokerage, OrderSide};
use reqwest::{Client, RequestBuilder};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::error::{KiteError, Result};
use crate::types::{Envelope, LtpMap, OrderAck, Positions, SymbolMap};

const KITE_VERSION: &str = "3";

pub struct KiteClient {
    http: Client,
    base_url: String,
    authorization: String,
    product: String,
    symbols: SymbolMap,
}

impl std::fmt::Debug for KiteClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KiteClient")
            .field("base_url", &self.base_url)
            .field("product", &self.product)
            .field("symbols", &self.symbols)
            .finish_non_exhaustive()
    }
}

impl KiteClient {
    /// # Errors
    /// Returns error if credentials are missing or the HTTP client cannot be built.
    pub fn new(config: &BrokerConfig) -> Result<Self> {
        if config.api_key.is_empty() || config.access_token.is_empty() {
            return Err(KiteError::Authentication(
                "broker.api_key and broker.access_token are required in kite mode".to_string(),
            ));
        }
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            authorization: format!("token {}:{}", config.api_key, config.access_token),
            product: config.product.clone(),
            symbols: SymbolMap::new(config.exchange.clone(), config.symbol_suffix.clone()),
        })
    }

    /// Sets a custom base URL (useful for testing).
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("X-Kite-Version", KITE_VERSION)
            .header("Authorization", &self.authorization)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self.authed(request).send().await?;
        let status = response.status();

        if status.as_u16() == 429 {
            let retry_after_secs = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(1);
            return Err(KiteError::RateLimit { retry_after_secs });
        }

        let text = response.text().await?;
        let envelope: Envelope<T> = serde_json::from_str(&text).map_err(|e| {
            if status.is_success() {
                KiteError::Parse(format!("{e}: {text}"))
            } else {
                KiteError::api(status.as_u16(), "HTTPError", text.clone())
            }
        })?;

        if status.is_success() && envelope.status == "success" {
            return envelope
                .data
                .ok_or_else(|| KiteError::Parse("success response without data".to_string()));
        }

        let error_type = envelope.error_type.unwrap_or_else(|| "GeneralException".to_string());
        let message = envelope.message.unwrap_or_default();
        if error_type == "TokenException" || status.as_u16() == 403 {
            return Err(KiteError::Authentication(message));
        }
        Err(KiteError::api(status.as_u16(), error_type, message))
    }

    /// Places a regular day limit order and returns Kite's order id.
    ///
    /// # Errors
    /// Returns error if Kite rejects the order or the request fails.
    pub async fn place_limit_order(
        &self,
        symbol: &str,
        quantity: u32,
        price: Decimal,
        side: OrderSide,
    ) -> Result<String> {
        let form = [
            ("tradingsymbol", self.symbols.to_trading_symbol(symbol).to_string()),
            ("exchange", self.symbols.exchange().to_string()),
            ("transaction_type", side.as_str().to_string()),
            ("order_type", "LIMIT".to_string()),
            ("quantity", quantity.to_string()),
            ("product", self.product.clone()),
            ("price", price.to_string()),
            ("validity", "DAY".to_string()),
        ];
        let request = self
            .http
            .post(format!("{}/orders/regular", self.base_url))
            .form(&form);
        let ack: OrderAck = self.send(request).await?;

        info!(
            symbol = %symbol,
            side = side.as_str(),
            quantity,
            price = %price,
            order_id = %ack.order_id,
            "Kite order placed"
        );
        Ok(ack.order_id)
    }

    /// Day positions, including flat ones.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn day_positions(&self) -> Result<Vec<BrokerPosition>> {
        let request = self.http.get(format!("{}/portfolio/positions", self.base_url));
        let positions: Positions = self.send(request).await?;
        debug!(count = positions.day.len(), "Fetched Kite day positions");
        Ok(positions.day.into_iter().map(|raw| self.symbols.position(raw)).collect())
    }

    /// # Errors
    /// Returns error if Kite rejects the modification or the request fails.
    pub async fn set_trigger_price(&self, order_id: &str, trigger_price: Decimal) -> Result<()> {
        let form = [
            ("trigger_price", trigger_price.to_string()),
            ("validity", "DAY".to_string()),
        ];
        let request = self
            .http
            .put(format!("{}/orders/regular/{order_id}", self.base_url))
            .form(&form);
        let _: OrderAck = self.send(request).await?;
        info!(order_id = %order_id, trigger_price = %trigger_price, "Kite trigger price updated");
        Ok(())
    }

    /// # Errors
    /// Returns error if the request fails.
    pub async fn ltp(&self, symbol: &str) -> Result<Option<Decimal>> {
        let instrument = self.symbols.instrument(symbol);
        let request = self
            .http
            .get(format!("{}/quote/ltp", self.base_url))
            .query(&[("i", instrument.as_str())]);
        let quotes: LtpMap = self.send(request).await?;
        Ok(quotes.get(&instrument).map(|q| q.last_price))
    }
}

#[async_trait]
impl Brokerage for KiteClient {
    async fn place_order(
        &self,
        symbol: &str,
        quantity: u32,
        price: Decimal,
        side: OrderSide,
    ) -> llm_trade_core::Result<String> {
        self.place_limit_order(symbol, quantity, price, side)
            .await
            .map_err(KiteError::into_submission)
    }

    async fn open_positions(&self) -> llm_trade_core::Result<Vec<BrokerPosition>> {
        let positions = self.day_positions().await.map_err(KiteError::into_fetch)?;
        Ok(positions.into_iter().filter(|p| p.quantity > 0).collect())
    }

    async fn modify_order(&self, order_id: &str, trigger_price: Decimal) -> llm_trade_core::Result<()> {
        self.set_trigger_price(order_id, trigger_price)
            .await
            .map_err(KiteError::into_submission)
    }

    async fn last_price(&self, symbol: &str) -> llm_trade_core::Result<Option<Decimal>> {
        self.ltp(symbol).await.map_err(KiteError::into_fetch)
    }
}
