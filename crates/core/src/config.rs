use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub trading: TradingConfig,
    pub market_data: MarketDataConfig,
    pub llm: LlmConfig,
    pub news: NewsConfig,
    pub broker: BrokerConfig,
    pub database: DatabaseConfig,
    pub predictor: PredictorConfig,
    pub scheduler: SchedulerConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TradingConfig {
    pub capital: Decimal,
    /// Fraction of capital risked per trade.
    pub risk_per_trade: Decimal,
    /// Take-profit distance above entry, as a fraction.
    pub target_pct: Decimal,
    /// Stop-loss distance below entry, as a fraction.
    pub stop_loss_pct: Decimal,
    /// Trailing distance below the live price, as a fraction.
    pub trailing_stop_pct: Decimal,
    /// Keep ratcheted stops in the trade store so they floor later cycles.
    pub persist_trailing_stop: bool,
    pub symbols: Vec<String>,
    /// Return objective stated to the language model.
    pub objective: String,
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            capital: Decimal::from(5000),
            risk_per_trade: Decimal::new(15, 3),
            target_pct: Decimal::new(25, 3),
            stop_loss_pct: Decimal::new(15, 3),
            trailing_stop_pct: Decimal::new(5, 3),
            persist_trailing_stop: true,
            symbols: [
                "RELIANCE.NS",
                "HDFCBANK.NS",
                "TCS.NS",
                "INFY.NS",
                "HINDUNILVR.NS",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            objective: "Our goal is to achieve 5–10% monthly returns on a ₹5000 capital.".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketDataConfig {
    pub base_url: String,
    /// History requested per candidate fetch (Yahoo range syntax).
    pub history_range: String,
    pub rsi_period: usize,
    pub support_resistance_window: usize,
    pub timeout_secs: u64,
}

impl Default for MarketDataConfig {
    fn default() -> Self {
        Self {
            base_url: "https://query1.finance.yahoo.com".to_string(),
            history_range: "1mo".to_string(),
            rsi_period: 14,
            support_resistance_window: 20,
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    pub system_prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            model: "gpt-4".to_string(),
            system_prompt: "You are a trading assistant.".to_string(),
            max_tokens: 150,
            temperature: 0.5,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsConfig {
    pub api_url: String,
    pub api_key: String,
    /// Articles considered per symbol.
    pub max_articles: usize,
    pub timeout_secs: u64,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            api_url: "https://newsapi.org".to_string(),
            api_key: String::new(),
            max_articles: 5,
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrokerMode {
    #[default]
    Paper,
    Kite,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    pub mode: BrokerMode,
    pub base_url: String,
    pub api_key: String,
    pub access_token: String,
    pub exchange: String,
    pub product: String,
    /// Suffix the market-data symbols carry that the brokerage does not.
    pub symbol_suffix: String,
    pub timeout_secs: u64,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            mode: BrokerMode::Paper,
            base_url: "https://api.kite.trade".to_string(),
            api_key: String::new(),
            access_token: String::new(),
            exchange: "NSE".to_string(),
            product: "MIS".to_string(),
            symbol_suffix: ".NS".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://trading.db".to_string(),
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictorConfig {
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    /// Reward (as a fraction of entry) at or above which a trade counts as a success.
    pub success_threshold: f64,
    pub test_fraction: f64,
    pub seed: u64,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 8,
            min_samples_split: 2,
            success_threshold: 0.02,
            test_fraction: 0.2,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Cron expression (with seconds) for the decision pipeline.
    pub trade_cron: String,
    /// Cron expression (with seconds) for the position monitor.
    pub monitor_cron: String,
    /// IANA zone the cron expressions are evaluated in.
    pub timezone: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            trade_cron: "0 0 10 * * Mon-Fri".to_string(),
            monitor_cron: "0 0,30 9-15 * * Mon-Fri".to_string(),
            timezone: "Asia/Kolkata".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// JSON log file written alongside stderr output. Empty disables it.
    pub json_file: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            json_file: "trading.log".to_string(),
        }
    }
}
