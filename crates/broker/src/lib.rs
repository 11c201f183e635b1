//! Brokerage adapters.
//!
//! [`KiteClient`] talks to Zerodha Kite Connect over REST; [`PaperBroker`]
//! simulates fills in memory for dry runs.

pub mod error;
pub mod kite;
pub mod paper;
pub mod types;

pub use error::KiteError;
pub use kite::KiteClient;
pub use paper::PaperBroker;
pub use types::SymbolMap;
