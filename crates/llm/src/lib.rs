//! Language model access for the trading pipeline.

pub mod client;
pub mod error;

pub use client::ChatClient;
pub use error::LlmError;
