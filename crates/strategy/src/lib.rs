//! Trade proposal, filtering and execution logic.

pub mod backtest;
pub mod classifier;
pub mod parser;
pub mod pipeline;
pub mod predictor;
pub mod prompt;

pub use backtest::{BacktestReport, RoundTrip, RsiBacktest};
pub use classifier::{ForestModel, RandomForest};
pub use parser::TradeProposalParser;
pub use pipeline::{Collaborators, DecisionPipeline, PipelineOutcome, PipelineSettings};
pub use predictor::{features, SuccessPredictor, TrainingReport, FEATURE_NAMES};
pub use prompt::build_prompt;
