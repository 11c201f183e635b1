//! Trade success prediction from historical trades.

use std::sync::Arc;

use anyhow::Result;
use llm_trade_core::{Classifier, PredictorConfig, TradeProposal, TradeRecord, TrainedModel};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::classifier::accuracy;

/// Column order of [`features`].
pub const FEATURE_NAMES: [&str; 6] = [
    "entry_price",
    "target_price",
    "stop_loss",
    "price_diff",
    "risk",
    "reward",
];

/// Feature row for a trade: entry, target, stop, target − entry,
/// stop / entry and (target − entry) / entry.
///
/// `None` when entry is zero or a value does not fit in an `f64`.
pub fn features(entry: Decimal, target: Decimal, stop: Decimal) -> Option<Vec<f64>> {
    if entry.is_zero() {
        return None;
    }
    let price_diff = target - entry;
    let row = [
        entry,
        target,
        stop,
        price_diff,
        stop / entry,
        price_diff / entry,
    ]
    .iter()
    .map(|v| v.to_f64().filter(|f| f.is_finite()))
    .collect::<Option<Vec<f64>>>()?;
    Some(row)
}

/// Reward as a fraction of entry.
fn reward(trade: &TradeRecord) -> Option<f64> {
    if trade.entry.is_zero() {
        return None;
    }
    ((trade.target - trade.entry) / trade.entry).to_f64()
}

/// Handle to an optional trained model.
///
/// An untrained predictor approves every proposal. Training returns a new
/// handle; existing handles are never mutated.
#[derive(Debug, Clone, Default)]
pub struct SuccessPredictor {
    model: Option<Arc<dyn TrainedModel>>,
}

/// Result of [`SuccessPredictor::train`].
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub predictor: SuccessPredictor,
    /// Rows with a complete feature vector.
    pub samples: usize,
    pub test_samples: usize,
    /// Hold-out accuracy, absent when there was no test split.
    pub accuracy: Option<f64>,
}

impl SuccessPredictor {
    #[must_use]
    pub fn untrained() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_model(model: Box<dyn TrainedModel>) -> Self {
        Self {
            model: Some(Arc::from(model)),
        }
    }

    #[must_use]
    pub fn is_trained(&self) -> bool {
        self.model.is_some()
    }

    /// Whether the proposal is expected to succeed.
    pub fn predict(&self, proposal: &TradeProposal) -> bool {
        let Some(model) = &self.model else {
            return true;
        };
        match features(proposal.entry, proposal.target, proposal.stop) {
            Some(row) => model.predict(&row),
            None => {
                warn!(symbol = %proposal.symbol, "Proposal has no usable features, predicting failure");
                false
            }
        }
    }

    /// Trains on past trades with a seeded shuffled train/test split.
    ///
    /// With no usable history the returned predictor is untrained.
    ///
    /// # Errors
    /// Returns error if the classifier fails to fit.
    pub fn train(
        classifier: &dyn Classifier,
        trades: &[TradeRecord],
        config: &PredictorConfig,
    ) -> Result<TrainingReport> {
        let mut rows = Vec::with_capacity(trades.len());
        let mut labels = Vec::with_capacity(trades.len());
        for trade in trades {
            if let (Some(row), Some(reward)) = (features(trade.entry, trade.target, trade.stop), reward(trade)) {
                rows.push(row);
                labels.push(reward >= config.success_threshold);
            }
        }

        if rows.is_empty() {
            warn!(trades = trades.len(), "No data available for training the success model");
            return Ok(TrainingReport {
                predictor: Self::untrained(),
                samples: 0,
                test_samples: 0,
                accuracy: None,
            });
        }

        let mut order: Vec<usize> = (0..rows.len()).collect();
        order.shuffle(&mut ChaCha8Rng::seed_from_u64(config.seed));
        let test_len = test_len(rows.len(), config.test_fraction);
        let (test_idx, train_idx) = order.split_at(test_len);

        let pick = |idx: &[usize]| -> (Vec<Vec<f64>>, Vec<bool>) {
            idx.iter().map(|&i| (rows[i].clone(), labels[i])).unzip()
        };
        let (train_x, train_y) = pick(train_idx);
        let (test_x, test_y) = pick(test_idx);

        let model = classifier.fit(&train_x, &train_y)?;
        let accuracy = accuracy(model.as_ref(), &test_x, &test_y);

        match accuracy {
            Some(acc) => info!(
                samples = rows.len(),
                test_samples = test_len,
                "Success model trained with accuracy: {:.2}%",
                acc * 100.0
            ),
            None => info!(samples = rows.len(), "Success model trained without a hold-out split"),
        }

        Ok(TrainingReport {
            predictor: Self::from_model(model),
            samples: rows.len(),
            test_samples: test_len,
            accuracy,
        })
    }
}

/// Hold-out size: `ceil(n * fraction)`, leaving at least one training row.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn test_len(n: usize, fraction: f64) -> usize {
    if n < 2 || fraction <= 0.0 {
        return 0;
    }
    ((n as f64 * fraction).ceil() as usize).min(n - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::RandomForest;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    #[derive(Debug)]
    struct Never;

    impl TrainedModel for Never {
        fn predict(&self, _features: &[f64]) -> bool {
            false
        }
    }

    fn proposal(entry: Decimal, target: Decimal, stop: Decimal) -> TradeProposal {
        TradeProposal {
            symbol: "RELIANCE.NS".to_string(),
            entry,
            target,
            stop,
        }
    }

    fn trade(entry: Decimal, target: Decimal, stop: Decimal) -> TradeRecord {
        TradeRecord {
            symbol: "RELIANCE.NS".to_string(),
            quantity: 10,
            entry,
            target,
            stop,
            order_id: "1".to_string(),
            executed_at: Utc::now(),
        }
    }

    #[test]
    fn test_untrained_approves_everything() {
        let predictor = SuccessPredictor::untrained();
        assert!(!predictor.is_trained());
        assert!(predictor.predict(&proposal(dec!(201), dec!(206), dec!(198))));
        assert!(predictor.predict(&proposal(dec!(201), dec!(190), dec!(250))));
        assert!(predictor.predict(&proposal(dec!(0), dec!(0), dec!(0))));
    }

    #[test]
    fn test_trained_model_is_consulted() {
        let predictor = SuccessPredictor::from_model(Box::new(Never));
        assert!(!predictor.predict(&proposal(dec!(201), dec!(206), dec!(198))));
    }

    #[test]
    fn test_features() {
        let row = features(dec!(200), dec!(206), dec!(196)).unwrap();
        assert_eq!(row.len(), FEATURE_NAMES.len());
        assert!((row[3] - 6.0).abs() < 1e-12);
        assert!((row[4] - 0.98).abs() < 1e-12);
        assert!((row[5] - 0.03).abs() < 1e-12);
        assert!(features(dec!(0), dec!(1), dec!(1)).is_none());
    }

    #[test]
    fn test_train_on_empty_history_is_untrained() {
        let report = SuccessPredictor::train(&RandomForest::default(), &[], &PredictorConfig::default()).unwrap();
        assert!(!report.predictor.is_trained());
        assert_eq!(report.samples, 0);
        assert!(report.accuracy.is_none());
    }

    #[test]
    fn test_train_splits_and_scores() {
        let trades: Vec<TradeRecord> = (0..20)
            .map(|i| {
                let entry = Decimal::from(100 + i);
                let target = if i % 2 == 0 { entry * dec!(1.03) } else { entry * dec!(1.01) };
                trade(entry, target, entry * dec!(0.985))
            })
            .collect();

        let report =
            SuccessPredictor::train(&RandomForest::new(15, 4, 2, 42), &trades, &PredictorConfig::default()).unwrap();

        assert!(report.predictor.is_trained());
        assert_eq!(report.samples, 20);
        assert_eq!(report.test_samples, 4);
        assert!(report.accuracy.is_some());
    }

    #[test]
    fn test_test_len() {
        assert_eq!(test_len(10, 0.2), 2);
        assert_eq!(test_len(11, 0.2), 3);
        assert_eq!(test_len(1, 0.2), 0);
        assert_eq!(test_len(2, 0.9), 1);
    }
}
