//! Random forest binary classifier.
//!
//! Bootstrap-sampled CART trees split on Gini impurity over a random subset
//! of `sqrt(n_features)` features per node; the forest predicts by majority
//! vote. Seeded, so training on the same rows yields the same forest.

use anyhow::{bail, Result};
use llm_trade_core::{Classifier, PredictorConfig, TrainedModel};
use rand::seq::index;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

#[derive(Debug, Clone)]
pub struct RandomForest {
    n_trees: usize,
    max_depth: usize,
    min_samples_split: usize,
    seed: u64,
}

impl RandomForest {
    #[must_use]
    pub fn new(n_trees: usize, max_depth: usize, min_samples_split: usize, seed: u64) -> Self {
        Self {
            n_trees: n_trees.max(1),
            max_depth,
            min_samples_split: min_samples_split.max(2),
            seed,
        }
    }

    #[must_use]
    pub fn from_config(config: &PredictorConfig) -> Self {
        Self::new(config.n_trees, config.max_depth, config.min_samples_split, config.seed)
    }

    fn grow(
        &self,
        features: &[Vec<f64>],
        labels: &[bool],
        rows: &[usize],
        depth: usize,
        rng: &mut ChaCha8Rng,
    ) -> Node {
        let positives = rows.iter().filter(|&&i| labels[i]).count();
        let majority = positives * 2 > rows.len();

        if depth >= self.max_depth
            || rows.len() < self.min_samples_split
            || positives == 0
            || positives == rows.len()
        {
            return Node::Leaf(majority);
        }

        let Some(split) = best_split(features, labels, rows, positives, rng) else {
            return Node::Leaf(majority);
        };

        let (left, right): (Vec<usize>, Vec<usize>) = rows
            .iter()
            .copied()
            .partition(|&i| features[i][split.feature] <= split.threshold);

        Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left: Box::new(self.grow(features, labels, &left, depth + 1, rng)),
            right: Box::new(self.grow(features, labels, &right, depth + 1, rng)),
        }
    }
}

impl Default for RandomForest {
    fn default() -> Self {
        Self::from_config(&PredictorConfig::default())
    }
}

impl Classifier for RandomForest {
    fn fit(&self, features: &[Vec<f64>], labels: &[bool]) -> Result<Box<dyn TrainedModel>> {
        if features.is_empty() {
            bail!("cannot fit a forest on zero rows");
        }
        if features.len() != labels.len() {
            bail!("{} feature rows but {} labels", features.len(), labels.len());
        }
        let width = features[0].len();
        if width == 0 {
            bail!("feature rows are empty");
        }
        if let Some(row) = features.iter().position(|r| r.len() != width) {
            bail!("row {row} has {} features, expected {width}", features[row].len());
        }
        if features.iter().flatten().any(|v| !v.is_finite()) {
            bail!("feature rows contain non-finite values");
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let n = features.len();
        let trees = (0..self.n_trees)
            .map(|_| {
                let sample: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                self.grow(features, labels, &sample, 0, &mut rng)
            })
            .collect();

        Ok(Box::new(ForestModel { trees, width }))
    }
}

/// Fitted forest.
#[derive(Debug, Clone)]
pub struct ForestModel {
    trees: Vec<Node>,
    width: usize,
}

impl ForestModel {
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl TrainedModel for ForestModel {
    fn predict(&self, features: &[f64]) -> bool {
        if features.len() != self.width {
            return false;
        }
        let votes = self.trees.iter().filter(|t| t.predict(features)).count();
        votes * 2 > self.trees.len()
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf(bool),
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    fn predict(&self, features: &[f64]) -> bool {
        let mut node = self;
        loop {
            match node {
                Node::Leaf(label) => return *label,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if features[*feature] <= *threshold { left } else { right };
                }
            }
        }
    }
}

struct Split {
    feature: usize,
    threshold: f64,
}

fn best_split(
    features: &[Vec<f64>],
    labels: &[bool],
    rows: &[usize],
    positives: usize,
    rng: &mut ChaCha8Rng,
) -> Option<Split> {
    let width = features[rows[0]].len();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    let candidates = ((width as f64).sqrt().ceil() as usize).clamp(1, width);

    let parent = gini(positives, rows.len());
    let mut best: Option<(Split, f64)> = None;

    for feature in index::sample(rng, width, candidates).iter() {
        let mut values: Vec<f64> = rows.iter().map(|&i| features[i][feature]).collect();
        values.sort_by(f64::total_cmp);
        values.dedup();

        for pair in values.windows(2) {
            let threshold = (pair[0] + pair[1]) / 2.0;
            let (mut left_n, mut left_pos, mut right_n, mut right_pos) = (0, 0, 0, 0);
            for &i in rows {
                if features[i][feature] <= threshold {
                    left_n += 1;
                    left_pos += usize::from(labels[i]);
                } else {
                    right_n += 1;
                    right_pos += usize::from(labels[i]);
                }
            }

            #[allow(clippy::cast_precision_loss)]
            let impurity = (left_n as f64 * gini(left_pos, left_n)
                + right_n as f64 * gini(right_pos, right_n))
                / rows.len() as f64;

            if impurity < parent && best.as_ref().map_or(true, |(_, b)| impurity < *b) {
                best = Some((Split { feature, threshold }, impurity));
            }
        }
    }

    best.map(|(split, _)| split)
}

#[allow(clippy::cast_precision_loss)]
fn gini(positives: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let p = positives as f64 / total as f64;
    2.0 * p * (1.0 - p)
}

/// Share of rows the model labels correctly.
#[allow(clippy::cast_precision_loss)]
pub fn accuracy(model: &dyn TrainedModel, features: &[Vec<f64>], labels: &[bool]) -> Option<f64> {
    if features.is_empty() {
        return None;
    }
    let correct = features
        .iter()
        .zip(labels)
        .filter(|(row, label)| model.predict(row) == **label)
        .count();
    Some(correct as f64 / features.len() as f64)
}
