//! CART-style binary classification tree
//!
//! Gini-impurity splits over midpoint thresholds, with a random
//! feature subset per split so the forest decorrelates its trees.
//! Leaves store the positive-class fraction of their samples.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeConfig {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features considered per split (None = all)
    pub max_features: Option<usize>,
    pub seed: u64,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 15,
            min_samples_split: 10,
            min_samples_leaf: 5,
            max_features: None,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Node {
    feature: usize,
    threshold: f64,
    /// Positive-class fraction at this node (prediction when leaf)
    pos_fraction: f64,
    left: Option<Box<Node>>,
    right: Option<Box<Node>>,
}

impl Node {
    fn leaf(pos_fraction: f64) -> Self {
        Self {
            feature: 0,
            threshold: 0.0,
            pos_fraction,
            left: None,
            right: None,
        }
    }

    fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    config: TreeConfig,
    root: Option<Node>,
    importances: Vec<f64>,
}

impl DecisionTree {
    pub fn new(config: TreeConfig) -> Self {
        Self {
            config,
            root: None,
            importances: Vec::new(),
        }
    }

    /// Fit on a feature matrix and 0/1 labels
    pub fn fit(&mut self, features: &[Vec<f64>], labels: &[f64]) {
        let n_features = features.first().map(|r| r.len()).unwrap_or(0);
        self.importances = vec![0.0; n_features];
        if features.is_empty() {
            self.root = Some(Node::leaf(0.5));
            return;
        }
        let indices: Vec<usize> = (0..features.len()).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        self.root = Some(self.build(features, labels, &indices, 0, &mut rng));
    }

    fn build(
        &mut self,
        features: &[Vec<f64>],
        labels: &[f64],
        indices: &[usize],
        depth: usize,
        rng: &mut ChaCha8Rng,
    ) -> Node {
        let pos_fraction = positive_fraction(labels, indices);
        let impurity = gini(pos_fraction);

        if depth >= self.config.max_depth
            || indices.len() < self.config.min_samples_split
            || impurity < 1e-10
        {
            return Node::leaf(pos_fraction);
        }

        let Some((feature, threshold, left_idx, right_idx, gain)) =
            self.best_split(features, labels, indices, impurity, rng)
        else {
            return Node::leaf(pos_fraction);
        };

        if left_idx.len() < self.config.min_samples_leaf
            || right_idx.len() < self.config.min_samples_leaf
        {
            return Node::leaf(pos_fraction);
        }

        self.importances[feature] += gain * indices.len() as f64;

        let left = self.build(features, labels, &left_idx, depth + 1, rng);
        let right = self.build(features, labels, &right_idx, depth + 1, rng);

        Node {
            feature,
            threshold,
            pos_fraction,
            left: Some(Box::new(left)),
            right: Some(Box::new(right)),
        }
    }

    #[allow(clippy::type_complexity)]
    fn best_split(
        &self,
        features: &[Vec<f64>],
        labels: &[f64],
        indices: &[usize],
        parent_impurity: f64,
        rng: &mut ChaCha8Rng,
    ) -> Option<(usize, f64, Vec<usize>, Vec<usize>, f64)> {
        let n_features = features[indices[0]].len();
        let max_features = self.config.max_features.unwrap_or(n_features).min(n_features);

        let mut candidates: Vec<usize> = (0..n_features).collect();
        candidates.shuffle(rng);
        candidates.truncate(max_features);

        let mut best: Option<(usize, f64, Vec<usize>, Vec<usize>, f64)> = None;
        let mut best_gain = 0.0;

        for &feature in &candidates {
            let mut values: Vec<f64> = indices.iter().map(|&i| features[i][feature]).collect();
            values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            values.dedup();

            for pair in values.windows(2) {
                let threshold = (pair[0] + pair[1]) / 2.0;
                let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
                    .iter()
                    .partition(|&&i| features[i][feature] <= threshold);
                if left_idx.is_empty() || right_idx.is_empty() {
                    continue;
                }

                let left_imp = gini(positive_fraction(labels, &left_idx));
                let right_imp = gini(positive_fraction(labels, &right_idx));
                let n_left = left_idx.len() as f64;
                let n_right = right_idx.len() as f64;
                let weighted = (n_left * left_imp + n_right * right_imp) / (n_left + n_right);
                let gain = parent_impurity - weighted;

                if gain > best_gain {
                    best_gain = gain;
                    best = Some((feature, threshold, left_idx, right_idx, gain));
                }
            }
        }
        best
    }

    /// Positive-class probability for one sample
    pub fn predict_proba_one(&self, features: &[f64]) -> f64 {
        let mut node = match &self.root {
            Some(n) => n,
            None => return 0.5,
        };
        loop {
            if node.is_leaf() {
                return node.pos_fraction;
            }
            let child = if features[node.feature] <= node.threshold {
                node.left.as_deref()
            } else {
                node.right.as_deref()
            };
            match child {
                Some(c) => node = c,
                None => return node.pos_fraction,
            }
        }
    }

    /// Unnormalized impurity-decrease importances
    pub fn importances(&self) -> &[f64] {
        &self.importances
    }
}

fn positive_fraction(labels: &[f64], indices: &[usize]) -> f64 {
    if indices.is_empty() {
        return 0.5;
    }
    let positives = indices.iter().filter(|&&i| labels[i] > 0.0).count();
    positives as f64 / indices.len() as f64
}

fn gini(pos_fraction: f64) -> f64 {
    2.0 * pos_fraction * (1.0 - pos_fraction)
}
