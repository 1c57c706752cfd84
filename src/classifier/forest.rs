//! Random forest of classification trees
//!
//! Each tree fits a bootstrap sample with a sqrt-sized feature subset
//! per split. With `balanced` set, the bootstrap draws equally from
//! both label classes to counter the skew of next-bar direction
//! labels (most bars do not close higher on higher volume).

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::tree::{DecisionTree, TreeConfig};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestConfig {
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Per-split feature subset (None = sqrt of feature count)
    pub max_features: Option<usize>,
    /// Class-balanced bootstrap sampling
    pub balanced: bool,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 200,
            max_depth: 15,
            min_samples_split: 10,
            min_samples_leaf: 5,
            max_features: None,
            balanced: true,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    config: ForestConfig,
    trees: Vec<DecisionTree>,
    importances: Vec<f64>,
}

impl RandomForest {
    pub fn new(config: ForestConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            importances: Vec::new(),
        }
    }

    pub fn fit(&mut self, features: &[Vec<f64>], labels: &[f64]) {
        let n_features = features.first().map(|r| r.len()).unwrap_or(0);
        let max_features = self
            .config
            .max_features
            .unwrap_or_else(|| (n_features as f64).sqrt().ceil() as usize)
            .max(1);

        let positives: Vec<usize> = (0..labels.len()).filter(|&i| labels[i] > 0.0).collect();
        let negatives: Vec<usize> = (0..labels.len()).filter(|&i| labels[i] <= 0.0).collect();

        self.trees = (0..self.config.n_trees)
            .map(|t| {
                let seed = self.config.seed.wrapping_add(t as u64);
                let sample = self.bootstrap(features.len(), &positives, &negatives, seed);
                let (sample_x, sample_y): (Vec<Vec<f64>>, Vec<f64>) = sample
                    .iter()
                    .map(|&i| (features[i].clone(), labels[i]))
                    .unzip();

                let mut tree = DecisionTree::new(TreeConfig {
                    max_depth: self.config.max_depth,
                    min_samples_split: self.config.min_samples_split,
                    min_samples_leaf: self.config.min_samples_leaf,
                    max_features: Some(max_features),
                    seed,
                });
                tree.fit(&sample_x, &sample_y);
                tree
            })
            .collect();

        // Aggregate and normalize impurity-decrease importances
        self.importances = vec![0.0; n_features];
        for tree in &self.trees {
            for (i, imp) in tree.importances().iter().enumerate() {
                self.importances[i] += imp;
            }
        }
        let sum: f64 = self.importances.iter().sum();
        if sum > 0.0 {
            for imp in &mut self.importances {
                *imp /= sum;
            }
        }
    }

    fn bootstrap(
        &self,
        n: usize,
        positives: &[usize],
        negatives: &[usize],
        seed: u64,
    ) -> Vec<usize> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        if self.config.balanced && !positives.is_empty() && !negatives.is_empty() {
            (0..n)
                .map(|draw| {
                    let pool = if draw % 2 == 0 { positives } else { negatives };
                    pool[rng.gen_range(0..pool.len())]
                })
                .collect()
        } else {
            (0..n).map(|_| rng.gen_range(0..n)).collect()
        }
    }

    /// Positive-class probability: mean of per-tree leaf fractions
    pub fn predict_proba_one(&self, features: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return 0.5;
        }
        let sum: f64 = self
            .trees
            .iter()
            .map(|t| t.predict_proba_one(features))
            .sum();
        sum / self.trees.len() as f64
    }

    /// Fraction of samples whose rounded prediction matches the label
    pub fn accuracy(&self, features: &[Vec<f64>], labels: &[f64]) -> f64 {
        if features.is_empty() {
            return 0.0;
        }
        let correct = features
            .iter()
            .zip(labels.iter())
            .filter(|(row, &label)| {
                let predicted = if self.predict_proba_one(row) > 0.5 { 1.0 } else { 0.0 };
                predicted == if label > 0.0 { 1.0 } else { 0.0 }
            })
            .count();
        correct as f64 / features.len() as f64
    }

    /// Normalized feature importances (sums to 1 after fit)
    pub fn importances(&self) -> &[f64] {
        &self.importances
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}
