//! Next-bar direction classifier
//!
//! Wraps the random forest with the training pipeline: feature
//! extraction from the indicator frame, a seeded 80/20 split,
//! standardization fit on the training portion only, and an explicit
//! trained/untrained lifecycle. Retraining never happens implicitly;
//! the caller decides when the model is stale.

pub mod forest;
pub mod tree;

pub use forest::{ForestConfig, RandomForest};
pub use tree::{DecisionTree, TreeConfig};

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::features::{IndicatorFrame, FEATURE_NAMES};

/// Minimum labeled rows before a training run is worth anything
const MIN_TRAINING_ROWS: usize = 60;
const TEST_FRACTION: f64 = 0.2;

#[derive(Debug, Error)]
pub enum TrainError {
    #[error("insufficient training data: {rows} usable rows, need {needed}")]
    InsufficientData { rows: usize, needed: usize },
}

/// Per-feature standardization (zero mean, unit variance), fit on the
/// training split and applied unchanged to everything else
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    means: Vec<f64>,
    stds: Vec<f64>,
}

impl StandardScaler {
    pub fn fit(features: &[Vec<f64>]) -> Self {
        let n_features = features.first().map(|r| r.len()).unwrap_or(0);
        let n = features.len().max(1) as f64;

        let mut means = vec![0.0; n_features];
        for row in features {
            for (m, v) in means.iter_mut().zip(row.iter()) {
                *m += v;
            }
        }
        for m in &mut means {
            *m /= n;
        }

        let mut stds = vec![0.0; n_features];
        for row in features {
            for ((s, v), m) in stds.iter_mut().zip(row.iter()).zip(means.iter()) {
                *s += (v - m).powi(2);
            }
        }
        for s in &mut stds {
            *s = (*s / n).sqrt();
            // constant columns pass through unscaled
            if *s == 0.0 {
                *s = 1.0;
            }
        }

        Self { means, stds }
    }

    pub fn transform_row(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(self.means.iter().zip(self.stds.iter()))
            .map(|(v, (m, s))| (v - m) / s)
            .collect()
    }

    pub fn transform(&self, features: &[Vec<f64>]) -> Vec<Vec<f64>> {
        features.iter().map(|r| self.transform_row(r)).collect()
    }
}

/// Summary of one training run
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub samples: usize,
    pub test_accuracy: f64,
    pub trained_at: DateTime<Utc>,
}

#[derive(Debug)]
struct TrainedModel {
    forest: RandomForest,
    scaler: StandardScaler,
    trained_at: DateTime<Utc>,
}

/// Explicit model lifecycle: no prediction before a deliberate train
#[derive(Debug, Default)]
enum ModelState {
    #[default]
    Untrained,
    Trained(TrainedModel),
}

#[derive(Debug)]
pub struct DirectionClassifier {
    config: ForestConfig,
    state: ModelState,
}

impl DirectionClassifier {
    pub fn new(config: ForestConfig) -> Self {
        Self {
            config,
            state: ModelState::Untrained,
        }
    }

    pub fn is_trained(&self) -> bool {
        matches!(self.state, ModelState::Trained(_))
    }

    pub fn trained_at(&self) -> Option<DateTime<Utc>> {
        match &self.state {
            ModelState::Trained(model) => Some(model.trained_at),
            ModelState::Untrained => None,
        }
    }

    /// Train on the frame's labeled rows. Replaces any prior model.
    pub fn train(&mut self, frame: &IndicatorFrame) -> Result<TrainingReport, TrainError> {
        let (features, labels) = frame.training_rows();
        if features.len() < MIN_TRAINING_ROWS {
            return Err(TrainError::InsufficientData {
                rows: features.len(),
                needed: MIN_TRAINING_ROWS,
            });
        }

        let mut indices: Vec<usize> = (0..features.len()).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        indices.shuffle(&mut rng);

        let test_len = ((features.len() as f64) * TEST_FRACTION).round() as usize;
        let (test_idx, train_idx) = indices.split_at(test_len.max(1));

        let train_x: Vec<Vec<f64>> = train_idx.iter().map(|&i| features[i].clone()).collect();
        let train_y: Vec<f64> = train_idx.iter().map(|&i| labels[i]).collect();
        let test_x: Vec<Vec<f64>> = test_idx.iter().map(|&i| features[i].clone()).collect();
        let test_y: Vec<f64> = test_idx.iter().map(|&i| labels[i]).collect();

        let scaler = StandardScaler::fit(&train_x);
        let train_scaled = scaler.transform(&train_x);
        let test_scaled = scaler.transform(&test_x);

        let mut forest = RandomForest::new(self.config.clone());
        forest.fit(&train_scaled, &train_y);

        let test_accuracy = forest.accuracy(&test_scaled, &test_y);
        let trained_at = Utc::now();

        let mut ranking: Vec<(&str, f64)> = FEATURE_NAMES
            .iter()
            .copied()
            .zip(forest.importances().iter().copied())
            .collect();
        ranking.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        info!(
            "model trained on {} samples, test accuracy {:.2}",
            features.len(),
            test_accuracy
        );
        for (name, importance) in ranking.iter().take(3) {
            info!("feature importance: {name} = {importance:.3}");
        }

        let report = TrainingReport {
            samples: features.len(),
            test_accuracy,
            trained_at,
        };
        self.state = ModelState::Trained(TrainedModel {
            forest,
            scaler,
            trained_at,
        });
        Ok(report)
    }

    /// Positive-class probability for a raw (unscaled) feature row.
    /// None until a model has been trained.
    pub fn predict_proba(&self, features: &[f64]) -> Option<f64> {
        match &self.state {
            ModelState::Trained(model) => {
                let scaled = model.scaler.transform_row(features);
                Some(model.forest.predict_proba_one(&scaled))
            }
            ModelState::Untrained => None,
        }
    }
}
