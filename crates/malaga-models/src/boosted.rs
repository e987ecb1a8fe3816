//! Least-squares gradient boosting with depth-1 regression trees.
//!
//! Boosting is delegated to the `gbdt` crate; this module adapts it to the
//! [`Scorer`] and [`TrainedModel`] seams.

use gbdt::config::Config;
use gbdt::decision_tree::{Data, DataVec, ValueType};
use gbdt::gradient_boost::GBDT;
use malaga_traits::{
    FeatureMatrix, FeatureSchema, MalagaError, Result, Scorer, TrainedModel,
    scorer::validate_training_set,
};
use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Loss name understood by `gbdt` for least-squares regression.
const SQUARED_ERROR: &str = "SquaredError";

/// Configuration for [`BoostedStumpsScorer`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostedStumpsConfig {
    /// Number of boosting rounds.
    pub n_estimators: usize,
    /// Shrinkage applied to each stump.
    pub learning_rate: f64,
    /// Minimum number of training rows on each side of a split.
    pub min_samples_leaf: usize,
}

impl Default for BoostedStumpsConfig {
    fn default() -> Self {
        Self {
            n_estimators: 400,
            learning_rate: 0.05,
            min_samples_leaf: 20,
        }
    }
}

impl BoostedStumpsConfig {
    /// Validates the boosting parameters.
    ///
    /// # Errors
    ///
    /// Returns [`MalagaError::InvalidConfig`] for zero rounds, a learning rate
    /// outside `(0, 1]`, or a zero leaf size.
    pub fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(MalagaError::InvalidConfig(
                "n_estimators must be positive".to_string(),
            ));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return Err(MalagaError::InvalidConfig(format!(
                "learning_rate must be in (0, 1], got {}",
                self.learning_rate
            )));
        }
        if self.min_samples_leaf == 0 {
            return Err(MalagaError::InvalidConfig(
                "min_samples_leaf must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Gradient-boosted decision stumps.
///
/// Targets are centered on their mean and `n_estimators` single-split trees
/// are fitted to the residuals, each added with weight `learning_rate`.
/// Predictions add the mean back.
#[derive(Debug, Clone, Default)]
pub struct BoostedStumpsScorer {
    config: BoostedStumpsConfig,
}

impl BoostedStumpsScorer {
    /// Create a boosted-stumps scorer.
    pub const fn new(config: BoostedStumpsConfig) -> Self {
        Self { config }
    }

    /// The scorer configuration.
    pub const fn config(&self) -> &BoostedStumpsConfig {
        &self.config
    }

    fn booster_config(&self, n_features: usize) -> Config {
        let mut cfg = Config::new();
        cfg.set_feature_size(n_features);
        cfg.set_max_depth(1);
        cfg.set_iterations(self.config.n_estimators);
        cfg.set_shrinkage(self.config.learning_rate as ValueType);
        cfg.set_min_leaf_size(self.config.min_samples_leaf);
        cfg.set_loss(SQUARED_ERROR);
        cfg.set_training_optimization_level(2);
        cfg
    }
}

fn row_values(row: ArrayView1<'_, f64>) -> Vec<ValueType> {
    row.iter().map(|&v| v as ValueType).collect()
}

impl Scorer for BoostedStumpsScorer {
    fn name(&self) -> &str {
        "boosted_stumps"
    }

    fn fit(&self, features: &FeatureMatrix, targets: &[f64]) -> Result<Box<dyn TrainedModel>> {
        validate_training_set(features, targets)?;
        self.config.validate()?;

        let n = targets.len();
        let base = targets.iter().sum::<f64>() / n as f64;

        let mut train: DataVec = features
            .values()
            .rows()
            .into_iter()
            .zip(targets)
            .map(|(row, &target)| {
                Data::new_training_data(row_values(row), 1.0, (target - base) as ValueType, None)
            })
            .collect();

        let mut booster = GBDT::new(&self.booster_config(features.ncols()));
        booster.fit(&mut train);

        debug!(
            rows = n,
            features = features.ncols(),
            rounds = self.config.n_estimators,
            base,
            "boosted stumps fit"
        );

        Ok(Box::new(BoostedStumpsModel {
            schema: features.schema().clone(),
            base,
            booster,
        }))
    }
}

/// A fitted boosted-stumps model.
struct BoostedStumpsModel {
    schema: FeatureSchema,
    base: f64,
    booster: GBDT,
}

impl fmt::Debug for BoostedStumpsModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoostedStumpsModel")
            .field("schema", &self.schema)
            .field("base", &self.base)
            .finish_non_exhaustive()
    }
}

impl TrainedModel for BoostedStumpsModel {
    fn name(&self) -> &str {
        "boosted_stumps"
    }

    fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<f64>> {
        self.check_schema(features)?;
        if features.nrows() == 0 {
            return Ok(Vec::new());
        }
        let rows: DataVec = features
            .values()
            .rows()
            .into_iter()
            .map(|row| Data::new_test_data(row_values(row), None))
            .collect();
        let raw = self.booster.predict(&rows);
        if raw.len() != rows.len() {
            return Err(MalagaError::inference(format!(
                "booster returned {} scores for {} rows",
                raw.len(),
                rows.len()
            )));
        }
        Ok(raw.into_iter().map(|p| self.base + f64::from(p)).collect())
    }
}
