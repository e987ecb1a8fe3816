//! Scorer traits: the pluggable learned ranking function.
//!
//! A [`Scorer`] is a training recipe. Fitting it on a labeled
//! [`FeatureMatrix`] yields a [`TrainedModel`] that scores feature vectors.
//! The rest of the system never looks inside either.

use crate::{FeatureMatrix, FeatureSchema, MalagaError, Result};

/// A regression technique that can be fit on historical features and targets.
///
/// # Example
///
/// ```no_run
/// use malaga_traits::{FeatureMatrix, FeatureSchema, Result, Scorer, TrainedModel};
///
/// #[derive(Debug)]
/// struct MeanScorer;
///
/// #[derive(Debug)]
/// struct MeanModel {
///     schema: FeatureSchema,
///     mean: f64,
/// }
///
/// impl TrainedModel for MeanModel {
///     fn name(&self) -> &str {
///         "mean"
///     }
///
///     fn schema(&self) -> &FeatureSchema {
///         &self.schema
///     }
///
///     fn predict(&self, features: &FeatureMatrix) -> Result<Vec<f64>> {
///         self.check_schema(features)?;
///         Ok(vec![self.mean; features.nrows()])
///     }
/// }
///
/// impl Scorer for MeanScorer {
///     fn name(&self) -> &str {
///         "mean"
///     }
///
///     fn fit(&self, features: &FeatureMatrix, targets: &[f64]) -> Result<Box<dyn TrainedModel>> {
///         malaga_traits::scorer::validate_training_set(features, targets)?;
///         let mean = targets.iter().sum::<f64>() / targets.len() as f64;
///         Ok(Box::new(MeanModel { schema: features.schema().clone(), mean }))
///     }
/// }
/// ```
pub trait Scorer: Send + Sync + std::fmt::Debug {
    /// Name of the technique, used in logs and reports.
    fn name(&self) -> &str;

    /// Fits a model on `features` (one row per labeled observation) and the
    /// matching `targets`.
    ///
    /// # Errors
    ///
    /// Returns [`MalagaError::Training`] if the training set is empty or the
    /// regression cannot be solved, and [`MalagaError::InvalidData`] if the
    /// target count does not match the row count.
    fn fit(&self, features: &FeatureMatrix, targets: &[f64]) -> Result<Box<dyn TrainedModel>>;
}

/// A fitted scoring function.
pub trait TrainedModel: Send + Sync + std::fmt::Debug {
    /// Name of the technique that produced this model.
    fn name(&self) -> &str;

    /// The feature schema the model was fit with.
    fn schema(&self) -> &FeatureSchema;

    /// Scores each row of `features`, in order.
    ///
    /// # Errors
    ///
    /// Returns [`MalagaError::Inference`] if the schema differs from
    /// [`TrainedModel::schema`].
    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<f64>>;

    /// Checks that `features` uses the fitted schema.
    ///
    /// # Errors
    ///
    /// Returns [`MalagaError::Inference`] describing the difference.
    fn check_schema(&self, features: &FeatureMatrix) -> Result<()> {
        match self.schema().diff(features.schema()) {
            Some(diff) => Err(MalagaError::inference(diff)),
            None => Ok(()),
        }
    }
}

/// Shared input validation for [`Scorer::fit`] implementations.
///
/// # Errors
///
/// - [`MalagaError::Training`] for an empty set or non-finite values
/// - [`MalagaError::InvalidData`] for a row/target count mismatch
pub fn validate_training_set(features: &FeatureMatrix, targets: &[f64]) -> Result<()> {
    if features.is_empty() {
        return Err(MalagaError::Training(
            "training set is empty after label construction".to_string(),
        ));
    }
    if features.nrows() != targets.len() {
        return Err(MalagaError::InvalidData(format!(
            "{} feature rows but {} targets",
            features.nrows(),
            targets.len()
        )));
    }
    if features.values().iter().any(|x| !x.is_finite()) {
        return Err(MalagaError::Training(
            "training features contain non-finite values".to_string(),
        ));
    }
    if targets.iter().any(|y| !y.is_finite()) {
        return Err(MalagaError::Training(
            "training targets contain non-finite values".to_string(),
        ));
    }
    Ok(())
}
