//! Closed-form ridge regression scorer.

use malaga_traits::{
    FeatureMatrix, FeatureSchema, MalagaError, Result, Scorer, TrainedModel,
    scorer::validate_training_set, stats::ColumnScaler,
};
use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Smallest ratio of the extreme singular values of `XᵀX + αI` accepted
/// before the normal equations count as singular.
const MIN_RECIPROCAL_CONDITION: f64 = 1e-12;

/// Configuration for [`RidgeScorer`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RidgeConfig {
    /// L2 penalty on the coefficients. The intercept is not penalized.
    pub alpha: f64,
    /// Whether to scale columns to unit variance before fitting.
    /// Columns are always centered.
    pub standardize: bool,
}

impl Default for RidgeConfig {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            standardize: true,
        }
    }
}

impl RidgeConfig {
    /// Checks the penalty is usable.
    ///
    /// # Errors
    ///
    /// Returns [`MalagaError::InvalidConfig`] for a negative or non-finite alpha.
    pub fn validate(&self) -> Result<()> {
        if !self.alpha.is_finite() || self.alpha < 0.0 {
            return Err(MalagaError::InvalidConfig(format!(
                "ridge alpha must be finite and non-negative, got {}",
                self.alpha
            )));
        }
        Ok(())
    }
}

/// Ridge regression solved through the normal equations.
///
/// Features are centered (and optionally scaled) with statistics learned on
/// the training set, the target is centered, and
/// `(XᵀX + αI) β = Xᵀy` is solved by Cholesky factorization. The intercept
/// is the training-target mean.
///
/// # Examples
///
/// ```rust,no_run
/// use malaga_models::{RidgeConfig, RidgeScorer};
/// use malaga_traits::Scorer;
///
/// let scorer = RidgeScorer::new(RidgeConfig { alpha: 0.5, standardize: true });
/// assert_eq!(scorer.name(), "ridge");
/// ```
#[derive(Debug, Clone, Default)]
pub struct RidgeScorer {
    config: RidgeConfig,
}

impl RidgeScorer {
    /// Create a ridge scorer with the given configuration.
    pub const fn new(config: RidgeConfig) -> Self {
        Self { config }
    }

    /// The scorer configuration.
    pub const fn config(&self) -> &RidgeConfig {
        &self.config
    }
}

fn prepare(standardize: bool, scaler: &ColumnScaler, values: &Array2<f64>) -> Array2<f64> {
    if standardize {
        scaler.transform(values)
    } else {
        let means = Array1::from(scaler.means().to_vec());
        values - &means
    }
}

impl Scorer for RidgeScorer {
    fn name(&self) -> &str {
        "ridge"
    }

    fn fit(&self, features: &FeatureMatrix, targets: &[f64]) -> Result<Box<dyn TrainedModel>> {
        validate_training_set(features, targets)?;
        self.config.validate()?;

        let scaler = ColumnScaler::fit(features.values());
        let x = prepare(self.config.standardize, &scaler, features.values());
        let intercept = targets.iter().sum::<f64>() / targets.len() as f64;
        let y: Array1<f64> = targets.iter().map(|t| t - intercept).collect();

        let mut gram = x.t().dot(&x);
        for i in 0..gram.nrows() {
            gram[[i, i]] += self.config.alpha;
        }
        let rhs = x.t().dot(&y);
        let coefficients = solve(&gram, &rhs)?;

        debug!(
            rows = features.nrows(),
            features = features.ncols(),
            alpha = self.config.alpha,
            intercept,
            "ridge fit"
        );

        Ok(Box::new(RidgeModel {
            schema: features.schema().clone(),
            standardize: self.config.standardize,
            scaler,
            coefficients,
            intercept,
        }))
    }
}

/// A fitted ridge model.
#[derive(Debug, Clone)]
pub struct RidgeModel {
    schema: FeatureSchema,
    standardize: bool,
    scaler: ColumnScaler,
    coefficients: Array1<f64>,
    intercept: f64,
}

impl RidgeModel {
    /// Coefficients in the (centered, optionally scaled) feature space.
    pub fn coefficients(&self) -> &[f64] {
        self.coefficients.as_slice().unwrap_or(&[])
    }

    /// The fitted intercept.
    pub const fn intercept(&self) -> f64 {
        self.intercept
    }
}

impl TrainedModel for RidgeModel {
    fn name(&self) -> &str {
        "ridge"
    }

    fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<f64>> {
        self.check_schema(features)?;
        let x = prepare(self.standardize, &self.scaler, features.values());
        let scores = x.dot(&self.coefficients) + self.intercept;
        Ok(scores.to_vec())
    }
}

fn singular(reason: &str) -> MalagaError {
    MalagaError::Training(format!("normal equations are singular ({reason}); increase alpha"))
}

/// Solves the symmetric system `a · x = b`.
///
/// Ill-conditioned systems are rejected relative to the largest singular
/// value, so the check does not depend on the scale of the features.
fn solve(a: &Array2<f64>, b: &Array1<f64>) -> Result<Array1<f64>> {
    let n = b.len();
    if n == 0 {
        return Ok(Array1::zeros(0));
    }
    let a = DMatrix::from_fn(n, n, |i, j| a[[i, j]]);
    let b = DVector::from_iterator(n, b.iter().copied());

    let singular_values = a.singular_values();
    let largest = singular_values.max();
    let smallest = singular_values.min();
    if !(largest > 0.0) || smallest < largest * MIN_RECIPROCAL_CONDITION {
        return Err(singular(&format!(
            "reciprocal condition {:.3e}",
            if largest > 0.0 { smallest / largest } else { 0.0 }
        )));
    }

    let solution = a
        .cholesky()
        .map(|factor| factor.solve(&b))
        .ok_or_else(|| singular("not positive definite"))?;

    if solution.iter().any(|v| !v.is_finite()) {
        return Err(MalagaError::Training(
            "ridge solution contains non-finite coefficients".to_string(),
        ));
    }
    Ok(solution.iter().copied().collect())
}
