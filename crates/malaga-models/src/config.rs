//! Scorer selection.

use crate::{BoostedStumpsConfig, BoostedStumpsScorer, RidgeConfig, RidgeScorer};
use malaga_traits::{Result, Scorer};
use serde::{Deserialize, Serialize};

/// Which scorer to train, with its parameters.
///
/// Serialized with a `kind` tag:
///
/// ```json
/// { "kind": "ridge", "alpha": 1.0, "standardize": true }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScorerConfig {
    /// Closed-form ridge regression.
    Ridge(RidgeConfig),
    /// Gradient-boosted decision stumps.
    #[serde(alias = "boosted")]
    BoostedStumps(BoostedStumpsConfig),
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self::Ridge(RidgeConfig::default())
    }
}

impl ScorerConfig {
    /// Parses a scorer kind name with default parameters.
    ///
    /// Accepts `ridge`, `boosted` and `boosted_stumps`.
    pub fn from_kind(kind: &str) -> Option<Self> {
        match kind.trim().to_ascii_lowercase().as_str() {
            "ridge" => Some(Self::Ridge(RidgeConfig::default())),
            "boosted" | "boosted_stumps" => {
                Some(Self::BoostedStumps(BoostedStumpsConfig::default()))
            }
            _ => None,
        }
    }

    /// Validates the wrapped parameters.
    ///
    /// # Errors
    ///
    /// Propagates the wrapped config's validation error.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Ridge(config) => config.validate(),
            Self::BoostedStumps(config) => config.validate(),
        }
    }

    /// Builds the configured scorer.
    pub fn build(&self) -> Box<dyn Scorer> {
        match *self {
            Self::Ridge(config) => Box::new(RidgeScorer::new(config)),
            Self::BoostedStumps(config) => Box::new(BoostedStumpsScorer::new(config)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_names() {
        assert_eq!(ScorerConfig::default().build().name(), "ridge");
        assert_eq!(
            ScorerConfig::from_kind("boosted").unwrap().build().name(),
            "boosted_stumps"
        );
        assert!(ScorerConfig::from_kind("svm").is_none());
    }

    #[test]
    fn test_json_round_trip() {
        let config = ScorerConfig::BoostedStumps(BoostedStumpsConfig {
            n_estimators: 50,
            learning_rate: 0.1,
            min_samples_leaf: 5,
        });
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"kind\":\"boosted_stumps\""));
        let back: ScorerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_parses_tagged_ridge() {
        let config: ScorerConfig =
            serde_json::from_str(r#"{"kind":"ridge","alpha":0.25,"standardize":false}"#).unwrap();
        assert_eq!(
            config,
            ScorerConfig::Ridge(RidgeConfig {
                alpha: 0.25,
                standardize: false
            })
        );
    }

    #[test]
    fn test_validate_delegates() {
        let bad = ScorerConfig::Ridge(RidgeConfig {
            alpha: f64::NAN,
            standardize: true,
        });
        assert!(bad.validate().is_err());
        assert!(ScorerConfig::default().validate().is_ok());
    }
}
