//! Pipeline configuration.

use crate::universe::preset;
use malaga_label::LabelConfig;
use malaga_models::ScorerConfig;
use malaga_sim::{CalendarPolicy, SimulationConfig};
use malaga_traits::{Date, DateRange, MalagaError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable overriding [`PipelineConfig::run_id`].
pub const RUN_ID_ENV: &str = "MALAGA_RUN_ID";

/// Environment variable overriding [`PipelineConfig::output_dir`].
pub const OUTPUT_DIR_ENV: &str = "MALAGA_OUTPUT_DIR";

/// Portfolio size for ticker-list universes without an explicit `top_k`.
pub const DEFAULT_TOP_K: usize = 50;

/// Everything one run needs, fixed before the run starts.
///
/// Missing fields in a config file take their default values.
///
/// # Example
///
/// ```
/// use malaga::PipelineConfig;
///
/// let config: PipelineConfig =
///     serde_json::from_str(r#"{ "universe": "wig20", "top_k": 10 }"#).unwrap();
/// assert_eq!(config.horizon, 21);
/// assert_eq!(config.top_k(), 10);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Preset name or comma-separated tickers.
    pub universe: String,
    /// Label horizon in observations.
    pub horizon: usize,
    /// Number of instruments held each day. Unset means the preset's size
    /// for a preset universe, else [`DEFAULT_TOP_K`]; see
    /// [`PipelineConfig::top_k`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<usize>,
    /// Cost per unit of turnover.
    pub transaction_cost: f64,
    /// Starting equity.
    pub initial_capital: f64,
    /// First date to fetch and simulate.
    pub start: Option<Date>,
    /// Last date to fetch and simulate.
    pub end: Option<Date>,
    /// Which dates the simulator walks.
    pub calendar: CalendarPolicy,
    /// Scorer to train.
    pub scorer: ScorerConfig,
    /// Directory for written results.
    pub output_dir: PathBuf,
    /// Tag used in result file names.
    pub run_id: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            universe: "us-large-cap".to_string(),
            horizon: 21,
            top_k: None,
            transaction_cost: 0.0015,
            initial_capital: 10_000.0,
            start: None,
            end: None,
            calendar: CalendarPolicy::default(),
            scorer: ScorerConfig::default(),
            output_dir: PathBuf::from("top_results"),
            run_id: "1".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Reads a JSON config file.
    ///
    /// # Errors
    ///
    /// Returns [`MalagaError::Io`] or [`MalagaError::Json`] if the file cannot
    /// be read or parsed.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = serde_json::from_str(&text)?;
        debug!(path = %path.as_ref().display(), "loaded config");
        Ok(config)
    }

    /// Applies `MALAGA_RUN_ID` and `MALAGA_OUTPUT_DIR` from the process
    /// environment, loading a `.env` file first if one exists.
    #[must_use]
    pub fn apply_env(self) -> Self {
        // A missing .env file is not an error.
        let _ = dotenvy::dotenv();
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides looked up by environment variable name.
    #[must_use]
    pub fn apply_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(run_id) = lookup(RUN_ID_ENV).filter(|v| !v.trim().is_empty()) {
            self.run_id = run_id.trim().to_string();
        }
        if let Some(dir) = lookup(OUTPUT_DIR_ENV).filter(|v| !v.trim().is_empty()) {
            self.output_dir = PathBuf::from(dir.trim());
        }
        self
    }

    /// Checks every field.
    ///
    /// # Errors
    ///
    /// - [`MalagaError::InvalidConfig`] for an empty universe or run id, a
    ///   zero horizon, or an invalid simulation or scorer setting
    /// - [`MalagaError::InvalidDate`] if `start` is after `end`
    pub fn validate(&self) -> Result<()> {
        if self.universe.trim().is_empty() {
            return Err(MalagaError::InvalidConfig(
                "universe must not be empty".to_string(),
            ));
        }
        if self.horizon == 0 {
            return Err(MalagaError::InvalidConfig(
                "horizon must be at least 1".to_string(),
            ));
        }
        if self.run_id.trim().is_empty() {
            return Err(MalagaError::InvalidConfig(
                "run_id must not be empty".to_string(),
            ));
        }
        self.simulation().validate()?;
        self.scorer.validate()?;
        self.range().validate()
    }

    /// Resolved portfolio size: the explicit setting, else the universe
    /// preset's size, else [`DEFAULT_TOP_K`].
    pub fn top_k(&self) -> usize {
        self.top_k
            .or_else(|| preset(&self.universe).map(|p| p.top_k))
            .unwrap_or(DEFAULT_TOP_K)
    }

    /// Date bounds for fetching and simulating.
    pub const fn range(&self) -> DateRange {
        DateRange {
            start: self.start,
            end: self.end,
        }
    }

    /// Labeler settings.
    pub const fn label_config(&self) -> LabelConfig {
        LabelConfig {
            horizon: self.horizon,
        }
    }

    /// Simulator settings.
    pub fn simulation(&self) -> SimulationConfig {
        SimulationConfig {
            top_k: self.top_k(),
            transaction_cost: self.transaction_cost,
            initial_capital: self.initial_capital,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use malaga_models::RidgeConfig;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.horizon, 21);
        assert_eq!(config.top_k(), 50);
        assert_relative_eq!(config.transaction_cost, 0.0015);
        assert_relative_eq!(config.initial_capital, 10_000.0);
        assert_eq!(config.scorer, ScorerConfig::Ridge(RidgeConfig::default()));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        let bad = [
            PipelineConfig {
                universe: "  ".to_string(),
                ..Default::default()
            },
            PipelineConfig {
                horizon: 0,
                ..Default::default()
            },
            PipelineConfig {
                top_k: Some(0),
                ..Default::default()
            },
            PipelineConfig {
                transaction_cost: -0.01,
                ..Default::default()
            },
            PipelineConfig {
                initial_capital: 0.0,
                ..Default::default()
            },
        ];
        for config in bad {
            assert!(
                matches!(config.validate(), Err(MalagaError::InvalidConfig(_))),
                "{config:?}"
            );
        }

        let inverted = PipelineConfig {
            start: Date::from_ymd_opt(2024, 6, 1),
            end: Date::from_ymd_opt(2024, 1, 1),
            ..Default::default()
        };
        assert!(matches!(
            inverted.validate(),
            Err(MalagaError::InvalidDate(_))
        ));
    }

    #[test]
    fn test_json_round_trip() {
        let config = PipelineConfig {
            universe: "wig20".to_string(),
            top_k: Some(10),
            start: Date::from_ymd_opt(2023, 1, 2),
            calendar: CalendarPolicy::Weekdays,
            scorer: ScorerConfig::from_kind("boosted").unwrap(),
            run_id: "wig".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_string_pretty(&config).unwrap();
        assert!(json.contains("\"weekdays\""));
        assert!(json.contains("\"boosted_stumps\""));
        let back: PipelineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{ "horizon": 5, "scorer": { "kind": "ridge", "alpha": 0.5 } }"#)
                .unwrap();
        assert_eq!(config.horizon, 5);
        assert_eq!(config.top_k(), 50);
        assert_eq!(
            config.scorer,
            ScorerConfig::Ridge(RidgeConfig {
                alpha: 0.5,
                standardize: true
            })
        );
    }

    #[test]
    fn test_from_json_file() {
        let path = std::env::temp_dir().join(format!("malaga-config-{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "universe": "AAA,BBB", "top_k": 2 }"#).unwrap();
        let config = PipelineConfig::from_json_file(&path).unwrap();
        assert_eq!(config.universe, "AAA,BBB");
        assert_eq!(config.top_k(), 2);
        let _ = std::fs::remove_file(&path);

        assert!(matches!(
            PipelineConfig::from_json_file("/nonexistent/malaga.json"),
            Err(MalagaError::Io(_))
        ));
    }

    #[test]
    fn test_preset_top_k_from_config_file() {
        let path =
            std::env::temp_dir().join(format!("malaga-preset-{}.json", std::process::id()));

        std::fs::write(&path, r#"{ "universe": "wig20" }"#).unwrap();
        let config = PipelineConfig::from_json_file(&path).unwrap();
        assert_eq!(config.top_k, None);
        assert_eq!(config.top_k(), 10);
        assert_eq!(config.simulation().top_k, 10);

        std::fs::write(&path, r#"{ "universe": "wig20", "top_k": 5 }"#).unwrap();
        assert_eq!(PipelineConfig::from_json_file(&path).unwrap().top_k(), 5);

        std::fs::write(&path, r#"{ "universe": "AAA,BBB" }"#).unwrap();
        assert_eq!(
            PipelineConfig::from_json_file(&path).unwrap().top_k(),
            DEFAULT_TOP_K
        );
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_overrides() {
        let config = PipelineConfig::default().apply_overrides(|key| match key {
            RUN_ID_ENV => Some("nightly".to_string()),
            OUTPUT_DIR_ENV => Some("  ".to_string()),
            _ => None,
        });
        assert_eq!(config.run_id, "nightly");
        assert_eq!(config.output_dir, PathBuf::from("top_results"));
    }

    #[test]
    fn test_derived_configs() {
        let config = PipelineConfig {
            horizon: 3,
            top_k: Some(7),
            ..Default::default()
        };
        assert_eq!(config.label_config().horizon, 3);
        assert_eq!(config.simulation().top_k, 7);
        assert_eq!(config.range(), DateRange::all());
    }
}
