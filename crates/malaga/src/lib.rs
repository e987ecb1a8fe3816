#![doc(issue_tracker_base_url = "https://github.com/factordynamics/malaga/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! # malaga
//!
//! Daily top-K ranking and equal-weight portfolio simulation.
//!
//! malaga is an umbrella crate that re-exports the malaga sub-crates and adds
//! the pieces that tie them together: an immutable [`PipelineConfig`], the
//! built-in universe presets, and the [`Pipeline`] that runs one
//! configuration end to end.
//!
//! ## Quick Start
//!
//! ```ignore
//! use malaga::data::{CsvFeatureProvider, CsvResultWriter};
//! use malaga::{Pipeline, PipelineConfig, Result};
//!
//! # fn main() -> Result<()> {
//! let config = PipelineConfig::default().apply_env();
//! let provider = CsvFeatureProvider::new("data/prices").with_news_dir("data/news");
//!
//! let output = Pipeline::new(config.clone())?.run_configured(&provider)?;
//! output.write(&CsvResultWriter::new(&config.output_dir, &config.run_id))?;
//!
//! for pick in &output.top_picks {
//!     println!("{:>2}. {:<8} {:>7.2}%", pick.rank, pick.symbol, pick.score_pct);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Crate Organization
//!
//! - [`traits`] - Core types, the error type and the provider/scorer/writer seams
//! - [`label`] - Joins feature streams and builds forward targets
//! - [`models`] - Ridge regression and boosted-stump scorers
//! - [`sim`] - Ranking, weights, turnover and the portfolio simulator
//! - [`data`] - CSV and in-memory providers, CSV and JSON writers
//!
//! ## Architecture
//!
//! 1. A **feature provider** returns per-instrument price and news features
//! 2. The **labeler** attaches `ret_21` from `horizon` observations later
//! 3. A **scorer** is fit on every labeled row
//! 4. The **simulator** scores each day's snapshot, holds the top K equally
//!    weighted and charges costs on turnover
//! 5. A **result writer** persists the final top picks and the equity curve

/// Version information for the malaga crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

mod config;
mod pipeline;
pub mod universe;

pub use config::{DEFAULT_TOP_K, OUTPUT_DIR_ENV, PipelineConfig, RUN_ID_ENV};
pub use pipeline::{Pipeline, PipelineOutput};
pub use universe::{PRESETS, UniversePreset, preset, resolve_universe};

// ============================================================================
// Core Traits
// ============================================================================

/// Core types and trait definitions.
///
/// - [`Scorer`] / [`TrainedModel`] - Pluggable regression models
/// - [`FeatureProvider`] - Source of per-instrument feature rows
/// - [`SnapshotSource`] - Per-date cross sections for the simulator
/// - [`ResultWriter`] - Persists top picks and equity curves
pub mod traits {
    pub use malaga_traits::*;
}

pub use malaga_traits::{
    FeatureProvider, ResultWriter, Scorer, SnapshotSource, TrainedModel,
};

// Re-export error types
pub use malaga_traits::{MalagaError, Result};

// Re-export common types
pub use malaga_traits::{Date, DateRange, EquityPoint, FeatureRow, Score, Symbol, TopPick};

// ============================================================================
// Labeling
// ============================================================================

/// Label construction.
///
/// The target of a row is the same instrument's `ret_21` exactly `horizon`
/// observations later:
///
/// ```text
/// target[t] = ret_21[t + horizon]
/// ```
///
/// The last `horizon` rows of each instrument have no target and are dropped.
pub mod label {
    pub use malaga_label::*;
}

// ============================================================================
// Models
// ============================================================================

/// Scorer implementations.
///
/// ## Available Scorers
///
/// - **RidgeScorer**: Closed-form L2-regularized linear regression
/// - **BoostedStumpsScorer**: Gradient boosting over depth-one trees
///
/// [`ScorerConfig`](malaga_models::ScorerConfig) selects one by name.
pub mod models {
    pub use malaga_models::*;
}

// ============================================================================
// Simulation
// ============================================================================

/// Ranking and portfolio simulation.
///
/// Each simulated day:
///
/// ```text
/// weights_t  = 1/K on the top-K scores of day t
/// turnover_t = Σ |weights_t - weights_{t-1}|
/// equity_t   = equity_{t-1} · (1 + Σ w·ret_1 - turnover_t · cost)
/// ```
pub mod sim {
    pub use malaga_sim::*;
}

// ============================================================================
// Data Adapters
// ============================================================================

/// File and in-memory adapters.
pub mod data {
    pub use malaga_data::*;
}

// ============================================================================
// Prelude
// ============================================================================

/// Prelude module for convenient imports.
///
/// ```ignore
/// use malaga::prelude::*;
/// ```
pub mod prelude {
    pub use crate::traits::*;
    pub use crate::{Pipeline, PipelineConfig, PipelineOutput};
    pub use malaga_models::ScorerConfig;
    pub use malaga_sim::{CalendarPolicy, PortfolioSimulator, SimulationConfig};
}

// ============================================================================
// Tests
// ============================================================================
