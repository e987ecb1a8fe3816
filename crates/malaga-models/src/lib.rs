//! Regression scorers for malaga.
//!
//! This crate provides concrete implementations of the
//! [`Scorer`](malaga_traits::Scorer) trait. The pipeline only sees the trait,
//! so any technique can be swapped in through [`ScorerConfig`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use malaga_models::{RidgeConfig, ScorerConfig};
//!
//! let scorer = ScorerConfig::Ridge(RidgeConfig::default()).build();
//! // let model = scorer.fit(&features, &targets)?;
//! // let scores = model.predict(&snapshot_features)?;
//! ```

mod boosted;
mod config;
mod ridge;

// Re-export main types
pub use boosted::{BoostedStumpsConfig, BoostedStumpsScorer};
pub use config::ScorerConfig;
pub use ridge::{RidgeConfig, RidgeModel, RidgeScorer};
