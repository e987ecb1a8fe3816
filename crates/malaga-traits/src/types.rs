//! Common types used throughout the Malaga framework.
//!
//! This module defines the per-instrument, per-date records that flow from
//! the feature provider through the labeler into the scorer and simulator.

use crate::{MalagaError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// Re-export date type from chrono
pub use chrono::NaiveDate as Date;

/// A market symbol identifier, such as "AAPL" or "PKN.WA".
pub type Symbol = String;

/// Name of the forward-looking single-period return feature.
pub const RET_1: &str = "ret_1";

/// Name of the realized 21-period return feature used for labels.
pub const RET_21: &str = "ret_21";

/// Name of the news sentiment feature.
pub const SENTIMENT: &str = "sentiment";

/// One instrument's feature vector on one date.
///
/// Features are kept in an ordered mapping so every row with the same set of
/// names yields the same column order when assembled into a matrix. The
/// mapping always contains [`RET_1`] and [`RET_21`]. Unknown values (indicator
/// warm-up, gaps in a file) are stored as NaN so the row keeps its place in
/// the instrument's series; see [`FeatureRow::is_complete`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureRow {
    symbol: Symbol,
    date: Date,
    features: BTreeMap<String, f64>,
}

impl FeatureRow {
    /// Creates a feature row.
    ///
    /// # Errors
    ///
    /// Returns [`MalagaError::InvalidData`] if `ret_1` or `ret_21` is missing.
    pub fn new(
        symbol: impl Into<Symbol>,
        date: Date,
        features: BTreeMap<String, f64>,
    ) -> Result<Self> {
        let symbol = symbol.into();
        for required in [RET_1, RET_21] {
            if !features.contains_key(required) {
                return Err(MalagaError::InvalidData(format!(
                    "{symbol} on {date}: missing required feature '{required}'"
                )));
            }
        }
        Ok(Self {
            symbol,
            date,
            features,
        })
    }

    /// Builds a row from `(name, value)` pairs.
    ///
    /// # Errors
    ///
    /// Same as [`FeatureRow::new`].
    pub fn from_pairs<'a>(
        symbol: impl Into<Symbol>,
        date: Date,
        pairs: impl IntoIterator<Item = (&'a str, f64)>,
    ) -> Result<Self> {
        let features = pairs
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect();
        Self::new(symbol, date, features)
    }

    /// The instrument identifier.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// The observation date.
    pub const fn date(&self) -> Date {
        self.date
    }

    /// All named features, ordered by name.
    pub const fn features(&self) -> &BTreeMap<String, f64> {
        &self.features
    }

    /// Looks up a feature by name.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.features.get(name).copied()
    }

    /// Realized single-period return used by the simulator.
    pub fn ret_1(&self) -> f64 {
        self.features.get(RET_1).copied().unwrap_or_default()
    }

    /// Realized 21-period return used for labels.
    pub fn ret_21(&self) -> f64 {
        self.features.get(RET_21).copied().unwrap_or_default()
    }

    /// Whether every feature value is finite.
    ///
    /// Incomplete rows still count as observations when targets are shifted,
    /// but are never trained on or scored.
    pub fn is_complete(&self) -> bool {
        self.features.values().all(|v| v.is_finite())
    }

    /// Adds a feature unless one with the same name already exists.
    ///
    /// Returns `true` if the value was inserted.
    pub fn insert_if_absent(&mut self, name: &str, value: f64) -> bool {
        if self.features.contains_key(name) {
            return false;
        }
        self.features.insert(name.to_string(), value);
        true
    }
}

/// News-derived values for one instrument on one date.
///
/// Usually carries a single `sentiment` value. Dates without news simply have
/// no row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsRow {
    /// The instrument identifier.
    pub symbol: Symbol,
    /// The observation date.
    pub date: Date,
    /// Named news values.
    pub values: BTreeMap<String, f64>,
}

impl NewsRow {
    /// Creates a news row holding only a sentiment value.
    pub fn sentiment(symbol: impl Into<Symbol>, date: Date, sentiment: f64) -> Self {
        Self {
            symbol: symbol.into(),
            date,
            values: BTreeMap::from([(SENTIMENT.to_string(), sentiment)]),
        }
    }
}

/// A feature row with its supervised-learning target attached.
///
/// The target is the same instrument's `ret_21` observed `horizon` rows later.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabeledRow {
    /// The joined feature row.
    pub row: FeatureRow,
    /// Future realized return of the same instrument.
    pub target: f64,
}

impl LabeledRow {
    /// Attaches a target to a row.
    pub const fn new(row: FeatureRow, target: f64) -> Self {
        Self { row, target }
    }
}

/// A model score for one instrument on one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Score {
    /// The instrument identifier.
    pub symbol: Symbol,
    /// The scored date.
    pub date: Date,
    /// Raw model output; higher ranks first.
    pub score: f64,
}

impl Score {
    /// Creates a score.
    pub fn new(symbol: impl Into<Symbol>, date: Date, score: f64) -> Self {
        Self {
            symbol: symbol.into(),
            date,
            score,
        }
    }
}
